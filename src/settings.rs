use std::path::{Path, PathBuf};


/// Largest grid side the editor will create or load.
pub const MAX_GRID_SIZE: usize = 1024;

/// Editor preferences that persist across sessions.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Side length of a freshly created grid.
    pub default_grid_size: usize,
    /// Maximum number of undo steps
    pub max_undo_steps: usize,
    /// Quiet period before a brush/shape gesture becomes one history entry.
    pub stroke_debounce_ms: u64,
    pub recent_colors_limit: usize,
    /// Tool name as accepted by `Tool::from_name`.
    pub last_active_tool: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_grid_size: 16,
            max_undo_steps: 50,
            stroke_debounce_ms: 300,
            recent_colors_limit: 10,
            last_active_tool: "brush".to_string(),
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelfe/pixelfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PixelFE\pixelfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/PixelFE/pixelfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelfe");
            return Some(config_dir.join("pixelfe_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            return Some(PathBuf::from(appdata).join("PixelFE").join("pixelfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PixelFE")
                    .join("pixelfe_settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("pixelfe_settings.cfg")))
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "default_grid_size={}\n\
             max_undo_steps={}\n\
             stroke_debounce_ms={}\n\
             recent_colors_limit={}\n\
             last_active_tool={}\n",
            self.default_grid_size,
            self.max_undo_steps,
            self.stroke_debounce_ms,
            self.recent_colors_limit,
            self.last_active_tool,
        )
    }

    /// Parse `key=value` lines over the defaults. Unknown keys and bad values
    /// are ignored.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "default_grid_size" => {
                    if let Ok(n) = val.parse::<usize>()
                        && (1..=MAX_GRID_SIZE).contains(&n)
                    {
                        s.default_grid_size = n;
                    }
                }
                "max_undo_steps" => {
                    s.max_undo_steps = val.parse().unwrap_or(50).max(1);
                }
                "stroke_debounce_ms" => {
                    s.stroke_debounce_ms = val.parse().unwrap_or(300);
                }
                "recent_colors_limit" => {
                    s.recent_colors_limit = val.parse().unwrap_or(10);
                }
                "last_active_tool" => {
                    if !val.is_empty() {
                        s.last_active_tool = val.to_string();
                    }
                }
                _ => {}
            }
        }
        s
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                log_info!("Loaded settings from {}", path.display());
                Self::parse(&content)
            }
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk. Best-effort.
    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(path, self.to_config_string()) {
            log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }
}
