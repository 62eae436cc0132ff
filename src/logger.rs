//! Session logger for the editor core and the headless CLI.
//!
//! One log file per session, truncated at startup so it only ever holds the
//! latest run:
//!   Windows:  `%APPDATA%\PixelFE\pixelfe.log`
//!   Linux:    `~/.local/share/PixelFE/pixelfe.log`
//!   macOS:    `~/Library/Application Support/PixelFE/pixelfe.log`
//!
//! Use the `log_info!` / `log_warn!` / `log_err!` macros anywhere in the crate.
//! Before `init()` (or `init_at()`) has run every write is dropped, so library
//! code and unit tests can log without touching the filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Severity tag written in front of every message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn tag(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Path of the active session log, if the logger was initialised.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// True once a log file is open.
pub fn is_enabled() -> bool {
    LOG_FILE.get().is_some()
}

/// Append a raw line. I/O failures are swallowed: logging must never take the
/// editor down.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

/// Append a timestamped, level-tagged line.
pub fn write(level: Level, msg: &str) {
    if !is_enabled() {
        return;
    }
    write_line(&format_line(&timestamp(), level, msg));
}

fn format_line(ts: &str, level: Level, msg: &str) -> String {
    format!("[{}] [{}] {}", ts, level.tag(), msg)
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Info, &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Warn, &format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => {
        $crate::logger::write($crate::logger::Level::Error, &format!($($arg)*));
    };
}

/// Open the default session log. Call once at process start.
pub fn init() {
    init_at(&default_log_path());
}

/// Open (truncating) the session log at `path` and install a panic hook that
/// mirrors panic messages into it. Only the first successful call wins.
pub fn init_at(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path);

    match file {
        Ok(f) => {
            if LOG_FILE.set(Mutex::new(f)).is_err() {
                return;
            }
            let _ = LOG_PATH.set(path.to_path_buf());
        }
        Err(e) => {
            eprintln!("[logger] could not open log file {:?}: {}", path, e);
            return;
        }
    }

    write_line(&format!(
        "=== PixelFE session started (unix {}) ===",
        unix_seconds()
    ));
    write_line(&format!("Log file: {}", path.display()));
    write_line("");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format!("[{}] [PANIC] {}", timestamp(), info));
        prev(info);
    }));
}

fn default_log_path() -> PathBuf {
    data_dir().join("PixelFE").join("pixelfe.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// HH:MM:SS (UTC) within the current day.
fn timestamp() -> String {
    let secs = unix_seconds();
    format!(
        "{:02}:{:02}:{:02}",
        (secs % 86400) / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_level_tag() {
        let line = format_line("01:02:03", Level::Warn, "history trimmed");
        assert_eq!(line, "[01:02:03] [WARN] history trimmed");
    }

    #[test]
    fn timestamp_is_clock_shaped() {
        let ts = timestamp();
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.as_bytes()[2], b':');
        assert_eq!(ts.as_bytes()[5], b':');
    }
}
