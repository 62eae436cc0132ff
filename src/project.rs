use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::canvas::{LayerTree, Snapshot};
use crate::components::history::HistoryManager;
use crate::io::{self, ProjectError};

/// Single open document.
pub struct Project {
    pub id: Uuid,
    pub tree: LayerTree,
    pub history: HistoryManager<Snapshot>,
    /// `None` for unsaved/untitled files.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, size: usize, max_undo_steps: usize) -> Self {
        Self::with_tree(
            format!("Untitled-{}", untitled_counter),
            None,
            LayerTree::new(size),
            max_undo_steps,
        )
    }

    pub fn from_file(path: PathBuf, tree: LayerTree, max_undo_steps: usize) -> Self {
        let name = file_display_name(&path);
        Self::with_tree(name, Some(path), tree, max_undo_steps)
    }

    /// Load a project file from disk.
    pub fn open(path: &Path, max_undo_steps: usize) -> Result<Self, ProjectError> {
        let tree = io::load_project(path)?;
        Ok(Self::from_file(path.to_path_buf(), tree, max_undo_steps))
    }

    /// History always starts with the opening state so the first edit can
    /// be undone back to it.
    fn with_tree(name: String, path: Option<PathBuf>, tree: LayerTree, max_undo_steps: usize) -> Self {
        let mut history = HistoryManager::new(max_undo_steps);
        history.push_state(tree.get_snapshot());
        Self {
            id: Uuid::new_v4(),
            tree,
            history,
            path,
            is_dirty: false,
            name,
        }
    }

    /// Save to the current path.
    pub fn save(&mut self) -> Result<(), ProjectError> {
        let Some(path) = self.path.clone() else {
            return Err(ProjectError::InvalidFormat("Project has no file path".into()));
        };
        io::save_project(&self.tree, &path)?;
        self.mark_clean();
        Ok(())
    }

    pub fn save_as(&mut self, path: PathBuf) -> Result<(), ProjectError> {
        io::save_project(&self.tree, &path)?;
        self.path = Some(path);
        self.update_name_from_path();
        self.mark_clean();
        Ok(())
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = file_display_name(path);
        }
    }

    /// Get the display title (name with dirty indicator)
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untitled_starts_clean_with_one_entry() {
        let p = Project::new_untitled(3, 8, 50);
        assert_eq!(p.name, "Untitled-3");
        assert_eq!(p.display_title(), "Untitled-3");
        assert_eq!(p.history.len(), 1);
        assert!(!p.history.can_undo());
        assert_eq!(p.tree.size(), 8);
    }

    #[test]
    fn save_as_renames_and_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = Project::new_untitled(1, 2, 10);
        p.tree.write(0, "#000");
        p.mark_dirty();
        assert_eq!(p.display_title(), "Untitled-1*");

        p.save_as(dir.path().join("sprite.json")).unwrap();
        assert_eq!(p.display_title(), "sprite.json");

        let reopened = Project::open(&dir.path().join("sprite.json"), 10).unwrap();
        assert_eq!(reopened.tree.get_snapshot(), p.tree.get_snapshot());
        assert_ne!(reopened.id, p.id);
    }

    #[test]
    fn save_without_path_fails() {
        let mut p = Project::new_untitled(1, 2, 10);
        assert!(matches!(p.save(), Err(ProjectError::InvalidFormat(_))));
    }
}
