use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::{LayerTree, Snapshot, SnapshotError};
use crate::settings::MAX_GRID_SIZE;

/// On-disk project: grid side plus the full tree snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(rename = "gridSize")]
    pub grid_size: usize,
    #[serde(rename = "layerManagerSnapshot")]
    pub snapshot: Snapshot,
}

/// Error type for project file operations
#[derive(Debug)]
pub enum ProjectError {
    Io(std::io::Error),
    Parse(String),
    InvalidFormat(String),
    Snapshot(SnapshotError),
}

impl std::fmt::Display for ProjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectError::Io(e) => write!(f, "I/O error: {}", e),
            ProjectError::Parse(e) => write!(f, "Parse error: {}", e),
            ProjectError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
            ProjectError::Snapshot(e) => write!(f, "Invalid snapshot: {}", e),
        }
    }
}

impl std::error::Error for ProjectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProjectError::Io(e) => Some(e),
            ProjectError::Snapshot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(e: std::io::Error) -> Self {
        ProjectError::Io(e)
    }
}

impl From<serde_json::Error> for ProjectError {
    fn from(e: serde_json::Error) -> Self {
        ProjectError::Parse(e.to_string())
    }
}

impl From<SnapshotError> for ProjectError {
    fn from(e: SnapshotError) -> Self {
        ProjectError::Snapshot(e)
    }
}

impl ProjectFile {
    pub fn from_tree(tree: &LayerTree) -> Self {
        Self {
            grid_size: tree.size(),
            snapshot: tree.get_snapshot(),
        }
    }

    /// Check the grid size and the snapshot against it.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if !(1..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ProjectError::InvalidFormat(format!(
                "Grid size {} outside 1..={}",
                self.grid_size, MAX_GRID_SIZE
            )));
        }
        self.snapshot.validate(self.grid_size)?;
        Ok(())
    }

    /// Build a live tree from the file.
    pub fn into_tree(self) -> Result<LayerTree, ProjectError> {
        self.validate()?;
        let mut tree = LayerTree::new(self.grid_size);
        tree.load_snapshot(self.snapshot)?;
        Ok(tree)
    }

    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let file: ProjectFile = serde_json::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Save a tree as a JSON project file.
pub fn save_project(tree: &LayerTree, path: &Path) -> Result<(), ProjectError> {
    let project = ProjectFile::from_tree(tree);
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &project)?;
    writer.flush()?;
    log_info!("Saved project to {}", path.display());
    Ok(())
}

/// Load a JSON project file into a fresh tree.
pub fn load_project(path: &Path) -> Result<LayerTree, ProjectError> {
    let result = File::open(path)
        .map_err(ProjectError::from)
        .and_then(|file| Ok(serde_json::from_reader::<_, ProjectFile>(BufReader::new(file))?))
        .and_then(ProjectFile::into_tree);
    match &result {
        Ok(tree) => {
            log_info!(
                "Loaded project {} ({}x{}, {} layers)",
                path.display(),
                tree.size(),
                tree.size(),
                tree.layers().len()
            );
        }
        Err(e) => {
            log_warn!("Failed to load project {}: {}", path.display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ItemProperty;

    fn sample_tree() -> LayerTree {
        let mut tree = LayerTree::new(3);
        tree.write(4, "#FF0000");
        let group = tree.add_group();
        tree.add_layer();
        tree.write(0, "rgba(0, 0, 255, 0.5)");
        tree.set_property(group, ItemProperty::Opacity(0.5));
        tree
    }

    #[test]
    fn save_and_load_preserve_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.json");
        let mut tree = sample_tree();
        save_project(&tree, &path).unwrap();

        let mut loaded = load_project(&path).unwrap();
        assert_eq!(loaded.size(), 3);
        assert_eq!(loaded.get_snapshot(), tree.get_snapshot());
        assert_eq!(loaded.composite(), tree.composite());
    }

    #[test]
    fn file_uses_camel_case_keys() {
        let json = ProjectFile::from_tree(&LayerTree::new(1)).to_json().unwrap();
        assert!(json.starts_with(r#"{"gridSize":1,"layerManagerSnapshot":{"nodes":"#));
    }

    #[test]
    fn rejects_missing_fields() {
        let err = ProjectFile::from_json(r#"{"gridSize":2}"#).unwrap_err();
        assert!(matches!(err, ProjectError::Parse(_)));
    }

    #[test]
    fn rejects_bad_grid_size() {
        let mut file = ProjectFile::from_tree(&LayerTree::new(1));
        file.grid_size = 0;
        let text = serde_json::to_string(&file).unwrap();
        assert!(matches!(ProjectFile::from_json(&text), Err(ProjectError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_mismatched_layer_length() {
        let mut file = ProjectFile::from_tree(&LayerTree::new(2));
        file.grid_size = 3;
        assert!(matches!(
            file.into_tree(),
            Err(ProjectError::Snapshot(SnapshotError::DataLength { .. }))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_project(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ProjectError::Io(_)));
    }

    #[test]
    fn accepts_legacy_layers_key() {
        let text = r##"{"gridSize":1,"layerManagerSnapshot":{"layers":[{"type":"layer","id":3,"name":"a","data":["#FFF"],"visible":true,"opacity":1}],"activeItemId":3}}"##;
        let tree = ProjectFile::from_json(text).unwrap().into_tree().unwrap();
        assert_eq!(tree.next_id(), 4);
        assert_eq!(tree.active_layer().unwrap().data[0], "#FFF");
    }
}
