//! JSON-file storage for native platforms.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::diagram::Diagram;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Stores each diagram as `<id>.json` in a directory.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-save never leaves a truncated diagram behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| StorageError::io(&base_path, e))?;
        Ok(Self { base_path })
    }

    /// Storage under the platform data directory, e.g.
    /// `~/.local/share/sldraft/diagrams` on Linux.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Other("Could not determine a data directory".to_string()))?;
        Self::new(base.join("sldraft").join("diagrams"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn diagram_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", file_stem(id), EXTENSION))
    }
}

/// Map an id to a safe file stem.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

fn write_atomic(path: &Path, contents: &str) -> StorageResult<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
}

impl Storage for FileStorage {
    fn save(&self, id: &str, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.diagram_path(id);
        let json = diagram.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            write_atomic(&path, &json)?;
            log::info!("Saved diagram to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Diagram>> {
        let path = self.diagram_path(id);
        let id = id.to_string();
        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(id));
                }
                Err(e) => return Err(StorageError::io(&path, e)),
            };
            let diagram = Diagram::from_json(&json)?;
            log::info!("Loaded diagram from {}", path.display());
            Ok(diagram)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.diagram_path(id);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::io(&path, e)),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path).map_err(|e| StorageError::io(&self.base_path, e))?;
            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.diagram_path(id);
        Box::pin(async move { Ok(path.is_file()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{Component, Connection};
    use crate::storage::test_support::block_on;
    use kurbo::{Point, Size};
    use tempfile::tempdir;

    fn sample() -> Diagram {
        let a = Component::new("meter", Point::ZERO, Size::new(10.0, 10.0));
        let b = Component::new("panel", Point::new(40.0, 0.0), Size::new(20.0, 30.0));
        let conn = Connection::new(a.id(), b.id(), "thhn");
        Diagram::named("Service entrance")
            .add_component(a)
            .and_then(|d| d.add_component(b))
            .and_then(|d| d.add_connection(conn))
            .unwrap()
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let diagram = sample();

        block_on(storage.save("service", &diagram)).unwrap();
        let loaded = block_on(storage.load("service")).unwrap();
        assert_eq!(loaded, diagram);
        // No temp file left behind
        assert!(!dir.path().join("service.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let result = block_on(storage.load("missing"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_rejects_corrupt_json() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(
            block_on(storage.load("broken")),
            Err(StorageError::Invalid(_))
        ));
    }

    #[test]
    fn test_file_storage_list_and_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let diagram = sample();
        block_on(storage.save("b", &diagram)).unwrap();
        block_on(storage.save("a", &diagram)).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["a", "b"]);

        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        block_on(storage.delete("a")).unwrap();
    }

    #[test]
    fn test_file_stem_sanitizes_id() {
        assert_eq!(file_stem("site/42:rev*1"), "site_42_rev_1");
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        block_on(storage.save("site/42", &sample())).unwrap();
        assert!(block_on(storage.load("site/42")).is_ok());
    }
}
