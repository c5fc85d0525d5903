//! In-memory storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::diagram::Diagram;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Keeps serialized diagrams in memory, so loads go through the same
/// validation as file-backed storage.
#[derive(Default)]
pub struct MemoryStorage {
    diagrams: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON under an id without validating it.
    pub fn insert_raw(&self, id: impl Into<String>, json: impl Into<String>) -> StorageResult<()> {
        self.write()?.insert(id.into(), json.into());
        Ok(())
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.diagrams
            .read()
            .map_err(|e| StorageError::Other(format!("Lock poisoned: {}", e)))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.diagrams
            .write()
            .map_err(|e| StorageError::Other(format!("Lock poisoned: {}", e)))
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, diagram: &Diagram) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = diagram.to_json();
        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.write()?.insert(id, json);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Diagram>> {
        let id = id.to_string();
        Box::pin(async move {
            let json = self
                .read()?
                .get(&id)
                .cloned()
                .ok_or(StorageError::NotFound(id))?;
            Ok(Diagram::from_json(&json)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.write()?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move { Ok(self.read()?.keys().cloned().collect()) })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.read()?.contains_key(&id)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::Component;
    use crate::storage::test_support::block_on;
    use kurbo::{Point, Size};

    fn sample() -> Diagram {
        Diagram::named("Feeder A")
            .add_component(Component::new("panel", Point::ZERO, Size::new(10.0, 10.0)))
            .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let diagram = sample();

        block_on(storage.save("feeder-a", &diagram)).unwrap();
        let loaded = block_on(storage.load("feeder-a")).unwrap();
        assert_eq!(loaded, diagram);
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("missing"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_invalid_diagram_rejected_on_load() {
        let storage = MemoryStorage::new();
        let missing = uuid::Uuid::new_v4();
        let json = format!(
            r#"{{
                "metadata": {{ "name": "bad", "format_version": 1,
                              "created": "2024-01-01T00:00:00Z", "modified": "2024-01-01T00:00:00Z" }},
                "components": {{}},
                "connections": {{
                    "{id}": {{ "id": "{id}", "from": "{missing}", "to": "{missing}", "kind": "thhn" }}
                }}
            }}"#,
            id = uuid::Uuid::new_v4(),
            missing = missing
        );
        storage.insert_raw("bad", json).unwrap();
        assert!(matches!(
            block_on(storage.load("bad")),
            Err(StorageError::Invalid(_))
        ));
    }

    #[test]
    fn test_exists_delete_list() {
        let storage = MemoryStorage::new();
        let diagram = sample();

        assert!(!block_on(storage.exists("b")).unwrap());
        block_on(storage.save("b", &diagram)).unwrap();
        block_on(storage.save("a", &diagram)).unwrap();
        assert!(block_on(storage.exists("b")).unwrap());
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a", "b"]);

        block_on(storage.delete("b")).unwrap();
        assert!(!block_on(storage.exists("b")).unwrap());
        // Deleting again is fine
        block_on(storage.delete("b")).unwrap();
    }
}
