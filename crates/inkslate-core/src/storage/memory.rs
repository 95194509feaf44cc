//! In-memory storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    boards: RwLock<HashMap<String, Vec<Value>>>,
    thumbnails: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored thumbnail bytes for a board.
    pub fn thumbnail(&self, id: &str) -> Option<Vec<u8>> {
        self.thumbnails.read().ok()?.get(id).cloned()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, records: &[Value]) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let records = records.to_vec();
        Box::pin(async move {
            let mut boards = self.boards.write().map_err(lock_error)?;
            boards.insert(id, records);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Value>>> {
        let id = id.to_string();
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            boards.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut boards = self.boards.write().map_err(lock_error)?;
            boards.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            Ok(boards.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let boards = self.boards.read().map_err(lock_error)?;
            Ok(boards.contains_key(&id))
        })
    }

    fn store_thumbnail(&self, id: &str, png: Vec<u8>) -> BoxFuture<'_, StorageResult<String>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut thumbnails = self.thumbnails.write().map_err(lock_error)?;
            let reference = format!("memory://thumbnails/{id}.png");
            thumbnails.insert(id, png);
            Ok(reference)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block_on;
    use serde_json::json;

    fn board() -> Vec<Value> {
        vec![json!({"type": "rect", "startX": 0, "startY": 0, "endX": 10, "endY": 10})]
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        block_on(storage.save("test", &board())).unwrap();
        let loaded = block_on(storage.load("test")).unwrap();
        assert_eq!(loaded, board());
    }

    #[test]
    fn test_save_replaces() {
        let storage = MemoryStorage::new();
        block_on(storage.save("test", &board())).unwrap();
        block_on(storage.save("test", &[])).unwrap();
        assert!(block_on(storage.load("test")).unwrap().is_empty());
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();
        assert!(!block_on(storage.exists("test")).unwrap());
        block_on(storage.save("test", &board())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());
        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_list() {
        let storage = MemoryStorage::new();
        block_on(storage.save("doc1", &board())).unwrap();
        block_on(storage.save("doc2", &board())).unwrap();
        let list = block_on(storage.list()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&"doc1".to_string()));
        assert!(list.contains(&"doc2".to_string()));
    }

    #[test]
    fn test_thumbnail() {
        let storage = MemoryStorage::new();
        let reference = block_on(storage.store_thumbnail("b", vec![1, 2, 3])).unwrap();
        assert_eq!(reference, "memory://thumbnails/b.png");
        assert_eq!(storage.thumbnail("b"), Some(vec![1, 2, 3]));
    }
}
