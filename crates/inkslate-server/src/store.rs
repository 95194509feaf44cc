//! Board records and thumbnails, kept in memory and optionally mirrored to disk.

use bytes::Bytes;
use dashmap::DashMap;
use inkslate_core::storage::sanitize_id;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Server-side board storage.
///
/// Saves are full replaces. With a data directory every board is written to
/// `<dir>/<id>.json` and every thumbnail to `<dir>/thumbnails/<id>.png`.
pub struct BoardStore {
    boards: DashMap<String, Vec<Value>>,
    thumbnails: DashMap<String, Bytes>,
    dir: Option<PathBuf>,
    public_url: String,
}

impl BoardStore {
    pub fn in_memory(public_url: impl Into<String>) -> Self {
        Self {
            boards: DashMap::new(),
            thumbnails: DashMap::new(),
            dir: None,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn on_disk(dir: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::in_memory(public_url)
        }
    }

    fn board_path(dir: &Path, id: &str) -> PathBuf {
        dir.join(format!("{}.json", sanitize_id(id)))
    }

    fn thumbnail_path(dir: &Path, id: &str) -> PathBuf {
        dir.join("thumbnails").join(format!("{}.png", sanitize_id(id)))
    }

    /// Stored records, or an empty list for an unknown board.
    pub async fn load(&self, id: &str) -> Vec<Value> {
        if let Some(records) = self.boards.get(id) {
            return records.clone();
        }
        let Some(dir) = &self.dir else {
            return Vec::new();
        };
        let path = Self::board_path(dir, id);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => match serde_json::from_str::<Vec<Value>>(&json) {
                Ok(records) => {
                    self.boards.insert(id.to_string(), records.clone());
                    records
                }
                Err(e) => {
                    warn!("Corrupt board file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Failed to read board {}: {}", id, e);
                Vec::new()
            }
        }
    }

    /// Replace a board's records.
    pub async fn save(&self, id: &str, records: Vec<Value>) -> StoreResult<()> {
        if let Some(dir) = &self.dir {
            tokio::fs::create_dir_all(dir).await?;
            let json = serde_json::to_string_pretty(&records)?;
            tokio::fs::write(Self::board_path(dir, id), json).await?;
        }
        debug!("Saved board {} ({} records)", id, records.len());
        self.boards.insert(id.to_string(), records);
        Ok(())
    }

    /// Store a thumbnail and return the public reference recorded for the board.
    pub async fn store_thumbnail(&self, id: &str, png: Bytes) -> StoreResult<String> {
        if let Some(dir) = &self.dir {
            let path = Self::thumbnail_path(dir, id);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &png).await?;
        }
        self.thumbnails.insert(id.to_string(), png);
        Ok(self.thumbnail_reference(id))
    }

    pub async fn thumbnail(&self, id: &str) -> Option<Bytes> {
        if let Some(png) = self.thumbnails.get(id) {
            return Some(png.clone());
        }
        let dir = self.dir.as_ref()?;
        let png = Bytes::from(tokio::fs::read(Self::thumbnail_path(dir, id)).await.ok()?);
        self.thumbnails.insert(id.to_string(), png.clone());
        Some(png)
    }

    pub fn thumbnail_reference(&self, id: &str) -> String {
        format!("{}/api/boards/{}/thumbnail", self.public_url, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Value> {
        vec![json!({"type": "rect", "startX": 0, "startY": 0, "endX": 10, "endY": 10})]
    }

    #[tokio::test]
    async fn test_unknown_board_is_empty() {
        let store = BoardStore::in_memory("http://localhost:3030");
        assert!(store.load("missing").await.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces() {
        let store = BoardStore::in_memory("");
        store.save("b", records()).await.unwrap();
        assert_eq!(store.load("b").await, records());
        store.save("b", Vec::new()).await.unwrap();
        assert!(store.load("b").await.is_empty());
    }

    #[tokio::test]
    async fn test_disk_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::on_disk(dir.path(), "");
        store.save("../escape", records()).await.unwrap();
        assert!(dir.path().join("___escape.json").exists());

        let reopened = BoardStore::on_disk(dir.path(), "");
        assert_eq!(reopened.load("../escape").await, records());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = BoardStore::on_disk(dir.path(), "");
        assert!(store.load("bad").await.is_empty());
    }

    #[tokio::test]
    async fn test_thumbnail_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::on_disk(dir.path(), "https://boards.example/");
        let reference = store
            .store_thumbnail("b1", Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert_eq!(reference, "https://boards.example/api/boards/b1/thumbnail");

        let reopened = BoardStore::on_disk(dir.path(), "");
        assert_eq!(reopened.thumbnail("b1").await, Some(Bytes::from_static(b"png")));
        assert_eq!(reopened.thumbnail("nope").await, None);
    }
}
