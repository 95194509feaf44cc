//! Storage abstraction for persistence.
//!
//! Boards are stored as their ordered sequence of wire records; a save is
//! always a full replace.

mod access;
mod autosave;
mod file;
mod gateway;
mod memory;

pub use access::{AccessPolicy, AllowAll, OwnedBoards};
pub use autosave::{SaveScheduler, ThumbnailGuard, ThumbnailThrottle};
pub use file::FileStorage;
pub use gateway::{GatewayEvent, PersistenceGateway, ThumbnailRenderer};
pub use memory::MemoryStorage;

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Board not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Access denied to board {0}")]
    Denied(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for board storage backends.
///
/// Implementations must be `Send + Sync`: the persistence gateway drives them
/// from its worker thread.
pub trait Storage: Send + Sync {
    /// Replace a board's records.
    fn save(&self, id: &str, records: &[Value]) -> BoxFuture<'_, StorageResult<()>>;

    /// Load a board's records.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Vec<Value>>>;

    /// Delete a board.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all board IDs.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check if a board exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;

    /// Store a thumbnail image for a board, returning a reference to it.
    fn store_thumbnail(&self, id: &str, png: Vec<u8>) -> BoxFuture<'_, StorageResult<String>>;
}

/// Make a board id safe to use as a file name.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
pub(crate) use pollster::block_on;
