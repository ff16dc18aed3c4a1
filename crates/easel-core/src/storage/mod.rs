//! Storage abstraction for scenes and the live canvas state.

mod autosave;
mod fallback;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use autosave::{
    create_autosave_manager, create_default_backend, AutoSaveManager, PlatformAutoSaveManager,
    PlatformBackend, DEFAULT_AUTOSAVE_INTERVAL_MS, LIVE_STATE_KEY,
};
pub use fallback::FallbackBackend;
pub use memory::MemoryBackend;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBackend;

use crate::scene::CanvasScene;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A persistence backend for scenes and state blobs.
///
/// Scenes live in namespaces; state blobs are addressed by a single key.
pub trait StorageBackend: Send + Sync {
    /// All scenes in a namespace, in no particular order.
    fn list(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Vec<CanvasScene>>>;

    /// Insert or replace a scene by id.
    fn put(&self, namespace: &str, scene: &CanvasScene) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a scene. Deleting a missing scene succeeds.
    fn delete(&self, namespace: &str, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete every scene in a namespace.
    fn clear(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Read a state blob, `None` if it was never written.
    fn load_state(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    fn save_state(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Whether the backend can currently be used.
    fn is_available(&self) -> bool {
        true
    }
}
