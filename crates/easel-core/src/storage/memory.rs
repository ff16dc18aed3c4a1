//! In-memory storage implementation.

use super::{BoxFuture, StorageBackend, StorageError, StorageResult};
use crate::scene::CanvasScene;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// In-memory storage for tests, ephemeral sessions and as a fallback snapshot.
pub struct MemoryBackend {
    /// Scenes per namespace, in insertion order.
    scenes: RwLock<HashMap<String, Vec<CanvasScene>>>,
    states: RwLock<HashMap<String, String>>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            scenes: RwLock::new(HashMap::new()),
            states: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryBackend {
    /// Create a new empty memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage. While unavailable every operation fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable("memory backend offline".to_string()))
        }
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl StorageBackend for MemoryBackend {
    fn list(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Vec<CanvasScene>>> {
        let namespace = namespace.to_string();
        Box::pin(async move {
            self.check()?;
            let scenes = self.scenes.read().map_err(lock_error)?;
            Ok(scenes.get(&namespace).cloned().unwrap_or_default())
        })
    }

    fn put(&self, namespace: &str, scene: &CanvasScene) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        let scene = scene.clone();
        Box::pin(async move {
            self.check()?;
            let mut scenes = self.scenes.write().map_err(lock_error)?;
            let bucket = scenes.entry(namespace).or_default();
            match bucket.iter_mut().find(|s| s.id == scene.id) {
                Some(existing) => *existing = scene,
                None => bucket.push(scene),
            }
            Ok(())
        })
    }

    fn delete(&self, namespace: &str, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        let id = id.to_string();
        Box::pin(async move {
            self.check()?;
            let mut scenes = self.scenes.write().map_err(lock_error)?;
            if let Some(bucket) = scenes.get_mut(&namespace) {
                bucket.retain(|s| s.id != id);
            }
            Ok(())
        })
    }

    fn clear(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        Box::pin(async move {
            self.check()?;
            let mut scenes = self.scenes.write().map_err(lock_error)?;
            scenes.remove(&namespace);
            Ok(())
        })
    }

    fn load_state(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            self.check()?;
            let states = self.states.read().map_err(lock_error)?;
            Ok(states.get(&key).cloned())
        })
    }

    fn save_state(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = json.to_string();
        Box::pin(async move {
            self.check()?;
            let mut states = self.states.write().map_err(lock_error)?;
            states.insert(key, json);
            Ok(())
        })
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
