//! Auto-save of the live canvas state.
//!
//! The host calls [`AutoSaveManager::maybe_save`] after committed mutations;
//! writes are coalesced by the store revision and a minimum interval.

use crate::storage::{MemoryBackend, StorageBackend, StorageError, StorageResult};
use crate::store::ItemStore;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default minimum time between auto-saves.
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 1000;

/// Storage key of the live canvas blob.
pub const LIVE_STATE_KEY: &str = "canvas-state";

/// Manages automatic persistence of the live canvas.
pub struct AutoSaveManager<B: StorageBackend> {
    backend: Arc<B>,
    key: String,
    interval: Duration,
    last_save: Option<Instant>,
    /// Store revision captured by the last successful save or load.
    saved_revision: Option<u64>,
    last_error: Option<String>,
}

impl<B: StorageBackend> AutoSaveManager<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            key: LIVE_STATE_KEY.to_string(),
            interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS),
            last_save: None,
            saved_revision: None,
            last_error: None,
        }
    }

    /// Use a different storage key, e.g. one per workspace.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the store changed since the last save.
    pub fn is_dirty(&self, store: &ItemStore) -> bool {
        self.saved_revision != Some(store.revision())
    }

    /// Dirty and the interval has elapsed.
    pub fn should_save(&self, store: &ItemStore) -> bool {
        if !self.is_dirty(store) {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, store: &ItemStore) -> StorageResult<bool> {
        if !self.should_save(store) {
            return Ok(false);
        }
        self.save(store).await?;
        Ok(true)
    }

    /// Write the live state now.
    ///
    /// A failure is recorded in [`Self::last_error`]; the store is untouched.
    pub async fn save(&mut self, store: &ItemStore) -> StorageResult<()> {
        let result = match store.to_json() {
            Ok(json) => self.backend.save_state(&self.key, &json).await,
            Err(e) => Err(StorageError::Serialization(e.to_string())),
        };
        self.last_save = Some(Instant::now());
        match result {
            Ok(()) => {
                self.saved_revision = Some(store.revision());
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Auto-save failed: {}", e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Restore the last saved live state, normalized.
    ///
    /// Returns `None` if nothing was saved or the blob cannot be read.
    pub async fn load_last(&mut self) -> Option<ItemStore> {
        let json = match self.backend.load_state(&self.key).await {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Could not read saved canvas: {}", e);
                self.last_error = Some(e.to_string());
                return None;
            }
        };
        match ItemStore::from_json(&json) {
            Ok(store) => {
                log::info!("Restored canvas with {} items", store.len());
                self.saved_revision = Some(store.revision());
                self.last_save = Some(Instant::now());
                Some(store)
            }
            Err(e) => {
                log::warn!("Discarding unreadable saved canvas: {}", e);
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Last persistence failure, cleared by the next successful save.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

/// Platform storage: files with an in-memory mirror on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformBackend = crate::storage::FallbackBackend<crate::storage::FileBackend, MemoryBackend>;

#[cfg(target_arch = "wasm32")]
pub type PlatformBackend = MemoryBackend;

/// Create a platform-appropriate storage backend.
///
/// If the data directory cannot be used, only the in-memory mirror is kept.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_backend() -> Arc<PlatformBackend> {
    let primary = match crate::storage::FileBackend::default_location() {
        Ok(files) => Some(files),
        Err(e) => {
            log::warn!("File storage unavailable: {}", e);
            None
        }
    };
    Arc::new(crate::storage::FallbackBackend::new(primary, MemoryBackend::new()))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_backend() -> Arc<PlatformBackend> {
    Arc::new(MemoryBackend::new())
}

/// Type alias for the auto-save manager with platform-specific storage.
pub type PlatformAutoSaveManager = AutoSaveManager<PlatformBackend>;

/// Convenience function to create an auto-save manager with default storage.
pub fn create_autosave_manager() -> PlatformAutoSaveManager {
    AutoSaveManager::new(create_default_backend())
}
