//! Primary/secondary backend pair selected by availability.
//!
//! Writes go to the secondary as well, so it always holds a snapshot to
//! fall back to. Reads prefer the primary and use the secondary when the
//! primary is missing, reports itself unavailable, or fails.

use super::{BoxFuture, StorageBackend, StorageError, StorageResult};
use crate::scene::CanvasScene;

pub struct FallbackBackend<P, S> {
    primary: Option<P>,
    secondary: S,
}

impl<P: StorageBackend, S: StorageBackend> FallbackBackend<P, S> {
    pub fn new(primary: Option<P>, secondary: S) -> Self {
        if primary.is_none() {
            log::warn!("Primary storage unavailable, using fallback only");
        }
        Self { primary, secondary }
    }

    fn primary(&self) -> Option<&P> {
        self.primary.as_ref().filter(|p| p.is_available())
    }

    /// Whether reads currently come from the primary.
    pub fn using_primary(&self) -> bool {
        self.primary().is_some()
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

/// Keep the primary result unless it failed; then report the mirror's.
fn settle(op: &str, primary: Option<StorageResult<()>>, mirror: StorageResult<()>) -> StorageResult<()> {
    match primary {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            log::warn!("Primary storage {} failed, kept fallback copy: {}", op, e);
            mirror
        }
        None => mirror,
    }
}

fn log_read_fallback(op: &str, e: &StorageError) {
    log::warn!("Primary storage {} failed, reading fallback: {}", op, e);
}

impl<P: StorageBackend, S: StorageBackend> StorageBackend for FallbackBackend<P, S> {
    fn list(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Vec<CanvasScene>>> {
        let namespace = namespace.to_string();
        Box::pin(async move {
            if let Some(primary) = self.primary() {
                match primary.list(&namespace).await {
                    Ok(scenes) => return Ok(scenes),
                    Err(e) => log_read_fallback("list", &e),
                }
            }
            self.secondary.list(&namespace).await
        })
    }

    fn put(&self, namespace: &str, scene: &CanvasScene) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        let scene = scene.clone();
        Box::pin(async move {
            let mirror = self.secondary.put(&namespace, &scene).await;
            let primary = match self.primary() {
                Some(p) => Some(p.put(&namespace, &scene).await),
                None => None,
            };
            settle("put", primary, mirror)
        })
    }

    fn delete(&self, namespace: &str, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        let id = id.to_string();
        Box::pin(async move {
            let mirror = self.secondary.delete(&namespace, &id).await;
            let primary = match self.primary() {
                Some(p) => Some(p.delete(&namespace, &id).await),
                None => None,
            };
            settle("delete", primary, mirror)
        })
    }

    fn clear(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>> {
        let namespace = namespace.to_string();
        Box::pin(async move {
            let mirror = self.secondary.clear(&namespace).await;
            let primary = match self.primary() {
                Some(p) => Some(p.clear(&namespace).await),
                None => None,
            };
            settle("clear", primary, mirror)
        })
    }

    fn load_state(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            if let Some(primary) = self.primary() {
                match primary.load_state(&key).await {
                    Ok(state) => return Ok(state),
                    Err(e) => log_read_fallback("load_state", &e),
                }
            }
            self.secondary.load_state(&key).await
        })
    }

    fn save_state(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let json = json.to_string();
        Box::pin(async move {
            let mirror = self.secondary.save_state(&key, &json).await;
            let primary = match self.primary() {
                Some(p) => Some(p.save_state(&key, &json).await),
                None => None,
            };
            settle("save_state", primary, mirror)
        })
    }

    fn is_available(&self) -> bool {
        self.using_primary() || self.secondary.is_available()
    }
}
