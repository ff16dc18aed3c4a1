//! File-based storage implementation for native platforms.

use super::{BoxFuture, StorageBackend, StorageError, StorageResult};
use crate::scene::CanvasScene;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-based storage for native platforms.
///
/// Layout under the base directory:
///
/// ```text
/// scenes/<namespace>/<scene id>.json
/// state/<key>.json
/// ```
pub struct FileBackend {
    base_path: PathBuf,
}

/// Make an id safe to use as a file or directory name.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl FileBackend {
    /// Create a file backend rooted at `base_path`, creating it if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| io_error("create", &base_path, e))?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/easel/`
    /// On Windows: `%LOCALAPPDATA%\easel\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("easel"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.base_path.join("scenes").join(sanitize(namespace))
    }

    fn scene_path(&self, namespace: &str, id: &str) -> PathBuf {
        self.namespace_dir(namespace).join(format!("{}.json", sanitize(id)))
    }

    fn state_path(&self, key: &str) -> PathBuf {
        self.base_path.join("state").join(format!("{}.json", sanitize(key)))
    }
}

fn write_file(path: &Path, contents: &str) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
    }
    fs::write(path, contents).map_err(|e| io_error("write", path, e))
}

impl StorageBackend for FileBackend {
    fn list(&self, namespace: &str) -> BoxFuture<'_, StorageResult<Vec<CanvasScene>>> {
        let dir = self.namespace_dir(namespace);
        Box::pin(async move {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(io_error("read", &dir, e)),
            };

            let mut scenes = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e != "json").unwrap_or(true) {
                    continue;
                }
                let parsed = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|json| CanvasScene::from_json(&json).map_err(|e| e.to_string()));
                match parsed {
                    Ok(scene) => scenes.push(scene),
                    Err(e) => log::warn!("Skipping unreadable scene {}: {}", path.display(), e),
                }
            }
            Ok(scenes)
        })
    }

    fn put(&self, namespace: &str, scene: &CanvasScene) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(namespace, &scene.id);
        let json = match scene.to_json() {
            Ok(json) => json,
            Err(e) => {
                return Box::pin(async move { Err(StorageError::Serialization(e.to_string())) })
            }
        };
        Box::pin(async move { write_file(&path, &json) })
    }

    fn delete(&self, namespace: &str, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.scene_path(namespace, id);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error("delete", &path, e)),
            }
        })
    }

    fn clear(&self, namespace: &str) -> BoxFuture<'_, StorageResult<()>> {
        let dir = self.namespace_dir(namespace);
        Box::pin(async move {
            match fs::remove_dir_all(&dir) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error("clear", &dir, e)),
            }
        })
    }

    fn load_state(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let path = self.state_path(key);
        Box::pin(async move {
            match fs::read_to_string(&path) {
                Ok(json) => Ok(Some(json)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error("read", &path, e)),
            }
        })
    }

    fn save_state(&self, key: &str, json: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.state_path(key);
        let json = json.to_string();
        Box::pin(async move { write_file(&path, &json) })
    }

    fn is_available(&self) -> bool {
        self.base_path.is_dir()
    }
}
