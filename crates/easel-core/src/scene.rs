//! Scene store: named snapshots of the canvas, persisted through a backend.
//!
//! The in-memory scene list is authoritative. Backend writes happen after
//! the list is updated; a failed write is logged and kept as a diagnostic,
//! never rolled back. Scenes whose write failed stay in the list across
//! refreshes and are written again once the backend answers.

use crate::group::CanvasGroup;
use crate::items::{clamp_size, new_id, normalize_item_value, CanvasItem, GroupId, ItemId};
use crate::storage::StorageBackend;
use crate::store::ItemStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "scenes";

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Cannot save an empty canvas")]
    EmptyCanvas,
    #[error("Scene not found: {0}")]
    NotFound(String),
    #[error("Invalid scene format: {0}")]
    InvalidFormat(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SceneResult<T> = Result<T, SceneError>;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// An immutable snapshot of items and groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasScene {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<CanvasItem>,
    #[serde(default)]
    pub groups: Vec<CanvasGroup>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

impl CanvasScene {
    pub fn new(name: impl Into<String>, items: Vec<CanvasItem>, groups: Vec<CanvasGroup>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            items,
            groups,
            created_at: now_millis(),
        }
    }

    /// Parse a stored scene, accepting items without a `type` tag.
    pub fn from_json(json: &str) -> SceneResult<Self> {
        let mut value: Value = serde_json::from_str(json)?;
        if let Some(Value::Array(items)) = value.get_mut("items") {
            items.iter_mut().for_each(normalize_item_value);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> SceneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy with fresh ids for every item and group, references remapped.
    fn reminted(&self, name: String) -> Self {
        let (items, groups) = remint(&self.items, &self.groups);
        Self::new(name, items, groups)
    }
}

/// Give every item and group a fresh id, rewriting parent and group references.
///
/// References to ids outside the given set are dropped.
fn remint(items: &[CanvasItem], groups: &[CanvasGroup]) -> (Vec<CanvasItem>, Vec<CanvasGroup>) {
    let item_ids: HashMap<&str, ItemId> = items.iter().map(|i| (i.id.as_str(), new_id())).collect();
    let group_ids: HashMap<&str, GroupId> = groups.iter().map(|g| (g.id.as_str(), new_id())).collect();

    let items = items
        .iter()
        .map(|item| {
            let mut copy = item.clone();
            copy.id = item_ids[item.id.as_str()].clone();
            copy.parent_id = item
                .parent_id
                .as_deref()
                .and_then(|p| item_ids.get(p).cloned());
            if copy.parent_id.is_none() {
                copy.order = None;
            }
            copy.group_id = item
                .group_id
                .as_deref()
                .and_then(|g| group_ids.get(g).cloned());
            copy
        })
        .collect();
    let groups = groups
        .iter()
        .map(|group| {
            let mut copy = group.clone();
            copy.id = group_ids[group.id.as_str()].clone();
            copy
        })
        .collect();
    (items, groups)
}

/// Replace the store contents with a scene's items under fresh ids.
///
/// Artboards are inserted first so children can be re-pointed at them.
/// Sizes below the per-type minimum are raised to it. Groups are not
/// restored. Returns the new item ids.
pub fn restore_scene(scene: &CanvasScene, store: &mut ItemStore) -> Vec<ItemId> {
    store.clear();
    let mut id_map: HashMap<&str, ItemId> = HashMap::new();
    let mut restored = Vec::with_capacity(scene.items.len());

    for item in scene.items.iter().filter(|item| item.is_artboard()) {
        let mut copy = item.clone();
        copy.id = new_id();
        copy.size = clamp_size(copy.size, copy.min_size());
        copy.group_id = None;
        copy.parent_id = None;
        copy.order = None;
        id_map.insert(item.id.as_str(), copy.id.clone());
        restored.push(copy.id.clone());
        store.insert(copy);
    }

    for item in scene.items.iter().filter(|item| !item.is_artboard()) {
        let mut copy = item.clone();
        copy.id = new_id();
        copy.size = clamp_size(copy.size, copy.min_size());
        copy.group_id = None;
        copy.parent_id = item
            .parent_id
            .as_deref()
            .and_then(|p| id_map.get(p).cloned());
        if copy.parent_id.is_none() {
            copy.order = None;
        }
        restored.push(copy.id.clone());
        store.insert(copy);
    }

    log::debug!("Restored {} items from scene {}", restored.len(), scene.id);
    restored
}

/// Named scenes in one namespace of a storage backend.
pub struct SceneStore<B: StorageBackend> {
    backend: Arc<B>,
    namespace: String,
    scenes: Vec<CanvasScene>,
    /// Scenes whose last write failed.
    unsynced: HashSet<String>,
    /// Scenes whose backend delete failed.
    unsynced_deletes: HashSet<String>,
    last_error: Option<String>,
}

impl<B: StorageBackend> SceneStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self::with_namespace(backend, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(backend: Arc<B>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            scenes: Vec::new(),
            unsynced: HashSet::new(),
            unsynced_deletes: HashSet::new(),
            last_error: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Cached scenes, oldest first.
    pub fn scenes(&self) -> &[CanvasScene] {
        &self.scenes
    }

    pub fn get(&self, id: &str) -> Option<&CanvasScene> {
        self.scenes.iter().find(|scene| scene.id == id)
    }

    /// Last backend failure, if the most recent backend call failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn sort(&mut self) {
        self.scenes
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
    }

    fn record<T>(&mut self, action: &str, result: crate::storage::StorageResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                log::warn!("Scene {} failed in namespace {}: {}", action, self.namespace, e);
                self.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Number of local changes the backend has not accepted yet.
    pub fn unsynced_count(&self) -> usize {
        self.unsynced.len() + self.unsynced_deletes.len()
    }

    /// Reload the scene list from the backend. On failure the cached list is kept.
    ///
    /// Scenes whose write failed keep their local copy and are written again;
    /// deletes that failed are retried.
    pub async fn refresh(&mut self) -> bool {
        let result = self.backend.list(&self.namespace).await;
        let Some(listed) = self.record("refresh", result) else {
            return false;
        };
        let mut merged: Vec<CanvasScene> = listed
            .into_iter()
            .filter(|scene| !self.unsynced.contains(&scene.id) && !self.unsynced_deletes.contains(&scene.id))
            .collect();
        merged.extend(
            self.scenes
                .iter()
                .filter(|scene| self.unsynced.contains(&scene.id))
                .cloned(),
        );
        self.scenes = merged;
        self.sort();
        self.resync().await;
        true
    }

    async fn resync(&mut self) {
        let deletes: Vec<String> = self.unsynced_deletes.iter().cloned().collect();
        for id in deletes {
            self.remove_from_backend(&id).await;
        }
        let pending: Vec<CanvasScene> = self
            .scenes
            .iter()
            .filter(|scene| self.unsynced.contains(&scene.id))
            .cloned()
            .collect();
        if !pending.is_empty() {
            log::info!("Writing {} unsynced scenes to namespace {}", pending.len(), self.namespace);
        }
        for scene in &pending {
            self.persist(scene).await;
        }
    }

    async fn persist(&mut self, scene: &CanvasScene) {
        let result = self.backend.put(&self.namespace, scene).await;
        if self.record("write", result).is_some() {
            self.unsynced.remove(&scene.id);
        } else {
            self.unsynced.insert(scene.id.clone());
        }
    }

    async fn remove_from_backend(&mut self, id: &str) {
        let result = self.backend.delete(&self.namespace, id).await;
        if self.record("delete", result).is_some() {
            self.unsynced_deletes.remove(id);
        } else {
            self.unsynced_deletes.insert(id.to_string());
        }
    }

    fn upsert(&mut self, scene: CanvasScene) {
        match self.scenes.iter_mut().find(|s| s.id == scene.id) {
            Some(existing) => *existing = scene,
            None => self.scenes.push(scene),
        }
        self.sort();
    }

    /// Snapshot items and groups under a name. Refuses an empty canvas.
    pub async fn save(
        &mut self,
        name: impl Into<String>,
        items: &[CanvasItem],
        groups: &[CanvasGroup],
    ) -> SceneResult<String> {
        if items.is_empty() {
            return Err(SceneError::EmptyCanvas);
        }
        let scene = CanvasScene::new(name, items.to_vec(), groups.to_vec());
        let id = scene.id.clone();
        log::info!("Saving scene {} ({} items)", scene.name, scene.items.len());
        self.upsert(scene.clone());
        self.persist(&scene).await;
        Ok(id)
    }

    /// Snapshot the whole live store.
    pub async fn save_store(&mut self, name: impl Into<String>, store: &ItemStore) -> SceneResult<String> {
        self.save(name, store.items(), store.groups()).await
    }

    /// Replace the live store with a scene. Returns the new item ids.
    pub fn load(&self, id: &str, store: &mut ItemStore) -> SceneResult<Vec<ItemId>> {
        let scene = self
            .get(id)
            .ok_or_else(|| SceneError::NotFound(id.to_string()))?;
        log::info!("Loading scene {} ({} items)", scene.name, scene.items.len());
        Ok(restore_scene(scene, store))
    }

    /// Copy a scene with fresh item and group ids.
    pub async fn duplicate(&mut self, id: &str) -> SceneResult<String> {
        let source = self
            .get(id)
            .ok_or_else(|| SceneError::NotFound(id.to_string()))?;
        let copy = source.reminted(format!("{} (copy)", source.name));
        let new_id = copy.id.clone();
        self.upsert(copy.clone());
        self.persist(&copy).await;
        Ok(new_id)
    }

    /// Scene as pretty JSON.
    pub fn export(&self, id: &str) -> SceneResult<String> {
        self.get(id)
            .ok_or_else(|| SceneError::NotFound(id.to_string()))?
            .to_json()
    }

    /// Import a scene exported elsewhere. Every item and group gets a fresh id.
    ///
    /// The payload must carry a string `name` and an `items` array.
    pub async fn import(&mut self, json: &str) -> SceneResult<String> {
        let scene = parse_import(json)?;
        let imported = scene.reminted(scene.name.clone());
        let id = imported.id.clone();
        log::info!("Imported scene {} ({} items)", imported.name, imported.items.len());
        self.upsert(imported.clone());
        self.persist(&imported).await;
        Ok(id)
    }

    pub async fn rename(&mut self, id: &str, name: impl Into<String>) -> SceneResult<()> {
        let scene = self
            .scenes
            .iter_mut()
            .find(|scene| scene.id == id)
            .ok_or_else(|| SceneError::NotFound(id.to_string()))?;
        scene.name = name.into();
        let scene = scene.clone();
        self.sort();
        self.persist(&scene).await;
        Ok(())
    }

    pub async fn delete(&mut self, id: &str) -> SceneResult<()> {
        let before = self.scenes.len();
        self.scenes.retain(|scene| scene.id != id);
        if self.scenes.len() == before {
            return Err(SceneError::NotFound(id.to_string()));
        }
        self.unsynced.remove(id);
        self.remove_from_backend(id).await;
        Ok(())
    }

    /// Remove every scene in this namespace.
    pub async fn clear_all(&mut self) {
        let removed: Vec<String> = self.scenes.drain(..).map(|scene| scene.id).collect();
        self.unsynced.clear();
        let result = self.backend.clear(&self.namespace).await;
        if self.record("clear", result).is_some() {
            self.unsynced_deletes.clear();
        } else {
            self.unsynced_deletes.extend(removed);
        }
    }
}

fn parse_import(json: &str) -> SceneResult<CanvasScene> {
    let mut value: Value =
        serde_json::from_str(json).map_err(|e| SceneError::InvalidFormat(e.to_string()))?;
    let Some(obj) = value.as_object_mut() else {
        return Err(SceneError::InvalidFormat("expected an object".to_string()));
    };
    if !obj.get("name").map(Value::is_string).unwrap_or(false) {
        return Err(SceneError::InvalidFormat("missing scene name".to_string()));
    }
    match obj.get_mut("items") {
        Some(Value::Array(items)) => items.iter_mut().for_each(normalize_item_value),
        _ => return Err(SceneError::InvalidFormat("missing items array".to_string())),
    }
    if let Some(Value::Array(items)) = obj.get("items") {
        let mut seen = HashSet::new();
        for id in items.iter().filter_map(|item| item.get("id").and_then(Value::as_str)) {
            if !seen.insert(id) {
                return Err(SceneError::InvalidFormat(format!("duplicate item id {id}")));
            }
        }
    }
    if !obj.get("groups").map(Value::is_array).unwrap_or(false) {
        obj.insert("groups".to_string(), Value::Array(Vec::new()));
    }
    // Ids are reminted, so placeholders are fine when absent.
    if !obj.get("id").map(Value::is_string).unwrap_or(false) {
        obj.insert("id".to_string(), Value::String(String::new()));
    }
    serde_json::from_value(value).map_err(|e| SceneError::InvalidFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemDraft, ItemKind};
    use crate::storage::test_util::block_on;
    use crate::storage::MemoryBackend;
    use kurbo::Point;

    fn populated() -> (ItemStore, ItemId, ItemId) {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("Home").at(200.0, 0.0).with_size(400.0, 300.0));
        let child = store.add(ItemDraft::component("hero", 0).in_artboard(board.clone()));
        let a = store.add(ItemDraft::component("button", 0).at(0.0, 0.0));
        let b = store.add(ItemDraft::embed("https://a.test").at(0.0, 400.0));
        store.create_group(&[a, b]);
        (store, board, child)
    }

    fn scene_store() -> SceneStore<MemoryBackend> {
        SceneStore::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_save_refuses_empty_canvas() {
        let mut scenes = scene_store();
        let result = block_on(scenes.save("Empty", &[], &[]));
        assert!(matches!(result, Err(SceneError::EmptyCanvas)));
        assert!(scenes.scenes().is_empty());
    }

    #[test]
    fn test_save_is_a_deep_copy() {
        let (mut store, board, _) = populated();
        let mut scenes = scene_store();
        let id = block_on(scenes.save_store("Home", &store)).unwrap();

        store.update(&board, crate::items::ItemPatch::new().position(Point::new(999.0, 999.0)));
        let saved = scenes.get(&id).unwrap();
        let saved_board = saved.items.iter().find(|i| i.id == board).unwrap();
        assert_eq!(saved_board.position, Point::new(200.0, 0.0));
        assert_eq!(saved.groups.len(), 1);
    }

    #[test]
    fn test_load_remaps_ids_and_parents() {
        let (store, board, child) = populated();
        let mut scenes = scene_store();
        let id = block_on(scenes.save_store("Home", &store)).unwrap();

        let mut live = ItemStore::new();
        live.add(ItemDraft::component("stale", 0));
        let restored = scenes.load(&id, &mut live).unwrap();

        assert_eq!(restored.len(), 4);
        assert_eq!(live.len(), 4);
        assert!(!live.contains(&board));
        assert!(!live.contains(&child));

        let new_board = live.items().iter().find(|i| i.is_artboard()).unwrap().id.clone();
        let children = live.children_of(&new_board);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].order, Some(0));

        // Groups are not restored.
        assert!(live.groups().is_empty());
        assert!(live.items().iter().all(|i| i.group_id.is_none()));
        assert!(live.selected_ids().is_empty());
    }

    #[test]
    fn test_load_keeps_z_counter_ahead() {
        let (store, _, _) = populated();
        let mut scenes = scene_store();
        let id = block_on(scenes.save_store("Home", &store)).unwrap();

        let mut live = ItemStore::new();
        scenes.load(&id, &mut live).unwrap();
        let max_z = live.items().iter().map(|i| i.z_index).max().unwrap();
        let fresh = live.add(ItemDraft::component("new", 0));
        assert!(live.get(&fresh).unwrap().z_index > max_z);
    }

    #[test]
    fn test_load_missing_scene() {
        let scenes = scene_store();
        let mut live = ItemStore::new();
        let id = live.add(ItemDraft::component("keep", 0));
        assert!(matches!(
            scenes.load("nope", &mut live),
            Err(SceneError::NotFound(_))
        ));
        assert!(live.contains(&id));
    }

    #[test]
    fn test_duplicate_mints_fresh_ids() {
        let (store, _, _) = populated();
        let mut scenes = scene_store();
        let id = block_on(scenes.save_store("Home", &store)).unwrap();
        let copy_id = block_on(scenes.duplicate(&id)).unwrap();

        let original = scenes.get(&id).unwrap();
        let copy = scenes.get(&copy_id).unwrap();
        assert_eq!(copy.name, "Home (copy)");
        assert_eq!(copy.items.len(), original.items.len());
        for item in &copy.items {
            assert!(original.items.iter().all(|o| o.id != item.id));
        }
        assert_ne!(copy.groups[0].id, original.groups[0].id);

        let copy_board = copy.items.iter().find(|i| i.is_artboard()).unwrap();
        let copy_child = copy.items.iter().find(|i| i.parent_id.is_some()).unwrap();
        assert_eq!(copy_child.parent_id.as_deref(), Some(copy_board.id.as_str()));
        let grouped = copy.items.iter().filter(|i| i.group_id.as_deref() == Some(copy.groups[0].id.as_str()));
        assert_eq!(grouped.count(), 2);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (store, _, _) = populated();
        let mut scenes = scene_store();
        let id = block_on(scenes.save_store("Home", &store)).unwrap();
        let json = scenes.export(&id).unwrap();

        let mut other = scene_store();
        let imported = block_on(other.import(&json)).unwrap();
        let scene = other.get(&imported).unwrap();
        assert_ne!(imported, id);
        assert_eq!(scene.name, "Home");
        assert_eq!(scene.items.len(), 4);
        assert!(scene.items.iter().all(|i| !store.contains(&i.id)));
    }

    #[test]
    fn test_import_rejects_malformed() {
        let mut scenes = scene_store();
        for bad in [
            "not json",
            "[]",
            r#"{"items": []}"#,
            r#"{"name": 3, "items": []}"#,
            r#"{"name": "x"}"#,
            r#"{"name": "x", "items": {}}"#,
            r#"{"name": "x", "items": [{"id": "a"}]}"#,
        ] {
            let result = block_on(scenes.import(bad));
            assert!(matches!(result, Err(SceneError::InvalidFormat(_))), "{bad}");
        }
        assert!(scenes.scenes().is_empty());
    }

    #[test]
    fn test_import_tolerates_legacy_and_unknown_fields() {
        let mut scenes = scene_store();
        let json = r#"{
            "name": "Legacy",
            "future": {"anything": true},
            "items": [{
                "id": "old",
                "position": {"x": 1, "y": 2},
                "size": {"width": 100, "height": 50},
                "componentId": "button",
                "glow": 7
            }]
        }"#;
        let id = block_on(scenes.import(json)).unwrap();
        let scene = scenes.get(&id).unwrap();
        assert!(matches!(scene.items[0].kind, ItemKind::Component(_)));
        assert!(scene.groups.is_empty());
    }

    #[test]
    fn test_backend_failure_keeps_memory_state() {
        let backend = Arc::new(MemoryBackend::new());
        let mut scenes = SceneStore::new(backend.clone());
        let (store, _, _) = populated();
        block_on(scenes.save_store("First", &store)).unwrap();
        assert!(block_on(scenes.refresh()));

        backend.set_available(false);
        let id = block_on(scenes.save_store("Second", &store)).unwrap();
        assert!(scenes.last_error().is_some());
        assert!(scenes.get(&id).is_some());

        assert!(!block_on(scenes.refresh()));
        assert_eq!(scenes.scenes().len(), 2);

        backend.set_available(true);
        assert!(block_on(scenes.refresh()));
        let names: Vec<&str> = scenes.scenes().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert!(scenes.last_error().is_none());
        assert_eq!(scenes.unsynced_count(), 0);

        // The retried write reached the backend.
        let mut reopened = SceneStore::new(backend.clone());
        assert!(block_on(reopened.refresh()));
        assert!(reopened.get(&id).is_some());
    }

    #[test]
    fn test_failed_delete_is_retried_on_refresh() {
        let backend = Arc::new(MemoryBackend::new());
        let mut scenes = SceneStore::new(backend.clone());
        let (store, _, _) = populated();
        let keep = block_on(scenes.save_store("Keep", &store)).unwrap();
        let gone = block_on(scenes.save_store("Gone", &store)).unwrap();

        backend.set_available(false);
        block_on(scenes.delete(&gone)).unwrap();
        assert!(scenes.last_error().is_some());
        assert_eq!(scenes.unsynced_count(), 1);

        backend.set_available(true);
        assert!(block_on(scenes.refresh()));
        assert!(scenes.get(&gone).is_none());
        assert!(scenes.get(&keep).is_some());
        assert_eq!(scenes.unsynced_count(), 0);

        let mut reopened = SceneStore::new(backend);
        block_on(reopened.refresh());
        assert_eq!(reopened.scenes().len(), 1);
    }

    #[test]
    fn test_load_raises_undersized_items() {
        let mut scenes = scene_store();
        let json = r#"{
            "name": "Tiny",
            "items": [
                {"id": "b", "type": "artboard", "name": "Board", "position": {"x": 0, "y": 0}, "size": {"width": 1, "height": 1}},
                {"id": "c", "type": "component", "componentId": "button", "position": {"x": 0, "y": 0}, "size": {"width": 5, "height": 5}}
            ]
        }"#;
        let id = block_on(scenes.import(json)).unwrap();

        let mut live = ItemStore::new();
        scenes.load(&id, &mut live).unwrap();
        assert_eq!(live.len(), 2);
        for item in live.items() {
            let min = item.min_size();
            assert!(item.size.width >= min.width && item.size.height >= min.height, "{:?}", item.size);
        }
    }

    #[test]
    fn test_import_rejects_duplicate_item_ids() {
        let mut scenes = scene_store();
        let json = r#"{
            "name": "Twins",
            "items": [
                {"id": "x", "componentId": "button", "position": {"x": 0, "y": 0}, "size": {"width": 100, "height": 50}},
                {"id": "x", "componentId": "card", "position": {"x": 200, "y": 0}, "size": {"width": 100, "height": 50}}
            ]
        }"#;
        let result = block_on(scenes.import(json));
        assert!(matches!(result, Err(SceneError::InvalidFormat(_))));
        assert!(scenes.scenes().is_empty());
    }

    #[test]
    fn test_rename_delete_clear() {
        let backend = Arc::new(MemoryBackend::new());
        let mut scenes = SceneStore::with_namespace(backend.clone(), "team");
        let (store, _, _) = populated();
        let a = block_on(scenes.save_store("A", &store)).unwrap();
        let b = block_on(scenes.save_store("B", &store)).unwrap();

        block_on(scenes.rename(&a, "Alpha")).unwrap();
        let mut fresh = SceneStore::with_namespace(backend.clone(), "team");
        block_on(fresh.refresh());
        assert!(fresh.scenes().iter().any(|s| s.name == "Alpha"));

        block_on(scenes.delete(&b)).unwrap();
        assert!(matches!(block_on(scenes.delete(&b)), Err(SceneError::NotFound(_))));
        assert_eq!(scenes.scenes().len(), 1);

        block_on(scenes.clear_all());
        assert!(scenes.scenes().is_empty());
        block_on(fresh.refresh());
        assert!(fresh.scenes().is_empty());
    }
}
