//! Item store: the authoritative set of items, groups, z-order counter and selection.

use crate::group::{bounding_box, CanvasGroup};
use crate::handles::aabb_overlaps;
use crate::items::{
    clamp_size, new_id, normalize_item_value, CanvasItem, GroupId, ItemDraft, ItemId, ItemKind,
    ItemPatch,
};
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Offset applied to duplicated items, in canvas units.
pub const DUPLICATE_OFFSET: f64 = 20.0;
/// First z-index handed out by a fresh store.
pub const FIRST_Z_INDEX: u64 = 1;

fn first_z_index() -> u64 {
    FIRST_Z_INDEX
}

/// Persisted live canvas state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    #[serde(default)]
    pub items: Vec<CanvasItem>,
    #[serde(default)]
    pub groups: Vec<CanvasGroup>,
    /// Next z-index to assign. Never decreases.
    #[serde(default = "first_z_index")]
    pub next_z_index: u64,
    /// Selection in insertion order.
    #[serde(default)]
    pub selected_ids: Vec<ItemId>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            groups: Vec::new(),
            next_z_index: FIRST_Z_INDEX,
            selected_ids: Vec::new(),
        }
    }
}

/// Direction for reordering a child within its artboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerDirection {
    /// Towards the start of the sibling sequence.
    Up,
    /// Towards the end of the sibling sequence.
    Down,
}

/// Owns all canvas items and the operations that keep them consistent.
#[derive(Debug, Clone)]
pub struct ItemStore {
    state: CanvasState,
    /// Bumped on every committed mutation.
    revision: u64,
    duplicate_offset: f64,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: CanvasState::default(),
            revision: 0,
            duplicate_offset: DUPLICATE_OFFSET,
        }
    }

    /// Set the offset used by duplication.
    pub fn with_duplicate_offset(mut self, offset: f64) -> Self {
        self.duplicate_offset = offset;
        self
    }

    /// Build a store from persisted state, repairing anything inconsistent.
    pub fn from_state(state: CanvasState) -> Self {
        let mut store = Self::new();
        store.state = state;
        store.normalize();
        store
    }

    /// Parse persisted state, tolerating legacy and partial payloads.
    ///
    /// Items without a `type` tag become components; missing arrays are empty.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(json)?;
        if let Some(obj) = value.as_object_mut() {
            for key in ["items", "groups", "selectedIds"] {
                let missing = obj.get(key).map(|v| !v.is_array()).unwrap_or(true);
                if missing {
                    obj.insert(key.to_string(), Value::Array(Vec::new()));
                }
            }
            if let Some(Value::Array(items)) = obj.get_mut("items") {
                items.iter_mut().for_each(normalize_item_value);
            }
        }
        let state: CanvasState = serde_json::from_value(value)?;
        Ok(Self::from_state(state))
    }

    /// Serialize the live state.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.state)
    }

    pub fn state(&self) -> &CanvasState {
        &self.state
    }

    /// Revision counter; changes whenever a mutation is committed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn take_z_index(&mut self) -> u64 {
        let z = self.state.next_z_index;
        self.state.next_z_index += 1;
        z
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.state.items.iter().position(|item| item.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut CanvasItem> {
        self.state.items.iter_mut().find(|item| item.id == id)
    }

    // --- queries ---

    pub fn get(&self, id: &str) -> Option<&CanvasItem> {
        self.state.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    /// Items in store order.
    pub fn items(&self) -> &[CanvasItem] {
        &self.state.items
    }

    /// Items sorted back to front.
    pub fn items_by_z(&self) -> Vec<&CanvasItem> {
        let mut items: Vec<&CanvasItem> = self.state.items.iter().collect();
        items.sort_by_key(|item| item.z_index);
        items
    }

    pub fn top_level_items(&self) -> impl Iterator<Item = &CanvasItem> {
        self.state.items.iter().filter(|item| item.is_top_level())
    }

    pub fn len(&self) -> usize {
        self.state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    pub fn next_z_index(&self) -> u64 {
        self.state.next_z_index
    }

    pub fn groups(&self) -> &[CanvasGroup] {
        &self.state.groups
    }

    pub fn group(&self, id: &str) -> Option<&CanvasGroup> {
        self.state.groups.iter().find(|group| group.id == id)
    }

    pub fn selected_ids(&self) -> &[ItemId] {
        &self.state.selected_ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.state.selected_ids.iter().any(|s| s == id)
    }

    /// The earliest selected item still selected.
    pub fn first_selected(&self) -> Option<&CanvasItem> {
        self.state.selected_ids.first().and_then(|id| self.get(id))
    }

    pub fn selected_items(&self) -> Vec<&CanvasItem> {
        self.state
            .selected_ids
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Children of an artboard in sibling order.
    pub fn children_of(&self, parent_id: &str) -> Vec<&CanvasItem> {
        let mut children: Vec<&CanvasItem> = self
            .state
            .items
            .iter()
            .filter(|item| item.parent_id.as_deref() == Some(parent_id))
            .collect();
        // Stable sort: equal orders keep store order.
        children.sort_by_key(|item| item.order.unwrap_or(u32::MAX));
        children
    }

    pub fn group_members(&self, group_id: &str) -> Vec<&CanvasItem> {
        self.state
            .items
            .iter()
            .filter(|item| item.group_id.as_deref() == Some(group_id))
            .collect()
    }

    /// Bounding box of a group's members, computed from current geometry.
    pub fn group_bounds(&self, group_id: &str) -> Option<Rect> {
        bounding_box(self.group_members(group_id))
    }

    /// Top-level items whose rectangle overlaps `rect`.
    pub fn top_level_ids_in_rect(&self, rect: Rect) -> Vec<ItemId> {
        self.top_level_items()
            .filter(|item| aabb_overlaps(item.rect(), rect))
            .map(|item| item.id.clone())
            .collect()
    }

    /// Next free sibling order inside an artboard.
    pub fn next_child_order(&self, parent_id: &str) -> u32 {
        self.state
            .items
            .iter()
            .filter(|item| item.parent_id.as_deref() == Some(parent_id))
            .filter_map(|item| item.order)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }

    fn is_live_artboard(&self, id: &str) -> bool {
        self.get(id).map(CanvasItem::is_artboard).unwrap_or(false)
    }

    // --- item lifecycle ---

    /// Add an item, assigning a fresh id and z-index, and select it.
    pub fn add(&mut self, draft: ItemDraft) -> ItemId {
        let id = new_id();
        let z_index = self.take_z_index();
        let size = clamp_size(draft.size, draft.kind.item_type().min_size());

        let (parent_id, order) = match draft.parent_id {
            Some(parent) if !matches!(draft.kind, ItemKind::Artboard(_)) => {
                if self.is_live_artboard(&parent) {
                    let order = self.next_child_order(&parent);
                    (Some(parent), Some(order))
                } else {
                    log::warn!("Ignoring parent {} for new item: not an artboard", parent);
                    (None, None)
                }
            }
            Some(parent) => {
                log::warn!("Artboards cannot be nested (requested parent {})", parent);
                (None, None)
            }
            None => (None, None),
        };

        self.state.items.push(CanvasItem {
            id: id.clone(),
            position: draft.position,
            size,
            rotation: draft.rotation,
            z_index,
            group_id: None,
            parent_id,
            order,
            kind: draft.kind,
        });
        self.state.selected_ids = vec![id.clone()];
        self.touch();
        id
    }

    /// Insert a fully formed item without touching the selection.
    ///
    /// The z-index counter is advanced past the item's z-index.
    pub(crate) fn insert(&mut self, item: CanvasItem) {
        if item.z_index >= self.state.next_z_index {
            self.state.next_z_index = item.z_index + 1;
        }
        self.state.items.push(item);
        self.touch();
    }

    /// Apply a partial update. Unknown ids are ignored.
    pub fn update(&mut self, id: &str, patch: ItemPatch) {
        let changed = match self.get_mut(id) {
            Some(item) => patch.apply(item),
            None => false,
        };
        if changed {
            self.touch();
        }
    }

    /// Remove an item. Removing an artboard removes its children too.
    ///
    /// Returns the ids actually removed.
    pub fn remove(&mut self, id: &str) -> Vec<ItemId> {
        let Some(item) = self.get(id) else {
            return Vec::new();
        };

        let mut doomed: Vec<ItemId> = vec![item.id.clone()];
        if item.is_artboard() {
            doomed.extend(self.children_of(id).into_iter().map(|child| child.id.clone()));
        }

        let doomed_set: HashSet<&str> = doomed.iter().map(String::as_str).collect();
        self.state
            .items
            .retain(|item| !doomed_set.contains(item.id.as_str()));
        self.state
            .selected_ids
            .retain(|sel| !doomed_set.contains(sel.as_str()));
        self.prune_groups();
        self.touch();
        doomed
    }

    /// Give an item a new z-index above every value handed out so far.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        let z_index = self.take_z_index();
        if let Some(item) = self.get_mut(id) {
            item.z_index = z_index;
        }
        self.touch();
        true
    }

    /// Remove every item, group and selection. The z-index counter is kept.
    pub fn clear(&mut self) {
        self.state.items.clear();
        self.state.groups.clear();
        self.state.selected_ids.clear();
        self.touch();
    }

    // --- selection ---

    /// Make `id` the only selected item.
    pub fn select(&mut self, id: &str) {
        if self.contains(id) {
            self.state.selected_ids = vec![id.to_string()];
            self.touch();
        }
    }

    /// Replace the selection, keeping the given order and dropping unknown ids.
    pub fn select_many<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<ItemId> = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if self.contains(id) && !selected.iter().any(|s| s == id) {
                selected.push(id.to_string());
            }
        }
        self.state.selected_ids = selected;
        self.touch();
    }

    pub fn add_to_selection(&mut self, id: &str) {
        if self.contains(id) && !self.is_selected(id) {
            self.state.selected_ids.push(id.to_string());
            self.touch();
        }
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if self.is_selected(id) {
            self.state.selected_ids.retain(|s| s != id);
            self.touch();
        } else {
            self.add_to_selection(id);
        }
    }

    /// Click semantics: shift toggles, otherwise the item becomes the sole selection.
    pub fn select_with_modifier(&mut self, id: &str, shift: bool) {
        if shift {
            self.toggle_selection(id);
        } else {
            self.select(id);
        }
    }

    /// Select every top-level item.
    pub fn select_all(&mut self) {
        self.state.selected_ids = self.top_level_items().map(|item| item.id.clone()).collect();
        self.touch();
    }

    pub fn clear_selection(&mut self) {
        if !self.state.selected_ids.is_empty() {
            self.state.selected_ids.clear();
            self.touch();
        }
    }

    // --- groups ---

    /// Group the given items.
    ///
    /// Returns `None` when fewer than two live items are given or when they
    /// already belong to two different groups. If exactly one existing group
    /// is involved the remaining items join it and its id is returned.
    pub fn create_group(&mut self, ids: &[ItemId]) -> Option<GroupId> {
        let mut members: Vec<ItemId> = Vec::new();
        for id in ids {
            if self.contains(id) && !members.contains(id) {
                members.push(id.clone());
            }
        }
        if members.len() < 2 {
            return None;
        }

        let existing: HashSet<GroupId> = members
            .iter()
            .filter_map(|id| self.get(id).and_then(|item| item.group_id.clone()))
            .collect();
        if existing.len() > 1 {
            log::debug!("Refusing to group items spanning {} groups", existing.len());
            return None;
        }

        let group_id = match existing.into_iter().next() {
            Some(group_id) => group_id,
            None => {
                let group_id = new_id();
                let group = CanvasGroup::new(group_id.clone(), self.state.groups.len());
                self.state.groups.push(group);
                group_id
            }
        };

        for item in self.state.items.iter_mut() {
            if members.contains(&item.id) {
                item.group_id = Some(group_id.clone());
            }
        }
        self.refresh_group_position(&group_id);
        self.touch();
        Some(group_id)
    }

    /// Dissolve a group, leaving its members in place.
    pub fn ungroup(&mut self, group_id: &str) -> bool {
        let before = self.state.groups.len();
        self.state.groups.retain(|group| group.id != group_id);
        if self.state.groups.len() == before {
            return false;
        }
        for item in self.state.items.iter_mut() {
            if item.group_id.as_deref() == Some(group_id) {
                item.group_id = None;
            }
        }
        self.touch();
        true
    }

    /// Translate every member of a group. Locked groups do not move.
    pub fn move_group(&mut self, group_id: &str, dx: f64, dy: f64) -> bool {
        let Some(group) = self.state.groups.iter_mut().find(|g| g.id == group_id) else {
            return false;
        };
        if group.is_locked {
            return false;
        }
        let delta = Vec2::new(dx, dy);
        group.translate(delta);
        for item in self.state.items.iter_mut() {
            if item.group_id.as_deref() == Some(group_id) {
                item.translate(delta);
            }
        }
        self.touch();
        true
    }

    pub fn set_group_locked(&mut self, group_id: &str, locked: bool) -> bool {
        match self.state.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => {
                group.is_locked = locked;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn rename_group(&mut self, group_id: &str, name: impl Into<String>) -> bool {
        match self.state.groups.iter_mut().find(|g| g.id == group_id) {
            Some(group) => {
                group.name = name.into();
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Recompute the cached group position from its members.
    pub(crate) fn refresh_group_position(&mut self, group_id: &str) {
        let Some(bounds) = self.group_bounds(group_id) else {
            return;
        };
        if let Some(group) = self.state.groups.iter_mut().find(|g| g.id == group_id) {
            group.position = bounds.origin();
        }
    }

    /// Dissolve groups with fewer than two members.
    fn prune_groups(&mut self) {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &self.state.items {
            if let Some(group_id) = item.group_id.as_deref() {
                *counts.entry(group_id).or_default() += 1;
            }
        }
        let dead: Vec<GroupId> = self
            .state
            .groups
            .iter()
            .filter(|g| counts.get(g.id.as_str()).copied().unwrap_or(0) < 2)
            .map(|g| g.id.clone())
            .collect();
        for group_id in dead {
            log::debug!("Dissolving group {} with fewer than two members", group_id);
            self.ungroup(&group_id);
        }
    }

    // --- bulk ---

    pub fn remove_selected(&mut self) -> Vec<ItemId> {
        let selected = self.state.selected_ids.clone();
        let mut removed = Vec::new();
        for id in selected {
            removed.extend(self.remove(&id));
        }
        removed
    }

    /// Translate selected top-level items.
    pub fn move_selected(&mut self, dx: f64, dy: f64) {
        if self.state.selected_ids.is_empty() {
            return;
        }
        let delta = Vec2::new(dx, dy);
        let selected: HashSet<ItemId> = self.state.selected_ids.iter().cloned().collect();
        let mut touched_groups: HashSet<GroupId> = HashSet::new();
        for item in self.state.items.iter_mut() {
            if selected.contains(&item.id) && item.is_top_level() {
                item.translate(delta);
                if let Some(group_id) = &item.group_id {
                    touched_groups.insert(group_id.clone());
                }
            }
        }
        for group_id in touched_groups {
            self.refresh_group_position(&group_id);
        }
        self.touch();
    }

    /// Duplicate the selection; the copies become the new selection.
    pub fn duplicate_selected(&mut self) -> Vec<ItemId> {
        let selected = self.state.selected_ids.clone();
        self.duplicate_ids(&selected)
    }

    pub fn duplicate_item(&mut self, id: &str) -> Option<ItemId> {
        self.duplicate_ids(&[id.to_string()]).into_iter().next()
    }

    /// Copies get new ids, an offset position, contiguous z-indices in the
    /// original relative order, and no group. Artboards bring their children.
    fn duplicate_ids(&mut self, ids: &[ItemId]) -> Vec<ItemId> {
        let mut requested: Vec<ItemId> = Vec::new();
        for id in ids {
            if self.contains(id) && !requested.contains(id) {
                requested.push(id.clone());
            }
        }
        if requested.is_empty() {
            return Vec::new();
        }

        let mut sources: Vec<CanvasItem> = Vec::new();
        for id in &requested {
            if let Some(item) = self.get(id) {
                sources.push(item.clone());
                if item.is_artboard() {
                    for child in self.children_of(id) {
                        if !requested.contains(&child.id) {
                            sources.push(child.clone());
                        }
                    }
                }
            }
        }
        sources.sort_by_key(|item| item.z_index);

        let id_map: HashMap<ItemId, ItemId> = sources
            .iter()
            .map(|item| (item.id.clone(), new_id()))
            .collect();
        let delta = Vec2::new(self.duplicate_offset, self.duplicate_offset);

        for source in sources {
            let mut copy = source.clone();
            copy.id = id_map[&source.id].clone();
            copy.z_index = self.take_z_index();
            copy.group_id = None;
            copy.translate(delta);
            if let Some(parent) = &source.parent_id {
                match id_map.get(parent) {
                    Some(new_parent) => copy.parent_id = Some(new_parent.clone()),
                    None => copy.order = Some(self.next_child_order(parent)),
                }
            }
            self.state.items.push(copy);
        }

        let copies: Vec<ItemId> = requested.iter().map(|id| id_map[id].clone()).collect();
        self.state.selected_ids = copies.clone();
        self.touch();
        copies
    }

    // --- containment ---

    /// Move an item into an artboard (`Some`) or onto the open canvas (`None`).
    ///
    /// Entering an artboard appends the item after its current siblings.
    /// Returns true if the containment changed.
    pub fn set_parent(&mut self, id: &str, parent_id: Option<&str>) -> bool {
        let Some(item) = self.get(id) else {
            return false;
        };
        if item.is_artboard() || item.parent_id.as_deref() == parent_id {
            return false;
        }

        match parent_id {
            Some(parent) => {
                if parent == id || !self.is_live_artboard(parent) {
                    return false;
                }
                let order = self.next_child_order(parent);
                if let Some(item) = self.get_mut(id) {
                    item.parent_id = Some(parent.to_string());
                    item.order = Some(order);
                }
            }
            None => {
                if let Some(item) = self.get_mut(id) {
                    item.parent_id = None;
                    item.order = None;
                }
            }
        }
        self.touch();
        true
    }

    /// Swap a child's order with its neighbour in the given direction.
    pub fn move_layer(&mut self, id: &str, direction: LayerDirection) -> bool {
        let Some(parent) = self.get(id).and_then(|item| item.parent_id.clone()) else {
            return false;
        };
        let siblings: Vec<ItemId> = self
            .children_of(&parent)
            .into_iter()
            .map(|item| item.id.clone())
            .collect();
        let Some(index) = siblings.iter().position(|s| s == id) else {
            return false;
        };
        let neighbour = match direction {
            LayerDirection::Up if index > 0 => index - 1,
            LayerDirection::Down if index + 1 < siblings.len() => index + 1,
            _ => return false,
        };

        // Renumber densely first so ties cannot make the swap a no-op.
        let mut orders: HashMap<&str, u32> = siblings
            .iter()
            .enumerate()
            .map(|(i, sibling)| (sibling.as_str(), i as u32))
            .collect();
        orders.insert(siblings[index].as_str(), neighbour as u32);
        orders.insert(siblings[neighbour].as_str(), index as u32);

        for item in self.state.items.iter_mut() {
            if let Some(order) = orders.get(item.id.as_str()) {
                item.order = Some(*order);
            }
        }
        self.touch();
        true
    }

    // --- normalization ---

    /// Restore the store invariants on loaded state.
    fn normalize(&mut self) {
        let max_z = self.state.items.iter().map(|item| item.z_index).max();
        let floor = max_z.map(|z| z + 1).unwrap_or(FIRST_Z_INDEX).max(FIRST_Z_INDEX);
        self.state.next_z_index = self.state.next_z_index.max(floor);

        let artboards: HashSet<ItemId> = self
            .state
            .items
            .iter()
            .filter(|item| item.is_artboard())
            .map(|item| item.id.clone())
            .collect();
        let group_ids: HashSet<GroupId> =
            self.state.groups.iter().map(|g| g.id.clone()).collect();

        let mut next_orders: HashMap<ItemId, u32> = HashMap::new();
        for item in &self.state.items {
            if let (Some(parent), Some(order)) = (&item.parent_id, item.order) {
                let next = next_orders.entry(parent.clone()).or_insert(0);
                *next = (*next).max(order + 1);
            }
        }

        for item in self.state.items.iter_mut() {
            item.size = clamp_size(item.size, item.min_size());
            if let Some(parent) = item.parent_id.clone() {
                if item.is_artboard() || !artboards.contains(&parent) {
                    log::warn!("Dropping dangling parent {} of item {}", parent, item.id);
                    item.parent_id = None;
                    item.order = None;
                } else if item.order.is_none() {
                    let next = next_orders.entry(parent).or_insert(0);
                    item.order = Some(*next);
                    *next += 1;
                }
            } else {
                item.order = None;
            }
            if let Some(group_id) = &item.group_id {
                if !group_ids.contains(group_id) {
                    item.group_id = None;
                }
            }
        }

        let live: HashSet<ItemId> = self.state.items.iter().map(|i| i.id.clone()).collect();
        let mut seen = HashSet::new();
        self.state
            .selected_ids
            .retain(|id| live.contains(id) && seen.insert(id.clone()));
        self.prune_groups();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ItemType, MIN_EMBED_SIZE};
    use kurbo::{Point, Size};

    fn store_with_items() -> (ItemStore, ItemId, ItemId, ItemId) {
        let mut store = ItemStore::new();
        let a = store.add(ItemDraft::component("button", 0).at(0.0, 0.0).with_size(100.0, 50.0));
        let b = store.add(ItemDraft::component("card", 1).at(200.0, 0.0).with_size(100.0, 100.0));
        let c = store.add(ItemDraft::embed("https://example.com").at(0.0, 300.0));
        (store, a, b, c)
    }

    #[test]
    fn test_add_assigns_increasing_z_and_selects() {
        let (store, a, b, c) = store_with_items();
        let za = store.get(&a).unwrap().z_index;
        let zb = store.get(&b).unwrap().z_index;
        let zc = store.get(&c).unwrap().z_index;
        assert!(za < zb && zb < zc);
        assert_eq!(store.selected_ids(), &[c]);
    }

    #[test]
    fn test_z_order_monotonic_with_bring_to_front() {
        let (mut store, a, b, _) = store_with_items();
        let mut last = store.items().iter().map(|i| i.z_index).max().unwrap();
        for id in [&a, &b, &a, &a] {
            assert!(store.bring_to_front(id));
            let z = store.get(id).unwrap().z_index;
            assert!(z > last);
            last = z;
        }
        // Bringing the current top item forward still issues a new value.
        let before = store.get(&a).unwrap().z_index;
        store.bring_to_front(&a);
        assert!(store.get(&a).unwrap().z_index > before);
    }

    #[test]
    fn test_z_index_survives_clear() {
        let (mut store, _, _, _) = store_with_items();
        let next = store.next_z_index();
        store.clear();
        assert!(store.is_empty());
        let id = store.add(ItemDraft::component("x", 0));
        assert_eq!(store.get(&id).unwrap().z_index, next);
    }

    #[test]
    fn test_add_clamps_to_min_size() {
        let mut store = ItemStore::new();
        let id = store.add(ItemDraft::embed("https://a.test").with_size(10.0, 10.0));
        assert_eq!(store.get(&id).unwrap().size, MIN_EMBED_SIZE);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (mut store, _, _, _) = store_with_items();
        let revision = store.revision();
        store.update("missing", ItemPatch::new().position(Point::new(5.0, 5.0)));
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn test_update_partial_fields() {
        let (mut store, a, _, _) = store_with_items();
        store.update(&a, ItemPatch::new().rotation(30.0));
        let item = store.get(&a).unwrap();
        assert_eq!(item.rotation, 30.0);
        assert_eq!(item.position, Point::new(0.0, 0.0));
        assert_eq!(item.size, Size::new(100.0, 50.0));
    }

    #[test]
    fn test_cascade_delete() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("Home").at(200.0, 0.0).with_size(400.0, 300.0));
        let mut children = Vec::new();
        for i in 0..3 {
            children.push(store.add(ItemDraft::component(format!("c{i}"), 0).in_artboard(board.clone())));
        }
        let outsider = store.add(ItemDraft::component("free", 0));
        store.select_many(children.iter().chain([&board]));

        let removed = store.remove(&board);
        assert_eq!(removed.len(), 4);
        assert_eq!(store.len(), 1);
        assert!(store.contains(&outsider));
        assert!(store.items().iter().all(|i| i.parent_id.is_none()));
        assert!(store.selected_ids().is_empty());
    }

    #[test]
    fn test_selection_never_holds_removed_ids() {
        let (mut store, a, b, c) = store_with_items();
        store.select_many([&a, &b, &c]);
        store.remove(&b);
        assert_eq!(store.selected_ids(), &[a.clone(), c.clone()]);
        store.select_many(["ghost", a.as_str()]);
        assert_eq!(store.selected_ids(), &[a]);
    }

    #[test]
    fn test_toggle_selection_preserves_order() {
        let (mut store, a, b, c) = store_with_items();
        store.select(&b);
        store.select_with_modifier(&a, true);
        store.select_with_modifier(&c, true);
        assert_eq!(store.selected_ids(), &[b.clone(), a.clone(), c.clone()]);
        store.select_with_modifier(&a, true);
        assert_eq!(store.selected_ids(), &[b.clone(), c]);
        assert_eq!(store.first_selected().unwrap().id, b);
        store.select_with_modifier(&a, false);
        assert_eq!(store.selected_ids(), &[a]);
    }

    #[test]
    fn test_select_all_skips_children() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        store.add(ItemDraft::component("c", 0).in_artboard(board.clone()));
        let free = store.add(ItemDraft::component("d", 0));
        store.select_all();
        assert_eq!(store.selected_ids(), &[board, free]);
    }

    #[test]
    fn test_group_preconditions() {
        let (mut store, a, b, c) = store_with_items();
        assert!(store.create_group(&[a.clone()]).is_none());
        assert!(store.create_group(&[a.clone(), "ghost".to_string()]).is_none());

        let g1 = store.create_group(&[a.clone(), b.clone()]).unwrap();
        let d = store.add(ItemDraft::component("d", 0));
        let g2 = store.create_group(&[c.clone(), d.clone()]).unwrap();
        assert_ne!(g1, g2);

        // Spans two distinct groups.
        assert!(store.create_group(&[a.clone(), c.clone()]).is_none());
        assert_eq!(store.groups().len(), 2);
    }

    #[test]
    fn test_group_joins_single_existing_group() {
        let (mut store, a, b, c) = store_with_items();
        let g = store.create_group(&[a.clone(), b.clone()]).unwrap();
        let joined = store.create_group(&[b, c.clone()]).unwrap();
        assert_eq!(g, joined);
        assert_eq!(store.group_members(&g).len(), 3);
        assert_eq!(store.get(&c).unwrap().group_id.as_deref(), Some(g.as_str()));
    }

    #[test]
    fn test_move_group_translates_members_and_box() {
        let (mut store, a, b, _) = store_with_items();
        let g = store.create_group(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(store.group(&g).unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(store.group_bounds(&g).unwrap(), Rect::new(0.0, 0.0, 300.0, 100.0));

        assert!(store.move_group(&g, 10.0, -5.0));
        assert_eq!(store.get(&a).unwrap().position, Point::new(10.0, -5.0));
        assert_eq!(store.get(&b).unwrap().position, Point::new(210.0, -5.0));
        assert_eq!(store.group(&g).unwrap().position, Point::new(10.0, -5.0));
        assert_eq!(store.group_bounds(&g).unwrap(), Rect::new(10.0, -5.0, 310.0, 95.0));

        store.set_group_locked(&g, true);
        assert!(!store.move_group(&g, 10.0, 10.0));
        assert_eq!(store.get(&a).unwrap().position, Point::new(10.0, -5.0));
    }

    #[test]
    fn test_ungroup_and_prune() {
        let (mut store, a, b, c) = store_with_items();
        let g = store.create_group(&[a.clone(), b.clone()]).unwrap();
        assert!(store.ungroup(&g));
        assert!(store.groups().is_empty());
        assert!(store.get(&a).unwrap().group_id.is_none());

        let g = store.create_group(&[a.clone(), c.clone()]).unwrap();
        store.remove(&c);
        assert!(store.group(&g).is_none());
        assert!(store.get(&a).unwrap().group_id.is_none());
    }

    #[test]
    fn test_duplicate_contract() {
        let (mut store, a, b, _) = store_with_items();
        let g = store.create_group(&[a.clone(), b.clone()]).unwrap();
        store.select_many([&b, &a]);
        let before_next = store.next_z_index();

        let copies = store.duplicate_selected();
        assert_eq!(copies.len(), 2);
        assert_eq!(store.selected_ids(), copies.as_slice());

        let copy_b = store.get(&copies[0]).unwrap();
        let copy_a = store.get(&copies[1]).unwrap();
        assert_ne!(copy_a.id, a);
        assert_eq!(copy_a.position, Point::new(20.0, 20.0));
        assert_eq!(copy_b.position, Point::new(220.0, 20.0));
        assert!(copy_a.group_id.is_none() && copy_b.group_id.is_none());
        // Contiguous and in the originals' relative order (a below b).
        assert_eq!(copy_a.z_index, before_next);
        assert_eq!(copy_b.z_index, before_next + 1);
        assert_eq!(store.group_members(&g).len(), 2);
    }

    #[test]
    fn test_duplicate_artboard_brings_children() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        let child = store.add(ItemDraft::component("c", 0).in_artboard(board.clone()));
        let copy = store.duplicate_item(&board).unwrap();
        let copied_children = store.children_of(&copy);
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0].id, child);
        assert_eq!(copied_children[0].order, Some(0));
        assert_eq!(store.children_of(&board).len(), 1);
    }

    #[test]
    fn test_duplicate_child_appends_to_parent() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        let child = store.add(ItemDraft::component("c", 0).in_artboard(board.clone()));
        let copy = store.duplicate_item(&child).unwrap();
        let copy = store.get(&copy).unwrap();
        assert_eq!(copy.parent_id.as_deref(), Some(board.as_str()));
        assert_eq!(copy.order, Some(1));
    }

    #[test]
    fn test_move_selected_skips_children() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A").at(0.0, 0.0));
        let child = store.add(ItemDraft::component("c", 0).at(5.0, 5.0).in_artboard(board.clone()));
        store.select_many([&board, &child]);
        store.move_selected(10.0, 10.0);
        assert_eq!(store.get(&board).unwrap().position, Point::new(10.0, 10.0));
        assert_eq!(store.get(&child).unwrap().position, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_set_parent_and_orders() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        let a = store.add(ItemDraft::component("a", 0));
        let b = store.add(ItemDraft::component("b", 0));
        assert!(store.set_parent(&a, Some(board.as_str())));
        assert!(store.set_parent(&b, Some(board.as_str())));
        assert_eq!(store.get(&a).unwrap().order, Some(0));
        assert_eq!(store.get(&b).unwrap().order, Some(1));
        assert!(!store.set_parent(&a, Some(board.as_str())));
        assert!(!store.set_parent(&board, Some(board.as_str())));
        assert!(!store.set_parent(&a, Some(b.as_str())));

        assert!(store.set_parent(&a, None));
        assert!(store.get(&a).unwrap().parent_id.is_none());
        assert!(store.get(&a).unwrap().order.is_none());
    }

    #[test]
    fn test_move_layer_swaps_orders() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        let ids: Vec<ItemId> = (0..3)
            .map(|i| store.add(ItemDraft::component(format!("c{i}"), 0).in_artboard(board.clone())))
            .collect();

        assert!(store.move_layer(&ids[2], LayerDirection::Up));
        let order: Vec<ItemId> = store.children_of(&board).iter().map(|c| c.id.clone()).collect();
        assert_eq!(order, vec![ids[0].clone(), ids[2].clone(), ids[1].clone()]);
        assert!(!store.move_layer(&ids[0], LayerDirection::Up));

        let mut orders: Vec<u32> = store.children_of(&board).iter().filter_map(|c| c.order).collect();
        orders.dedup();
        assert_eq!(orders.len(), 3);
    }

    #[test]
    fn test_from_json_normalizes_legacy_state() {
        let json = r#"{
            "items": [
                {"id": "old", "position": {"x": 0, "y": 0}, "size": {"width": 100, "height": 80},
                 "componentId": "hero", "zIndex": 7},
                {"id": "kid", "type": "embed", "url": "https://a.test",
                 "position": {"x": 0, "y": 0}, "size": {"width": 400, "height": 300},
                 "parentId": "nowhere", "order": 3}
            ],
            "selectedIds": ["old", "ghost"]
        }"#;
        let store = ItemStore::from_json(json).unwrap();
        assert_eq!(store.get("old").unwrap().item_type(), ItemType::Component);
        assert!(store.get("kid").unwrap().parent_id.is_none());
        assert!(store.groups().is_empty());
        assert_eq!(store.selected_ids(), &["old".to_string()]);
        assert_eq!(store.next_z_index(), 8);
    }

    #[test]
    fn test_json_roundtrip_preserves_state() {
        let (mut store, a, b, _) = store_with_items();
        store.create_group(&[a, b]);
        let json = store.to_json().unwrap();
        let restored = ItemStore::from_json(&json).unwrap();
        assert_eq!(restored.state(), store.state());
    }

    #[test]
    fn test_artboard_cannot_be_parented() {
        let mut store = ItemStore::new();
        let board = store.add(ItemDraft::artboard("A"));
        let nested = store.add(ItemDraft::artboard("B").in_artboard(board));
        let nested = store.get(&nested).unwrap();
        assert!(nested.parent_id.is_none());
        assert!(matches!(nested.kind, ItemKind::Artboard(_)));
    }
}
