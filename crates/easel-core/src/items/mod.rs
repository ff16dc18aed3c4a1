//! Canvas item definitions.
//!
//! Every item shares a common base (id, geometry, stacking, grouping and
//! containment) and carries exactly one variant payload in [`ItemKind`].

mod artboard;
mod embed;

pub use artboard::{
    Align, ArtboardData, ArtboardLayout, FlexDirection, Justify, LayoutDisplay, DEFAULT_BACKGROUND,
    DEFAULT_GAP, DEFAULT_GRID_COLUMNS, DEFAULT_PADDING,
};
pub use embed::{EmbedData, EmbedDisplay, EmbedPreview, FramePolicy, PreviewStatus};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque item identifier.
pub type ItemId = String;
/// Opaque group identifier.
pub type GroupId = String;

/// Mint a fresh identifier for an item, group or scene.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Minimum size of a component item.
pub const MIN_COMPONENT_SIZE: Size = Size::new(40.0, 40.0);
/// Minimum size of an embed item.
pub const MIN_EMBED_SIZE: Size = Size::new(160.0, 120.0);
/// Minimum size of an artboard.
pub const MIN_ARTBOARD_SIZE: Size = Size::new(200.0, 150.0);

/// Variant discriminator without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Component,
    Embed,
    Artboard,
}

impl ItemType {
    /// Smallest size an item of this type may be resized to.
    pub fn min_size(self) -> Size {
        match self {
            ItemType::Component => MIN_COMPONENT_SIZE,
            ItemType::Embed => MIN_EMBED_SIZE,
            ItemType::Artboard => MIN_ARTBOARD_SIZE,
        }
    }

    /// Wire name used in the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Component => "component",
            ItemType::Embed => "embed",
            ItemType::Artboard => "artboard",
        }
    }
}

/// Data carried by a component item: a reference into the external catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentData {
    pub component_id: String,
    #[serde(default)]
    pub variant_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_props: Option<Map<String, Value>>,
}

impl ComponentData {
    pub fn new(component_id: impl Into<String>, variant_index: usize) -> Self {
        Self {
            component_id: component_id.into(),
            variant_index,
            custom_props: None,
        }
    }
}

/// Variant payload of a canvas item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Component(ComponentData),
    Embed(EmbedData),
    Artboard(ArtboardData),
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Component(_) => ItemType::Component,
            ItemKind::Embed(_) => ItemType::Embed,
            ItemKind::Artboard(_) => ItemType::Artboard,
        }
    }
}

/// A single item placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasItem {
    pub id: ItemId,
    /// Top-left corner in canvas space. Unused while parented.
    pub position: Point,
    pub size: Size,
    /// Rotation in degrees around the centre.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub z_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    /// Artboard this item is laid out in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
    /// Sibling sequence inside the parent artboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(flatten)]
    pub kind: ItemKind,
}

impl CanvasItem {
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn is_artboard(&self) -> bool {
        matches!(self.kind, ItemKind::Artboard(_))
    }

    /// True when the item sits directly on the canvas rather than inside an artboard.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn min_size(&self) -> Size {
        self.item_type().min_size()
    }

    /// Axis-aligned rectangle ignoring rotation.
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Rotation normalized to `[0, 360)` for display.
    pub fn display_rotation(&self) -> f64 {
        self.rotation.rem_euclid(360.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Geometry snapshot used as a gesture origin.
    pub fn frame(&self) -> ItemFrame {
        ItemFrame {
            position: self.position,
            size: self.size,
            rotation: self.rotation,
        }
    }
}

/// Clamp a size so neither side drops below `min`.
pub fn clamp_size(size: Size, min: Size) -> Size {
    Size::new(size.width.max(min.width), size.height.max(min.height))
}

/// Position, size and rotation of an item at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemFrame {
    pub position: Point,
    pub size: Size,
    pub rotation: f64,
}

impl ItemFrame {
    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Input for [`crate::store::ItemStore::add`]: an item without id or z-index.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub position: Point,
    pub size: Size,
    pub rotation: f64,
    pub parent_id: Option<ItemId>,
    pub kind: ItemKind,
}

impl ItemDraft {
    pub fn new(kind: ItemKind) -> Self {
        let size = match kind.item_type() {
            ItemType::Component => Size::new(240.0, 160.0),
            ItemType::Embed => Size::new(480.0, 320.0),
            ItemType::Artboard => Size::new(800.0, 600.0),
        };
        Self {
            position: Point::ZERO,
            size,
            rotation: 0.0,
            parent_id: None,
            kind,
        }
    }

    pub fn component(component_id: impl Into<String>, variant_index: usize) -> Self {
        Self::new(ItemKind::Component(ComponentData::new(component_id, variant_index)))
    }

    pub fn embed(url: impl Into<String>) -> Self {
        Self::new(ItemKind::Embed(EmbedData::new(url)))
    }

    pub fn artboard(name: impl Into<String>) -> Self {
        Self::new(ItemKind::Artboard(ArtboardData::new(name)))
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.size = Size::new(width, height);
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Place the new item inside an artboard.
    pub fn in_artboard(mut self, parent_id: impl Into<ItemId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Partial update applied by [`crate::store::ItemStore::update`].
///
/// Grouping and containment are not patchable; they go through the
/// dedicated store operations so their invariants hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    /// Replacement payload; ignored unless it matches the item's variant.
    pub kind: Option<ItemKind>,
}

impl ItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.size.is_none() && self.rotation.is_none() && self.kind.is_none()
    }

    /// Apply the patch in place. Returns true if anything changed.
    pub(crate) fn apply(self, item: &mut CanvasItem) -> bool {
        let before = item.clone();
        if let Some(position) = self.position {
            item.position = position;
        }
        if let Some(size) = self.size {
            item.size = clamp_size(size, item.min_size());
        }
        if let Some(rotation) = self.rotation {
            item.rotation = rotation;
        }
        if let Some(kind) = self.kind {
            if kind.item_type() == item.item_type() {
                item.kind = kind;
            } else {
                log::warn!(
                    "Ignoring {} payload for {} item {}",
                    kind.item_type().as_str(),
                    item.item_type().as_str(),
                    item.id
                );
            }
        }
        *item != before
    }
}

/// Insert the default `component` tag into a raw item that lacks one.
///
/// Older persisted canvases predate the `type` discriminator.
pub fn normalize_item_value(item: &mut Value) {
    if let Some(obj) = item.as_object_mut() {
        let has_type = obj.get("type").map(|t| t.is_string()).unwrap_or(false);
        if !has_type {
            obj.insert(
                "type".to_string(),
                Value::String(ItemType::Component.as_str().to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component_item() -> CanvasItem {
        CanvasItem {
            id: "a".to_string(),
            position: Point::new(10.0, 20.0),
            size: Size::new(100.0, 50.0),
            rotation: 0.0,
            z_index: 1,
            group_id: None,
            parent_id: None,
            order: None,
            kind: ItemKind::Component(ComponentData::new("button", 2)),
        }
    }

    #[test]
    fn test_item_wire_format() {
        let value = serde_json::to_value(component_item()).unwrap();
        assert_eq!(value["type"], "component");
        assert_eq!(value["componentId"], "button");
        assert_eq!(value["variantIndex"], 2);
        assert_eq!(value["zIndex"], 1);
        assert_eq!(value["position"]["x"], 10.0);
        assert_eq!(value["size"]["height"], 50.0);
        assert!(value.get("parentId").is_none());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let item: CanvasItem = serde_json::from_value(json!({
            "id": "x",
            "type": "artboard",
            "position": {"x": 0.0, "y": 0.0},
            "size": {"width": 400.0, "height": 300.0},
            "name": "Home",
            "futureField": {"nested": true}
        }))
        .unwrap();
        assert!(item.is_artboard());
        assert_eq!(item.z_index, 0);
    }

    #[test]
    fn test_normalize_missing_type() {
        let mut raw = json!({
            "id": "legacy",
            "position": {"x": 0.0, "y": 0.0},
            "size": {"width": 100.0, "height": 100.0},
            "componentId": "card"
        });
        normalize_item_value(&mut raw);
        let item: CanvasItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.item_type(), ItemType::Component);
    }

    #[test]
    fn test_patch_clamps_size() {
        let mut item = component_item();
        let changed = ItemPatch::new().size(Size::new(1.0, 500.0)).apply(&mut item);
        assert!(changed);
        assert_eq!(item.size, Size::new(MIN_COMPONENT_SIZE.width, 500.0));
    }

    #[test]
    fn test_patch_rejects_foreign_variant() {
        let mut item = component_item();
        let changed = ItemPatch::new()
            .kind(ItemKind::Artboard(ArtboardData::new("nope")))
            .apply(&mut item);
        assert!(!changed);
        assert_eq!(item.item_type(), ItemType::Component);
    }

    #[test]
    fn test_display_rotation() {
        let mut item = component_item();
        item.rotation = -90.0;
        assert!((item.display_rotation() - 270.0).abs() < 1e-9);
        item.rotation = 725.0;
        assert!((item.display_rotation() - 5.0).abs() < 1e-9);
    }
}
