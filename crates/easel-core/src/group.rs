//! Item groups.
//!
//! A group is a tag shared by two or more items through their `group_id`.
//! It owns no items; membership is found by scanning the store.

use crate::items::{CanvasItem, GroupId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Outline colours assigned to new groups in rotation.
pub const GROUP_PALETTE: [&str; 6] = [
    "#6366f1", "#f59e0b", "#10b981", "#ef4444", "#0ea5e9", "#d946ef",
];

/// A named group of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasGroup {
    pub id: GroupId,
    pub name: String,
    /// Top-left of the members' bounding box when it was last computed.
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    GROUP_PALETTE[0].to_string()
}

impl CanvasGroup {
    /// Create a group; `index` picks the palette colour and default name.
    pub fn new(id: GroupId, index: usize) -> Self {
        Self {
            id,
            name: format!("Group {}", index + 1),
            position: Point::ZERO,
            is_locked: false,
            color: GROUP_PALETTE[index % GROUP_PALETTE.len()].to_string(),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }
}

/// Union of the items' rectangles, ignoring rotation.
pub fn bounding_box<'a>(items: impl IntoIterator<Item = &'a CanvasItem>) -> Option<Rect> {
    items
        .into_iter()
        .map(CanvasItem::rect)
        .reduce(|acc, rect| acc.union(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{ComponentData, ItemKind};
    use kurbo::Size;

    fn item(x: f64, y: f64, w: f64, h: f64, rotation: f64) -> CanvasItem {
        CanvasItem {
            id: format!("{x}-{y}"),
            position: Point::new(x, y),
            size: Size::new(w, h),
            rotation,
            z_index: 0,
            group_id: None,
            parent_id: None,
            order: None,
            kind: ItemKind::Component(ComponentData::new("c", 0)),
        }
    }

    #[test]
    fn test_bounding_box_ignores_rotation() {
        let items = [item(0.0, 0.0, 100.0, 50.0, 45.0), item(200.0, 100.0, 50.0, 50.0, 0.0)];
        let bounds = bounding_box(&items).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 250.0, 150.0));
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box(std::iter::empty()).is_none());
    }

    #[test]
    fn test_palette_cycles() {
        let first = CanvasGroup::new("g1".into(), 0);
        let wrapped = CanvasGroup::new("g7".into(), GROUP_PALETTE.len());
        assert_eq!(first.color, wrapped.color);
        assert_eq!(first.name, "Group 1");
    }
}
