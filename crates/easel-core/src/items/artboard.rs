//! Artboard container data and layout descriptor.

use serde::{Deserialize, Serialize};

/// Default artboard background colour.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
/// Default gap between laid-out children.
pub const DEFAULT_GAP: f64 = 16.0;
/// Default inner padding of an artboard.
pub const DEFAULT_PADDING: f64 = 24.0;
/// Column count used by grid artboards that do not declare one.
pub const DEFAULT_GRID_COLUMNS: u32 = 2;

/// How an artboard lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutDisplay {
    #[default]
    Flex,
    Grid,
}

/// Main axis of a flex artboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

/// Cross-axis alignment of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Main-axis distribution of children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
}

/// Layout rules applied to an artboard's children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtboardLayout {
    pub display: LayoutDisplay,
    pub direction: FlexDirection,
    pub align: Align,
    pub justify: Justify,
    pub gap: f64,
    pub padding: f64,
    /// Track count for grid layouts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
}

impl Default for ArtboardLayout {
    fn default() -> Self {
        Self {
            display: LayoutDisplay::Flex,
            direction: FlexDirection::Row,
            align: Align::Start,
            justify: Justify::Start,
            gap: DEFAULT_GAP,
            padding: DEFAULT_PADDING,
            columns: None,
        }
    }
}

impl ArtboardLayout {
    /// A flex layout along the given direction.
    pub fn flex(direction: FlexDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// A grid layout with the given number of columns.
    pub fn grid(columns: u32) -> Self {
        Self {
            display: LayoutDisplay::Grid,
            columns: Some(columns),
            ..Self::default()
        }
    }

    /// Effective column count (at least one).
    pub fn column_count(&self) -> usize {
        self.columns.unwrap_or(DEFAULT_GRID_COLUMNS).max(1) as usize
    }
}

/// Data carried by an artboard item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtboardData {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub layout: ArtboardLayout,
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

impl ArtboardData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: default_background(),
            theme_id: None,
            layout: ArtboardLayout::default(),
        }
    }

    /// Replace the layout descriptor.
    pub fn with_layout(mut self, layout: ArtboardLayout) -> Self {
        self.layout = layout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_defaults_from_empty_json() {
        let layout: ArtboardLayout = serde_json::from_str("{}").unwrap();
        assert_eq!(layout, ArtboardLayout::default());
        assert_eq!(layout.column_count(), DEFAULT_GRID_COLUMNS as usize);
    }

    #[test]
    fn test_justify_wire_names() {
        let json = serde_json::to_string(&Justify::SpaceBetween).unwrap();
        assert_eq!(json, "\"space-between\"");
    }

    #[test]
    fn test_zero_columns_is_one_track() {
        assert_eq!(ArtboardLayout::grid(0).column_count(), 1);
    }
}
