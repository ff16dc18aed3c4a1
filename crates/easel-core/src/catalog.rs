//! Contract with the component catalog that feeds drag-in drops and rendering.

use crate::items::{ComponentData, ItemKind};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declared footprint of a catalog component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeCategory {
    /// Buttons, badges, inputs.
    Small,
    #[default]
    Medium,
    /// Cards, forms, tables.
    Large,
    /// Headers, heroes and other page-wide sections.
    FullWidth,
}

impl SizeCategory {
    /// Default item size for a freshly dropped component.
    pub fn default_size(self) -> Size {
        match self {
            SizeCategory::Small => Size::new(160.0, 64.0),
            SizeCategory::Medium => Size::new(320.0, 200.0),
            SizeCategory::Large => Size::new(480.0, 360.0),
            SizeCategory::FullWidth => Size::new(960.0, 240.0),
        }
    }
}

/// One renderable variant of a catalog component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantInfo {
    pub name: String,
    #[serde(default)]
    pub size: SizeCategory,
}

impl VariantInfo {
    pub fn new(name: impl Into<String>, size: SizeCategory) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Payload of a drag from the catalog onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDrop {
    pub component_id: String,
    #[serde(default)]
    pub variant_index: usize,
}

/// Lookup into the external component catalog.
pub trait ComponentCatalog {
    /// Variant metadata, or `None` if the component or variant no longer exists.
    fn variant(&self, component_id: &str, variant_index: usize) -> Option<VariantInfo>;
}

/// Why an item cannot render its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    MissingComponent { component_id: String },
    MissingVariant { component_id: String, variant_index: usize },
}

impl Placeholder {
    pub fn message(&self) -> String {
        match self {
            Placeholder::MissingComponent { component_id } => {
                format!("Component \"{component_id}\" is not in the catalog")
            }
            Placeholder::MissingVariant {
                component_id,
                variant_index,
            } => format!("Component \"{component_id}\" has no variant {variant_index}"),
        }
    }
}

/// What the renderer should draw for an item's content.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedContent {
    Component(VariantInfo),
    Embed,
    Artboard,
    Placeholder(Placeholder),
}

impl ResolvedContent {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ResolvedContent::Placeholder(_))
    }
}

/// Resolve an item payload against the catalog. Dangling references become placeholders.
pub fn resolve_content(catalog: &dyn ComponentCatalog, kind: &ItemKind) -> ResolvedContent {
    match kind {
        ItemKind::Component(ComponentData {
            component_id,
            variant_index,
            ..
        }) => match catalog.variant(component_id, *variant_index) {
            Some(info) => ResolvedContent::Component(info),
            None if catalog.variant(component_id, 0).is_some() => {
                ResolvedContent::Placeholder(Placeholder::MissingVariant {
                    component_id: component_id.clone(),
                    variant_index: *variant_index,
                })
            }
            None => ResolvedContent::Placeholder(Placeholder::MissingComponent {
                component_id: component_id.clone(),
            }),
        },
        ItemKind::Embed(_) => ResolvedContent::Embed,
        ItemKind::Artboard(_) => ResolvedContent::Artboard,
    }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    components: HashMap<String, Vec<VariantInfo>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(
        mut self,
        component_id: impl Into<String>,
        variants: Vec<VariantInfo>,
    ) -> Self {
        self.insert(component_id, variants);
        self
    }

    pub fn insert(&mut self, component_id: impl Into<String>, variants: Vec<VariantInfo>) {
        self.components.insert(component_id.into(), variants);
    }

    pub fn remove(&mut self, component_id: &str) {
        self.components.remove(component_id);
    }
}

impl ComponentCatalog for StaticCatalog {
    fn variant(&self, component_id: &str, variant_index: usize) -> Option<VariantInfo> {
        self.components
            .get(component_id)
            .and_then(|variants| variants.get(variant_index))
            .cloned()
    }
}
