//! Easel Core Library
//!
//! Platform-agnostic item model, view transform, pointer interaction and
//! scene persistence for the Easel design canvas.

pub mod catalog;
pub mod composition;
pub mod embed;
pub mod group;
pub mod handles;
pub mod input;
pub mod interaction;
pub mod items;
pub mod layout;
pub mod scene;
pub mod settings;
pub mod shortcuts;
pub mod storage;
pub mod store;
pub mod transform;

pub use catalog::{CatalogDrop, ComponentCatalog, Placeholder, ResolvedContent, SizeCategory, StaticCatalog, VariantInfo};
pub use composition::{Canvas, RenderNode};
pub use embed::{EmbedSync, OutboundMessage, ReplyOutcome};
pub use group::CanvasGroup;
pub use handles::{HandleKind, ResizeHandle};
pub use input::{Key, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerTarget, WheelEvent};
pub use interaction::{ContextAction, ContextMenu, Gesture, GestureOutcome, InteractionController};
pub use items::{CanvasItem, ItemDraft, ItemFrame, ItemId, ItemKind, ItemPatch, ItemType};
pub use scene::{CanvasScene, SceneError, SceneStore};
pub use settings::Settings;
pub use shortcuts::{Command, ShortcutRegistry};
pub use storage::{AutoSaveManager, MemoryBackend, StorageBackend, StorageError};
pub use store::{CanvasState, ItemStore, LayerDirection};
pub use transform::{CanvasTransform, TransformController};
