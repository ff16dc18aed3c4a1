//! Canvas composition: the item store, view transform and interaction
//! controller wired together behind one event-facing type.
//!
//! Besides routing input, the canvas owns artboard containment (which
//! artboard an item lands in after a drag), catalog drops, hit testing and
//! the paint-ordered render plan.

use crate::catalog::{resolve_content, CatalogDrop, ComponentCatalog, ResolvedContent, SizeCategory};
use crate::embed::{EmbedSync, OutboundMessage, ReplyOutcome};
use crate::handles::{frame_contains, hit_test_handles};
use crate::input::{KeyEvent, PointerEvent, PointerTarget, WheelEvent};
use crate::interaction::{ContextAction, ContextMenu, GestureOutcome, InteractionController};
use crate::items::{CanvasItem, ComponentData, ItemDraft, ItemFrame, ItemId, ItemKind, ItemPatch};
use crate::layout::{content_size, resolve_frame};
use crate::settings::Settings;
use crate::shortcuts::Command;
use crate::store::ItemStore;
use crate::transform::TransformController;
use kurbo::{Point, Rect, Size};
use serde_json::Value;
use std::collections::HashSet;

/// Default viewport until the host reports one.
pub const DEFAULT_VIEWPORT: Size = Size::new(800.0, 600.0);

/// One item to paint, in back-to-front order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub item_id: ItemId,
    /// Resolved geometry in canvas space (layout slot for parented items).
    pub frame: ItemFrame,
    pub z_index: u64,
    pub parent_id: Option<ItemId>,
    pub content: ResolvedContent,
    pub selected: bool,
}

/// The interactive canvas.
pub struct Canvas {
    pub store: ItemStore,
    pub transform: TransformController,
    pub interaction: InteractionController,
    pub embeds: EmbedSync,
    pub viewport_size: Size,
    settings: Settings,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = ItemStore::new().with_duplicate_offset(settings.duplicate_offset);
        Self::with_store(store, settings)
    }

    /// Wrap an existing store, e.g. one restored by auto-save.
    pub fn with_store(store: ItemStore, settings: Settings) -> Self {
        Self {
            store,
            transform: TransformController::with_settings(&settings.zoom),
            interaction: InteractionController::with_settings(settings.interaction.clone()),
            embeds: EmbedSync::new(),
            viewport_size: DEFAULT_VIEWPORT,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    fn viewport_center(&self) -> Point {
        Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0)
    }

    pub fn set_interact_mode(&mut self, enabled: bool) {
        self.interaction.set_interact_mode(enabled);
    }

    // --- pointer ---

    pub fn pointer_down(&mut self, event: &PointerEvent) -> Option<ContextMenu> {
        let target = self.hit_test(event.position);
        self.interaction
            .pointer_down(&mut self.store, &self.transform, event, target)
    }

    pub fn pointer_move(&mut self, event: &PointerEvent) {
        self.interaction
            .pointer_move(&mut self.store, &mut self.transform, event);
    }

    /// Finish the gesture. A finished drag re-evaluates artboard containment.
    pub fn pointer_up(&mut self, event: &PointerEvent) -> GestureOutcome {
        let outcome = self
            .interaction
            .pointer_up(&mut self.store, &self.transform, event);
        if let GestureOutcome::Moved { item_id, drop_point } = &outcome {
            self.apply_drop(item_id, *drop_point);
        }
        outcome
    }

    pub fn pointer_capture_lost(&mut self) {
        self.interaction.pointer_capture_lost();
    }

    /// Scroll or pinch. Ignored in interact mode, where content owns the wheel.
    pub fn wheel(&mut self, event: &WheelEvent) {
        if self.interaction.interact_mode() {
            return;
        }
        self.transform.apply_wheel(event);
    }

    // --- keyboard ---

    /// Handle a key press and run the bound command. Returns the command run.
    pub fn key_down(&mut self, event: &KeyEvent) -> Option<Command> {
        let was_idle = self.interaction.gesture().is_idle();
        let command = self.interaction.key_down(event)?;
        self.run_command(command, was_idle);
        Some(command)
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        self.interaction.key_up(event);
    }

    fn run_command(&mut self, command: Command, was_idle: bool) {
        log::debug!("Running command {:?}", command);
        match command {
            Command::SelectAll => self.store.select_all(),
            Command::DeleteSelected => {
                let removed = self.store.remove_selected();
                for id in &removed {
                    self.embeds.forget(id);
                }
            }
            Command::DuplicateSelected => {
                self.store.duplicate_selected();
            }
            Command::Group => {
                let ids = self.store.selected_ids().to_vec();
                self.store.create_group(&ids);
            }
            Command::Ungroup => {
                let groups: HashSet<String> = self
                    .store
                    .selected_items()
                    .into_iter()
                    .filter_map(|item| item.group_id.clone())
                    .collect();
                for group_id in groups {
                    self.store.ungroup(&group_id);
                }
            }
            // Escape aborts a gesture first; only a second press clears the selection.
            Command::Cancel => {
                if was_idle {
                    self.store.clear_selection();
                }
            }
            Command::Nudge { direction, large } => {
                let step = if large {
                    self.settings.interaction.nudge_step_large
                } else {
                    self.settings.interaction.nudge_step
                };
                let (x, y) = direction.unit();
                self.store.move_selected(x * step, y * step);
            }
            Command::ZoomIn => {
                let center = self.viewport_center();
                self.transform.zoom_in(Some(center));
            }
            Command::ZoomOut => {
                let center = self.viewport_center();
                self.transform.zoom_out(Some(center));
            }
            Command::ResetZoom => self.transform.reset_zoom(),
        }
    }

    // --- containment ---

    /// Topmost artboard whose frame contains a canvas point.
    pub fn artboard_at(&self, point: Point, exclude: Option<&str>) -> Option<&CanvasItem> {
        self.store
            .items_by_z()
            .into_iter()
            .rev()
            .filter(|item| item.is_artboard() && Some(item.id.as_str()) != exclude)
            .find(|item| frame_contains(item.frame(), point))
    }

    /// Re-parent a dropped item: into the artboard under the drop point, or
    /// onto the open canvas. Artboards never nest. Returns true if it changed.
    pub fn apply_drop(&mut self, item_id: &str, drop_point: Point) -> bool {
        let Some(item) = self.store.get(item_id) else {
            return false;
        };
        if item.is_artboard() {
            return false;
        }
        let target = self
            .artboard_at(drop_point, Some(item_id))
            .map(|artboard| artboard.id.clone());
        let changed = self.store.set_parent(item_id, target.as_deref());
        if changed {
            match &target {
                Some(parent) => log::debug!("Item {} moved into artboard {}", item_id, parent),
                None => log::debug!("Item {} moved onto the canvas", item_id),
            }
        }
        changed
    }

    // --- catalog ---

    /// Place a component dragged in from the catalog, centred on the drop.
    ///
    /// The size comes from the variant's size category; unknown variants get
    /// the medium size and render as placeholders. Dropping over an artboard
    /// places the component inside it.
    pub fn drop_component(
        &mut self,
        drop: &CatalogDrop,
        screen_point: Point,
        catalog: &dyn ComponentCatalog,
    ) -> ItemId {
        let size = catalog
            .variant(&drop.component_id, drop.variant_index)
            .map(|info| info.size)
            .unwrap_or(SizeCategory::Medium)
            .default_size();
        let point = self.transform.screen_to_canvas(screen_point);
        let mut draft = ItemDraft::new(ItemKind::Component(ComponentData::new(
            drop.component_id.clone(),
            drop.variant_index,
        )))
        .at(point.x - size.width / 2.0, point.y - size.height / 2.0)
        .with_size(size.width, size.height);
        if let Some(artboard) = self.artboard_at(point, None) {
            draft = draft.in_artboard(artboard.id.clone());
        }
        let id = self.store.add(draft);
        log::debug!("Dropped component {} as {}", drop.component_id, id);
        id
    }

    // --- hit testing and painting ---

    /// Items back to front; each artboard is followed by its children.
    pub fn paint_order(&self) -> Vec<&CanvasItem> {
        let mut order = Vec::with_capacity(self.store.len());
        for item in self.store.items_by_z() {
            if !item.is_top_level() {
                continue;
            }
            order.push(item);
            if item.is_artboard() {
                order.extend(self.store.children_of(&item.id));
            }
        }
        order
    }

    /// What lies under a screen point: a handle of the single selected item,
    /// then the frontmost item, else the canvas.
    pub fn hit_test(&self, screen: Point) -> PointerTarget {
        let point = self.transform.screen_to_canvas(screen);
        let interaction = &self.settings.interaction;

        if let [selected] = self.store.selected_ids() {
            if let Some(frame) = resolve_frame(&self.store, selected) {
                if let Some(kind) = hit_test_handles(
                    frame,
                    point,
                    self.transform.scale(),
                    interaction.handle_hit_radius,
                    interaction.rotate_handle_offset,
                ) {
                    return PointerTarget::Handle(selected.clone(), kind);
                }
            }
        }

        self.paint_order()
            .into_iter()
            .rev()
            .find(|item| {
                resolve_frame(&self.store, &item.id)
                    .map(|frame| frame_contains(frame, point))
                    .unwrap_or(false)
            })
            .map(|item| PointerTarget::Item(item.id.clone()))
            .unwrap_or(PointerTarget::Canvas)
    }

    /// Paint-ordered nodes with content resolved against the catalog.
    pub fn render_plan(&self, catalog: &dyn ComponentCatalog) -> Vec<RenderNode> {
        self.paint_order()
            .into_iter()
            .filter_map(|item| {
                let frame = resolve_frame(&self.store, &item.id)?;
                Some(RenderNode {
                    item_id: item.id.clone(),
                    frame,
                    z_index: item.z_index,
                    parent_id: item.parent_id.clone(),
                    content: resolve_content(catalog, &item.kind),
                    selected: self.store.is_selected(&item.id),
                })
            })
            .collect()
    }

    /// Box-select rectangle in canvas space, while one is being dragged.
    pub fn selection_box(&self) -> Option<Rect> {
        self.interaction.selection_box()
    }

    // --- item actions ---

    /// Remove an item (and an artboard's children) and drop pending embed requests.
    pub fn remove(&mut self, id: &str) -> Vec<ItemId> {
        let removed = self.store.remove(id);
        for removed_id in &removed {
            self.embeds.forget(removed_id);
        }
        removed
    }

    /// Resize an item to its content.
    ///
    /// Artboards fit their laid-out children. Other items need the size the
    /// host measured for their rendered content.
    pub fn fit_to_content(&mut self, id: &str, measured: Option<Size>) -> bool {
        let Some(item) = self.store.get(id) else {
            return false;
        };
        let size = match &item.kind {
            ItemKind::Artboard(data) => {
                let children = self.store.children_of(id);
                if children.is_empty() {
                    return false;
                }
                content_size(&data.layout, &children)
            }
            _ => match measured {
                Some(size) => size,
                None => return false,
            },
        };
        let before = self.store.revision();
        self.store.update(id, ItemPatch::new().size(size));
        self.store.revision() != before
    }

    /// Run a context menu action. Returns true if anything changed.
    pub fn apply_context_action(
        &mut self,
        id: &str,
        action: ContextAction,
        measured: Option<Size>,
    ) -> bool {
        match action {
            ContextAction::FitToContent => self.fit_to_content(id, measured),
            ContextAction::BringToFront => self.store.bring_to_front(id),
            ContextAction::Duplicate => self.store.duplicate_item(id).is_some(),
            ContextAction::Delete => !self.remove(id).is_empty(),
        }
    }

    /// Frame every top-level item in the viewport.
    pub fn fit_to_view(&mut self) {
        self.transform.fit_to_view(
            self.store.top_level_items(),
            self.viewport_size,
            self.settings.fit_padding,
        );
    }

    // --- embeds ---

    /// Ask every embed for its current state.
    pub fn request_embed_states(&mut self) -> Vec<OutboundMessage> {
        self.embeds.request_all(&self.store)
    }

    pub fn set_embed_state(&mut self, id: &str, payload: Value) -> Option<OutboundMessage> {
        self.embeds.set_state(&mut self.store, id, payload)
    }

    /// Route a message posted by the page inside an embed.
    pub fn receive_embed_message(&mut self, id: &str, origin: &str, data: &Value) -> ReplyOutcome {
        self.embeds.handle_message(&mut self.store, id, origin, data)
    }
}
