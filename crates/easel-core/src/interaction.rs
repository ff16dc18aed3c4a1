//! Pointer interaction state machine.
//!
//! The current gesture is a single [`Gesture`] value, so dragging, resizing,
//! rotating, box-selecting and panning are mutually exclusive by construction.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Dragging      (primary down on an item)
//! Idle -> Resizing      (primary down on a resize handle)
//! Idle -> Rotating      (primary down on the rotate handle)
//! Idle -> BoxSelecting  (primary down on empty canvas)
//! Idle -> Panning       (middle down, or primary down while Space is held)
//!
//! Any -> Idle           (pointer up, Escape, lost capture, interact mode)
//! ```

use crate::handles::{resize_frame, rotation_angle, snap_angle, HandleKind, ResizeHandle};
use crate::input::{Key, KeyEvent, PointerButton, PointerEvent, PointerTarget};
use crate::items::{ItemFrame, ItemId, ItemPatch};
use crate::layout::resolve_frame;
use crate::settings::InteractionSettings;
use crate::shortcuts::{Command, ShortcutRegistry};
use crate::store::ItemStore;
use crate::transform::TransformController;
use kurbo::{Point, Rect};

/// The gesture in progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        item_id: ItemId,
        /// Screen position at pointer down.
        start_pointer: Point,
        origin: ItemFrame,
        /// Other members of the item's group with their start positions.
        companions: Vec<(ItemId, Point)>,
        /// False when the item belongs to a locked group.
        movable: bool,
        moved: bool,
    },
    Resizing {
        item_id: ItemId,
        handle: ResizeHandle,
        start_pointer: Point,
        origin: ItemFrame,
    },
    Rotating {
        item_id: ItemId,
        origin: ItemFrame,
    },
    BoxSelecting {
        /// Canvas-space anchor.
        start: Point,
        /// Canvas-space moving corner.
        current: Point,
        start_screen: Point,
        additive: bool,
    },
    Panning {
        last_pointer: Point,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::Idle => "idle",
            Gesture::Dragging { .. } => "dragging",
            Gesture::Resizing { .. } => "resizing",
            Gesture::Rotating { .. } => "rotating",
            Gesture::BoxSelecting { .. } => "box-selecting",
            Gesture::Panning { .. } => "panning",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Item being manipulated, if any.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Gesture::Dragging { item_id, .. }
            | Gesture::Resizing { item_id, .. }
            | Gesture::Rotating { item_id, .. } => Some(item_id),
            _ => None,
        }
    }
}

/// What a finished gesture did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    None,
    /// An item was dragged and released at `drop_point` (canvas space).
    Moved { item_id: ItemId, drop_point: Point },
    /// An item was pressed and released without moving.
    Clicked(ItemId),
    Resized(ItemId),
    Rotated(ItemId),
    /// Box selection completed with these hits.
    BoxSelected(Vec<ItemId>),
    /// Click on empty canvas.
    CanvasClicked,
    Panned,
}

/// Entries of the item context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    FitToContent,
    BringToFront,
    Duplicate,
    Delete,
}

impl ContextAction {
    pub const ALL: [ContextAction; 4] = [
        ContextAction::FitToContent,
        ContextAction::BringToFront,
        ContextAction::Duplicate,
        ContextAction::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContextAction::FitToContent => "Fit to content",
            ContextAction::BringToFront => "Bring to front",
            ContextAction::Duplicate => "Duplicate",
            ContextAction::Delete => "Delete",
        }
    }
}

/// Context menu request raised by a secondary click on an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub item_id: ItemId,
    /// Screen position to open at.
    pub position: Point,
    pub actions: Vec<ContextAction>,
}

/// Drives gestures from pointer and keyboard input.
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    gesture: Gesture,
    interact_mode: bool,
    space_held: bool,
    settings: InteractionSettings,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: InteractionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn interact_mode(&self) -> bool {
        self.interact_mode
    }

    pub fn space_held(&self) -> bool {
        self.space_held
    }

    /// Box-select rectangle in canvas space while one is being dragged.
    pub fn selection_box(&self) -> Option<Rect> {
        match &self.gesture {
            Gesture::BoxSelecting { start, current, .. } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }

    fn set_gesture(&mut self, gesture: Gesture) {
        if self.gesture.name() != gesture.name() {
            log::debug!("Gesture: {} -> {}", self.gesture.name(), gesture.name());
        }
        self.gesture = gesture;
    }

    /// Toggle interact mode. Any gesture in progress is dropped.
    pub fn set_interact_mode(&mut self, enabled: bool) {
        self.interact_mode = enabled;
        self.set_gesture(Gesture::Idle);
    }

    /// Abandon the current gesture. Updates already committed stay.
    pub fn cancel(&mut self) {
        self.set_gesture(Gesture::Idle);
    }

    /// Pointer capture was lost mid-gesture.
    pub fn pointer_capture_lost(&mut self) {
        self.cancel();
    }

    /// Start a gesture. A secondary click on an item returns a context menu.
    pub fn pointer_down(
        &mut self,
        store: &mut ItemStore,
        transform: &TransformController,
        event: &PointerEvent,
        target: PointerTarget,
    ) -> Option<ContextMenu> {
        if self.interact_mode || !self.gesture.is_idle() {
            return None;
        }

        let target = match target {
            PointerTarget::Item(id) | PointerTarget::Handle(id, _) if !store.contains(&id) => {
                PointerTarget::Canvas
            }
            other => other,
        };

        match event.button {
            PointerButton::Middle => {
                self.start_panning(event.position);
                None
            }
            PointerButton::Primary if self.space_held => {
                self.start_panning(event.position);
                None
            }
            PointerButton::Secondary => match target {
                PointerTarget::Item(id) | PointerTarget::Handle(id, _) => {
                    if !store.is_selected(&id) {
                        store.select(&id);
                    }
                    Some(ContextMenu {
                        item_id: id,
                        position: event.position,
                        actions: ContextAction::ALL.to_vec(),
                    })
                }
                PointerTarget::Canvas => None,
            },
            PointerButton::Primary => {
                match target {
                    PointerTarget::Handle(id, HandleKind::Resize(handle)) => {
                        if let Some(origin) = resolve_frame(store, &id) {
                            self.set_gesture(Gesture::Resizing {
                                item_id: id,
                                handle,
                                start_pointer: event.position,
                                origin,
                            });
                        }
                    }
                    PointerTarget::Handle(id, HandleKind::Rotate) => {
                        if let Some(origin) = resolve_frame(store, &id) {
                            self.set_gesture(Gesture::Rotating { item_id: id, origin });
                        }
                    }
                    PointerTarget::Item(id) => self.start_dragging(store, event, id),
                    PointerTarget::Canvas => {
                        let start = transform.screen_to_canvas(event.position);
                        self.set_gesture(Gesture::BoxSelecting {
                            start,
                            current: start,
                            start_screen: event.position,
                            additive: event.modifiers.shift,
                        });
                    }
                }
                None
            }
        }
    }

    fn start_panning(&mut self, position: Point) {
        self.set_gesture(Gesture::Panning {
            last_pointer: position,
        });
    }

    fn start_dragging(&mut self, store: &mut ItemStore, event: &PointerEvent, id: ItemId) {
        if event.modifiers.shift {
            store.add_to_selection(&id);
        } else {
            store.select(&id);
        }
        let Some(origin) = resolve_frame(store, &id) else {
            return;
        };

        let group = store
            .get(&id)
            .and_then(|item| item.group_id.as_deref())
            .and_then(|group_id| store.group(group_id));
        let movable = group.map(|g| !g.is_locked).unwrap_or(true);
        let companions = match group {
            Some(g) if movable => store
                .group_members(&g.id)
                .into_iter()
                .filter(|member| member.id != id && member.is_top_level())
                .map(|member| (member.id.clone(), member.position))
                .collect(),
            _ => Vec::new(),
        };

        self.set_gesture(Gesture::Dragging {
            item_id: id,
            start_pointer: event.position,
            origin,
            companions,
            movable,
            moved: false,
        });
    }

    /// Advance the current gesture.
    pub fn pointer_move(
        &mut self,
        store: &mut ItemStore,
        transform: &mut TransformController,
        event: &PointerEvent,
    ) {
        let view = transform.transform();
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Dragging {
                item_id,
                start_pointer,
                origin,
                companions,
                movable,
                moved,
            } => {
                if !*movable {
                    return;
                }
                let delta = view.screen_delta_to_canvas(event.position - *start_pointer);
                store.update(item_id.as_str(), ItemPatch::new().position(origin.position + delta));
                for (member, start) in companions.iter() {
                    store.update(member, ItemPatch::new().position(*start + delta));
                }
                *moved = true;
            }
            Gesture::Resizing {
                item_id,
                handle,
                start_pointer,
                origin,
            } => {
                let Some(min) = store.get(item_id).map(|item| item.min_size()) else {
                    return;
                };
                let delta = view.screen_delta_to_canvas(event.position - *start_pointer);
                let frame = resize_frame(*origin, *handle, delta, min);
                store.update(
                    item_id.as_str(),
                    ItemPatch::new().position(frame.position).size(frame.size),
                );
            }
            Gesture::Rotating { item_id, origin } => {
                let pointer = view.screen_to_canvas(event.position);
                let mut angle = rotation_angle(origin.center(), pointer);
                if event.modifiers.shift {
                    angle = snap_angle(angle, self.settings.rotation_snap_degrees);
                }
                store.update(item_id.as_str(), ItemPatch::new().rotation(angle));
            }
            Gesture::BoxSelecting { current, .. } => {
                *current = view.screen_to_canvas(event.position);
            }
            Gesture::Panning { last_pointer } => {
                let delta = event.position - *last_pointer;
                transform.pan(delta.x, delta.y);
                *last_pointer = event.position;
            }
        }
    }

    /// Finish the current gesture and return to `Idle`.
    pub fn pointer_up(
        &mut self,
        store: &mut ItemStore,
        transform: &TransformController,
        event: &PointerEvent,
    ) -> GestureOutcome {
        let gesture = std::mem::take(&mut self.gesture);
        if !gesture.is_idle() {
            log::debug!("Gesture: {} -> idle", gesture.name());
        }
        match gesture {
            Gesture::Idle => GestureOutcome::None,
            Gesture::Dragging {
                item_id,
                companions,
                moved,
                ..
            } => {
                if !moved {
                    return GestureOutcome::Clicked(item_id);
                }
                if !companions.is_empty() {
                    if let Some(group_id) = store.get(&item_id).and_then(|item| item.group_id.clone()) {
                        store.refresh_group_position(&group_id);
                    }
                }
                GestureOutcome::Moved {
                    item_id,
                    drop_point: transform.screen_to_canvas(event.position),
                }
            }
            Gesture::Resizing { item_id, .. } => GestureOutcome::Resized(item_id),
            Gesture::Rotating { item_id, .. } => GestureOutcome::Rotated(item_id),
            Gesture::BoxSelecting {
                start,
                start_screen,
                additive,
                ..
            } => {
                let additive = additive || event.modifiers.shift;
                let distance = (event.position - start_screen).hypot();
                if distance <= self.settings.box_select_threshold {
                    if !additive {
                        store.clear_selection();
                    }
                    return GestureOutcome::CanvasClicked;
                }
                let current = transform.screen_to_canvas(event.position);
                let hits = store.top_level_ids_in_rect(Rect::from_points(start, current));
                if additive {
                    let mut selection = store.selected_ids().to_vec();
                    selection.extend(hits.iter().cloned());
                    store.select_many(selection);
                } else {
                    store.select_many(hits.iter());
                }
                GestureOutcome::BoxSelected(hits)
            }
            Gesture::Panning { .. } => GestureOutcome::Panned,
        }
    }

    /// Handle a key press. Returns the command for the canvas to run, if any.
    pub fn key_down(&mut self, event: &KeyEvent) -> Option<Command> {
        match event.key {
            Key::Space => {
                self.space_held = true;
                None
            }
            Key::Escape => {
                self.cancel();
                Some(Command::Cancel)
            }
            _ if self.interact_mode => None,
            _ => ShortcutRegistry::lookup(event),
        }
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        if event.key == Key::Space {
            self.space_held = false;
        }
    }
}
