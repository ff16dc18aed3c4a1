//! Pan/zoom mapping between screen space and canvas space.

use crate::group::bounding_box;
use crate::input::WheelEvent;
use crate::items::CanvasItem;
use crate::settings::ZoomSettings;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed scale.
pub const MAX_SCALE: f64 = 4.0;
/// Zoom stops visited by zoom in/out.
pub const ZOOM_LEVELS: [f64; 10] = [0.1, 0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 3.0, 4.0];
/// Relative scale change per modified wheel tick.
pub const WHEEL_ZOOM_STEP: f64 = 0.15;

const LEVEL_EPSILON: f64 = 1e-9;

/// Current view transform: `screen = canvas * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasTransform {
    pub scale: f64,
    /// Screen-space translation.
    pub offset: Vec2,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl CanvasTransform {
    /// Canvas to screen.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen to canvas.
    pub fn inverse(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.inverse() * screen
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.affine() * canvas
    }

    /// Convert a screen-space movement into canvas units.
    pub fn screen_delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }
}

/// Owns the view transform and the rules for changing it.
#[derive(Debug, Clone)]
pub struct TransformController {
    transform: CanvasTransform,
    levels: Vec<f64>,
    min_scale: f64,
    max_scale: f64,
    wheel_step: f64,
}

impl Default for TransformController {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformController {
    pub fn new() -> Self {
        Self::with_settings(&ZoomSettings::default())
    }

    pub fn with_settings(settings: &ZoomSettings) -> Self {
        Self {
            transform: CanvasTransform::default(),
            levels: settings.levels.clone(),
            min_scale: settings.min,
            max_scale: settings.max,
            wheel_step: settings.wheel_step,
        }
    }

    pub fn transform(&self) -> CanvasTransform {
        self.transform
    }

    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.transform.offset
    }

    /// Replace the transform, clamping the scale.
    pub fn set_transform(&mut self, transform: CanvasTransform) {
        self.transform = CanvasTransform {
            scale: self.clamp_scale(transform.scale),
            offset: transform.offset,
        };
    }

    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.transform.screen_to_canvas(screen)
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.transform.canvas_to_screen(canvas)
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            return self.transform.scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// Translate the view by a screen-space delta. Unbounded.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.transform.offset += Vec2::new(dx, dy);
    }

    /// Set the scale, keeping the canvas point under `focal` (screen space) fixed.
    pub fn zoom_to(&mut self, scale: f64, focal: Option<Point>) {
        let old = self.transform.scale;
        let new = self.clamp_scale(scale);
        if let Some(focal) = focal {
            let focal = focal.to_vec2();
            self.transform.offset = focal - (focal - self.transform.offset) * (new / old);
        }
        self.transform.scale = new;
    }

    /// Step to the next zoom level above the current scale.
    pub fn zoom_in(&mut self, focal: Option<Point>) {
        let current = self.transform.scale;
        if let Some(level) = self
            .levels
            .iter()
            .copied()
            .find(|level| *level > current + LEVEL_EPSILON)
        {
            self.zoom_to(level, focal);
        }
    }

    /// Step to the next zoom level below the current scale.
    pub fn zoom_out(&mut self, focal: Option<Point>) {
        let current = self.transform.scale;
        if let Some(level) = self
            .levels
            .iter()
            .rev()
            .copied()
            .find(|level| *level < current - LEVEL_EPSILON)
        {
            self.zoom_to(level, focal);
        }
    }

    /// Back to scale 1 with no offset.
    pub fn reset_zoom(&mut self) {
        self.transform = CanvasTransform::default();
    }

    /// Ctrl/Cmd + wheel zooms around the pointer; a plain wheel pans.
    pub fn apply_wheel(&mut self, event: &WheelEvent) {
        if event.modifiers.zoom_modifier() {
            if event.delta.y == 0.0 {
                return;
            }
            let factor = if event.delta.y < 0.0 {
                1.0 + self.wheel_step
            } else {
                1.0 / (1.0 + self.wheel_step)
            };
            self.zoom_to(self.transform.scale * factor, Some(event.position));
        } else {
            self.pan(-event.delta.x, -event.delta.y);
        }
    }

    /// Frame the given items in the viewport. Rotation is ignored.
    ///
    /// Never zooms in past 1. An empty list resets the view.
    pub fn fit_to_view<'a>(
        &mut self,
        items: impl IntoIterator<Item = &'a CanvasItem>,
        viewport: Size,
        padding: f64,
    ) {
        match bounding_box(items) {
            Some(bounds) => self.fit_to_bounds(bounds, viewport, padding),
            None => self.reset_zoom(),
        }
    }

    /// Frame a canvas-space rectangle in the viewport.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let ratio = |avail: f64, content: f64| {
            if content > 0.0 {
                avail / content
            } else {
                f64::INFINITY
            }
        };
        let fit = ratio(available.width, bounds.width()).min(ratio(available.height, bounds.height()));
        let scale = fit.min(1.0).max(self.min_scale).min(self.max_scale);

        let center = bounds.center();
        self.transform = CanvasTransform {
            scale,
            offset: Vec2::new(
                viewport.width / 2.0 - center.x * scale,
                viewport.height / 2.0 - center.y * scale,
            ),
        };
    }
}
