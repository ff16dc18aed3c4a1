//! Resize and rotate handles, and the geometry behind them.

use crate::items::ItemFrame;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit radius in screen pixels.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
/// Distance from the top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;
/// Angle increment used when rotation snapping is active.
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// One of the eight compass resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
        ResizeHandle::Nw,
    ];

    pub fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    pub fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    pub fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }

    pub fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    /// Where the handle sits on an unrotated rectangle.
    pub fn anchor(self, rect: Rect) -> Point {
        let x = if self.moves_left() {
            rect.x0
        } else if self.moves_right() {
            rect.x1
        } else {
            rect.center().x
        };
        let y = if self.moves_top() {
            rect.y0
        } else if self.moves_bottom() {
            rect.y1
        } else {
            rect.center().y
        };
        Point::new(x, y)
    }
}

/// What a handle does when grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Resize(ResizeHandle),
    Rotate,
}

/// A handle with its position in canvas space.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a canvas point lies within `tolerance` of this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Rotate `point` by `degrees` around `center`.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let d = point - center;
    Point::new(
        center.x + d.x * cos - d.y * sin,
        center.y + d.x * sin + d.y * cos,
    )
}

/// Handles of an item, rotated with it.
///
/// `scale` is the current zoom; handle offsets are given in screen pixels
/// and stay visually constant.
pub fn handles_for(frame: ItemFrame, scale: f64, rotate_offset: f64) -> Vec<Handle> {
    let rect = frame.rect();
    let center = rect.center();
    let mut handles: Vec<Handle> = ResizeHandle::ALL
        .iter()
        .map(|&h| {
            Handle::new(
                rotate_point(h.anchor(rect), center, frame.rotation),
                HandleKind::Resize(h),
            )
        })
        .collect();
    let rotate_at = Point::new(center.x, rect.y0 - rotate_offset / scale);
    handles.push(Handle::new(
        rotate_point(rotate_at, center, frame.rotation),
        HandleKind::Rotate,
    ));
    handles
}

/// Find the handle under a canvas point, preferring the rotate handle.
pub fn hit_test_handles(
    frame: ItemFrame,
    point: Point,
    scale: f64,
    radius: f64,
    rotate_offset: f64,
) -> Option<HandleKind> {
    let tolerance = radius / scale;
    let handles = handles_for(frame, scale, rotate_offset);
    handles
        .iter()
        .rev()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Whether a canvas point lies inside a possibly rotated frame.
pub fn frame_contains(frame: ItemFrame, point: Point) -> bool {
    let local = rotate_point(point, frame.center(), -frame.rotation);
    let rect = frame.rect();
    local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
}

/// Resize a frame by dragging `handle` by `delta` (canvas units).
///
/// Sizes never drop below `min`. Moving the top or left edge shifts the
/// position by the clamped amount, so the opposite edge stays put.
pub fn resize_frame(origin: ItemFrame, handle: ResizeHandle, delta: Vec2, min: Size) -> ItemFrame {
    let mut frame = origin;
    let (x0, y0) = (origin.position.x, origin.position.y);
    let (w0, h0) = (origin.size.width, origin.size.height);

    if handle.moves_right() {
        frame.size.width = (w0 + delta.x).max(min.width);
    }
    if handle.moves_left() {
        let width = (w0 - delta.x).max(min.width);
        frame.position.x = x0 + (w0 - width);
        frame.size.width = width;
    }
    if handle.moves_bottom() {
        frame.size.height = (h0 + delta.y).max(min.height);
    }
    if handle.moves_top() {
        let height = (h0 - delta.y).max(min.height);
        frame.position.y = y0 + (h0 - height);
        frame.size.height = height;
    }
    frame
}

/// Angle in degrees from `center` to `pointer`, with 0° pointing up.
pub fn rotation_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees() + 90.0
}

/// Round an angle to the nearest multiple of `step`.
pub fn snap_angle(angle: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return angle;
    }
    (angle / step).round() * step
}

/// Axis-aligned overlap test; touching edges count as overlapping.
pub fn aabb_overlaps(a: Rect, b: Rect) -> bool {
    !(a.x1 < b.x0 || a.x0 > b.x1 || a.y1 < b.y0 || a.y0 > b.y1)
}
