//! Coordinate spaces and the conversions between them.
//!
//! Three spaces meet here:
//! - tracker space: normalized `[0, 1]` coordinates in the camera's own,
//!   unmirrored frame;
//! - surface space: pixels of the render surface's internal buffer, which
//!   shows the camera mirrored;
//! - screen space: where the layout engine places controls and the surface
//!   itself on screen. The surface's on-screen size is generally not its
//!   buffer size.

use crate::game::CELL_COUNT;

pub const GRID_SIDE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle; the space it lives in depends on who built it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edges count as inside.
    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Tracker point to surface pixels, mirrored horizontally so the user sees
/// themselves as in a mirror.
pub fn project_fingertip(point: NormalizedPoint, surface: Size) -> PixelPoint {
    PixelPoint {
        x: (1.0 - point.x) * surface.width,
        y: point.y * surface.height,
    }
}

/// Inverse of [`project_fingertip`].
pub fn unproject_to_tracker(point: PixelPoint, surface: Size) -> NormalizedPoint {
    NormalizedPoint {
        x: 1.0 - point.x / surface.width,
        y: point.y / surface.height,
    }
}

/// Maps a control's screen rect into surface pixels.
///
/// `display` is where the surface itself sits on screen. The control's
/// offset from it is rescaled by `surface / display` on each axis, otherwise
/// hit tests drift whenever the surface is shown at a size other than its
/// buffer size. Returns `None` while the surface has no on-screen area.
pub fn project_control_bounds(control: Rect, display: Rect, surface: Size) -> Option<Rect> {
    if display.width <= 0.0 || display.height <= 0.0 {
        return None;
    }
    let scale_x = surface.width / display.width;
    let scale_y = surface.height / display.height;

    Some(Rect {
        x: (control.x - display.x) * scale_x,
        y: (control.y - display.y) * scale_y,
        width: control.width * scale_x,
        height: control.height * scale_y,
    })
}

/// Which of the nine cells holds the point, if any.
pub fn cell_from_point(point: PixelPoint, surface: Size) -> Option<usize> {
    if surface.is_degenerate() {
        return None;
    }
    let side = GRID_SIDE as f64;
    let col = (point.x / (surface.width / side)).floor();
    let row = (point.y / (surface.height / side)).floor();
    if !(0.0..side).contains(&col) || !(0.0..side).contains(&row) {
        return None;
    }
    Some(row as usize * GRID_SIDE + col as usize)
}

pub fn cell_size(surface: Size) -> Size {
    let side = GRID_SIDE as f64;
    Size::new(surface.width / side, surface.height / side)
}

pub fn cell_center(index: usize, surface: Size) -> PixelPoint {
    debug_assert!(index < CELL_COUNT);
    let cell = cell_size(surface);
    let row = (index / GRID_SIDE) as f64;
    let col = (index % GRID_SIDE) as f64;
    PixelPoint::new(
        col * cell.width + cell.width / 2.0,
        row * cell.height + cell.height / 2.0,
    )
}

/// Region of the source frame that, scaled uniformly, covers the whole
/// surface. The excess is trimmed equally from both sides.
pub fn cover_crop(source: Size, surface: Size) -> Rect {
    if source.is_degenerate() || surface.is_degenerate() {
        return Rect::new(0.0, 0.0, source.width.max(0.0), source.height.max(0.0));
    }
    let scale = (surface.width / source.width).max(surface.height / source.height);
    let width = surface.width / scale;
    let height = surface.height / scale;
    Rect::new(
        (source.width - width) / 2.0,
        (source.height - height) / 2.0,
        width,
        height,
    )
}
