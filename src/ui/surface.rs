use std::f64::consts::{FRAC_PI_2, TAU};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Context, Line, Points},
        Widget,
    },
};

use crate::geometry::{self, PixelPoint, Size};
use crate::render::{DrawOp, Scene};
use crate::tracking::FrameImage;

use super::mark_color;

/// Camera samples across the surface width
const CAMERA_COLUMNS: f64 = 160.0;
const ARC_STEPS: f64 = 96.0;
const BRIGHT: u8 = 170;
const MID: u8 = 90;

/// Paints a [`Scene`] onto a braille canvas stretched over the widget area.
pub struct SurfaceView<'a> {
    pub scene: &'a Scene,
    /// Image the scene's `CameraFrame` op crops from
    pub image: Option<&'a FrameImage>,
}

impl Widget for SurfaceView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let surface = self.scene.surface;
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, surface.width])
            .y_bounds([0.0, surface.height])
            .paint(|ctx| {
                for op in &self.scene.ops {
                    paint_op(ctx, op, surface, self.image);
                }
            })
            .render(area, buf);
    }
}

fn paint_op(ctx: &mut Context<'_>, op: &DrawOp, surface: Size, image: Option<&FrameImage>) {
    // canvas y grows upwards, surface y grows downwards
    let flip = |p: PixelPoint| (p.x, surface.height - p.y);

    match op {
        DrawOp::Clear => {}
        DrawOp::CameraFrame { crop, mirrored } => {
            let Some(image) = image else { return };
            let (bright, mid) = camera_points(image, *crop, *mirrored, surface);
            let bright: Vec<_> = bright.into_iter().map(flip).collect();
            let mid: Vec<_> = mid.into_iter().map(flip).collect();
            ctx.draw(&Points {
                coords: &mid,
                color: Color::DarkGray,
            });
            ctx.draw(&Points {
                coords: &bright,
                color: Color::Gray,
            });
            ctx.layer();
        }
        DrawOp::GridLine { from, to } => {
            let (x1, y1) = flip(*from);
            let (x2, y2) = flip(*to);
            ctx.draw(&Line::new(x1, y1, x2, y2, Color::White));
        }
        DrawOp::Pointer { at, radius, turn } => {
            let (x, y) = flip(*at);
            let color = mark_color(*turn);
            ctx.draw(&Circle {
                x,
                y,
                radius: *radius,
                color,
            });
            ctx.draw(&Points {
                coords: &[(x, y)],
                color,
            });
        }
        DrawOp::ProgressRing {
            at,
            radius,
            fraction,
        } => {
            let (x, y) = flip(*at);
            ctx.draw(&Circle {
                x,
                y,
                radius: *radius,
                color: Color::DarkGray,
            });
            let arc: Vec<_> = arc_points(*at, *radius, *fraction)
                .into_iter()
                .map(flip)
                .collect();
            ctx.draw(&Points {
                coords: &arc,
                color: Color::Yellow,
            });
        }
        DrawOp::Mark { mark, center, size } => {
            let (x, y) = flip(*center);
            let color = mark_color(*mark);
            match mark {
                crate::game::Mark::X => {
                    ctx.draw(&Line::new(x - size, y - size, x + size, y + size, color));
                    ctx.draw(&Line::new(x - size, y + size, x + size, y - size, color));
                }
                crate::game::Mark::O => ctx.draw(&Circle {
                    x,
                    y,
                    radius: *size,
                    color,
                }),
            }
        }
    }
}

/// Points of a clockwise arc starting at twelve o'clock, in surface
/// coordinates.
pub fn arc_points(at: PixelPoint, radius: f64, fraction: f64) -> Vec<PixelPoint> {
    let fraction = fraction.clamp(0.0, 1.0);
    if fraction <= 0.0 {
        return Vec::new();
    }
    let steps = (ARC_STEPS * fraction).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            // y points down, so increasing angle turns clockwise on screen
            let theta = -FRAC_PI_2 + TAU * fraction * i as f64 / steps as f64;
            PixelPoint::new(at.x + radius * theta.cos(), at.y + radius * theta.sin())
        })
        .collect()
}

/// Samples the cropped camera image over the surface and buckets the samples
/// into bright and mid tones. Dark samples are left out.
pub fn camera_points(
    image: &FrameImage,
    crop: geometry::Rect,
    mirrored: bool,
    surface: Size,
) -> (Vec<PixelPoint>, Vec<PixelPoint>) {
    let mut bright = Vec::new();
    let mut mid = Vec::new();
    if surface.is_degenerate() {
        return (bright, mid);
    }

    let step = surface.width / CAMERA_COLUMNS;
    let mut y = step / 2.0;
    while y < surface.height {
        let mut x = step / 2.0;
        while x < surface.width {
            let u = x / surface.width;
            let u = if mirrored { 1.0 - u } else { u };
            let v = y / surface.height;
            let luma = image.sample(crop.x + u * crop.width, crop.y + v * crop.height);
            if luma >= BRIGHT {
                bright.push(PixelPoint::new(x, y));
            } else if luma >= MID {
                mid.push(PixelPoint::new(x, y));
            }
            x += step;
        }
        y += step;
    }
    (bright, mid)
}
