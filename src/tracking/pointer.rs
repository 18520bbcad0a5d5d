use crate::geometry::{Rect, Size};

use super::{landmarks, FrameSource, Hand, Landmark, TrackingFrame};

/// Nominal camera the emulated frames claim to come from
pub const EMULATED_SOURCE: Size = Size {
    width: 640.0,
    height: 480.0,
};

/// Stands in for a camera tracker by treating the terminal mouse as the
/// fingertip.
///
/// Coordinates are reported in the camera's unmirrored frame, like a real
/// tracker would, so that after the usual mirroring the pointer lands under
/// the mouse.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    display: Rect,
    mouse: Option<(u16, u16)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the surface currently sits on screen, in terminal cells.
    pub fn set_display(&mut self, display: Rect) {
        self.display = display;
    }

    pub fn on_mouse(&mut self, column: u16, row: u16) {
        self.mouse = Some((column, row));
    }

    pub fn leave(&mut self) {
        self.mouse = None;
    }

    fn hand(&self) -> Option<Hand> {
        let (column, row) = self.mouse?;
        let d = self.display;
        if d.width <= 0.0 || d.height <= 0.0 {
            return None;
        }
        // aim at the middle of the character cell
        let fx = (column as f64 + 0.5 - d.x) / d.width;
        let fy = (row as f64 + 0.5 - d.y) / d.height;
        if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
            return None;
        }

        let tip = Landmark {
            x: (1.0 - fx) as f32,
            y: fy as f32,
            z: 0.0,
        };
        Some(Hand {
            landmarks: vec![tip; landmarks::COUNT],
            score: 1.0,
            handedness: "Mouse".into(),
        })
    }
}

impl FrameSource for PointerTracker {
    /// Always yields a frame: the mouse is polled, not pushed.
    fn next_frame(&mut self) -> Option<TrackingFrame> {
        let mut frame = TrackingFrame::empty(EMULATED_SOURCE);
        frame.hands.extend(self.hand());
        Some(frame)
    }
}
