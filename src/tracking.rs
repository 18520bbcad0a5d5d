//! Hand tracking input.
//!
//! A tracker hands over one [`TrackingFrame`] per processed camera frame. The
//! game only reads the index fingertip of the first confident hand; the rest
//! of the landmarks ride along for sources that have them.

pub mod pointer;
pub mod process;

use serde::{Deserialize, Serialize};

use crate::geometry::{NormalizedPoint, Size};

/// MediaPipe hand landmark indices
pub mod landmarks {
    pub const INDEX_FINGER_TIP: usize = 8;

    pub const COUNT: usize = 21;
}

/// Start-up settings passed to the detector; not changed while running.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub max_hands: usize,
    pub model_complexity: u8,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_hands: 1,
            model_complexity: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.7,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    /// 0.0 to 1.0 across the source frame
    pub x: f32,
    /// 0.0 to 1.0 down the source frame
    pub y: f32,
    /// depth relative to the wrist
    pub z: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
    pub score: f32,
    pub handedness: String,
}

impl Hand {
    pub fn index_finger_tip(&self) -> Option<Landmark> {
        self.landmarks.get(landmarks::INDEX_FINGER_TIP).copied()
    }
}

/// Greyscale thumbnail of the camera frame, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl FrameImage {
    /// Nearest pixel at source-pixel coordinates; out-of-range reads clamp.
    /// A `luma` buffer shorter than `width * height` reads as black past its end.
    pub fn sample(&self, x: f64, y: f64) -> u8 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let width = self.width as usize;
        let col = (x.max(0.0) as usize).min(width - 1);
        let row = (y.max(0.0) as usize).min(self.height as usize - 1);
        row.checked_mul(width)
            .and_then(|i| i.checked_add(col))
            .and_then(|i| self.luma.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackingFrame {
    /// Camera frame size in pixels
    pub source: Size,
    pub hands: Vec<Hand>,
    pub image: Option<FrameImage>,
}

impl TrackingFrame {
    pub fn empty(source: Size) -> Self {
        Self {
            source,
            hands: Vec::new(),
            image: None,
        }
    }

    /// Index fingertip of the first hand that clears the detection threshold.
    pub fn fingertip(&self, config: &TrackerConfig) -> Option<NormalizedPoint> {
        self.hands
            .iter()
            .take(config.max_hands)
            .filter(|h| h.score >= config.min_detection_confidence)
            .find_map(Hand::index_finger_tip)
            .map(|tip| NormalizedPoint::new(tip.x as f64, tip.y as f64))
    }
}

/// Anything that produces tracking frames at its own pace.
pub trait FrameSource {
    /// The next frame, if one arrived since the last call.
    fn next_frame(&mut self) -> Option<TrackingFrame>;
}
