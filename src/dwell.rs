//! Dwell selection: turning a jittery pointer into discrete clicks.
//!
//! Every frame the caller works out which target (if any) is under the
//! pointer and feeds it to [`DwellEngine::update`]. Holding the same target
//! for the whole threshold commits it exactly once. Changing target restarts
//! the clock from zero, and after a commit the target stays latched until
//! the pointer leaves it, so a hand resting on a button never fires twice.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::controls::{Control, ControlLayout};
use crate::game::GameState;
use crate::geometry::{cell_from_point, PixelPoint, Size};

pub const DEFAULT_DWELL_THRESHOLD: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Cell(usize),
    Control(Control),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DwellSession {
    pub target: Target,
    pub started_at: Instant,
}

/// Result of feeding one frame to the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellUpdate {
    /// Nothing under the pointer, or a target that already fired
    Idle,
    /// New target acquired this frame; progress restarts at zero
    Started(Target),
    Progress { target: Target, fraction: f64 },
    /// Threshold crossed. Fired once per continuous dwell.
    Commit(Target),
}

impl DwellUpdate {
    /// Fraction to draw on the progress ring, if a ring should be drawn.
    pub fn progress(&self) -> Option<f64> {
        match self {
            DwellUpdate::Idle => None,
            DwellUpdate::Started(_) => Some(0.0),
            DwellUpdate::Progress { fraction, .. } => Some(*fraction),
            DwellUpdate::Commit(_) => Some(1.0),
        }
    }

    pub fn committed(&self) -> Option<Target> {
        match self {
            DwellUpdate::Commit(t) => Some(*t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DwellEngine {
    threshold: Duration,
    session: Option<DwellSession>,
    latched: Option<Target>,
}

impl Default for DwellEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DWELL_THRESHOLD)
    }
}

impl DwellEngine {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            session: None,
            latched: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn session(&self) -> Option<&DwellSession> {
        self.session.as_ref()
    }

    pub fn target(&self) -> Option<Target> {
        self.session.map(|s| s.target)
    }

    /// Drops the in-progress dwell, if any.
    pub fn clear(&mut self) {
        self.session = None;
    }

    fn fraction(&self, started_at: Instant, now: Instant) -> f64 {
        if self.threshold.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started_at);
        (elapsed.as_secs_f64() / self.threshold.as_secs_f64()).min(1.0)
    }

    /// Progress of the running session at `now`, for redraws between frames.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        self.session.map(|s| self.fraction(s.started_at, now))
    }

    pub fn update(&mut self, candidate: Option<Target>, now: Instant) -> DwellUpdate {
        let Some(candidate) = candidate else {
            if self.session.take().is_some() {
                trace!("dwell released");
            }
            self.latched = None;
            return DwellUpdate::Idle;
        };

        if self.latched == Some(candidate) {
            return DwellUpdate::Idle;
        }
        self.latched = None;

        match self.session {
            Some(session) if session.target == candidate => {
                let fraction = self.fraction(session.started_at, now);
                if fraction >= 1.0 {
                    self.session = None;
                    self.latched = Some(candidate);
                    debug!(?candidate, "dwell committed");
                    DwellUpdate::Commit(candidate)
                } else {
                    DwellUpdate::Progress {
                        target: candidate,
                        fraction,
                    }
                }
            }
            _ => {
                trace!(?candidate, "dwell started");
                self.session = Some(DwellSession {
                    target: candidate,
                    started_at: now,
                });
                DwellUpdate::Started(candidate)
            }
        }
    }
}

/// What the pointer is eligible to dwell on this frame.
///
/// Controls are always live. Cells count only while a human may move, and
/// an occupied cell is never a target.
pub fn candidate_target(
    pointer: Option<PixelPoint>,
    controls: &ControlLayout,
    game: &GameState,
    surface: Size,
) -> Option<Target> {
    let pointer = pointer?;
    if let Some(control) = controls.hit_test(pointer) {
        return Some(Target::Control(control));
    }
    if !game.accepts_human_move() {
        return None;
    }
    cell_from_point(pointer, surface)
        .filter(|&i| game.board().is_empty_at(i))
        .map(Target::Cell)
}
