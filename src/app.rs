use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::config::Config;
use crate::controls::{Action, Control, ControlBindings, ControlLayout};
use crate::dwell::{candidate_target, DwellEngine, DwellUpdate, Target};
use crate::game::{GameState, MoveResult};
use crate::geometry::{project_fingertip, PixelPoint, Size};
use crate::opponent::HeuristicOpponent;
use crate::render::{compose, Scene, SceneInput};
use crate::runtime::DelayQueue;
use crate::status::StatusView;
use crate::tracking::{FrameImage, TrackerConfig, TrackingFrame};

/// Computer reply waiting for its "thinking" delay to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    /// Game round the move was scheduled in
    pub round: u64,
}

/// Game, dwell selection and drawing state for one session.
#[derive(Debug)]
pub struct App {
    game: GameState,
    dwell: DwellEngine,
    bindings: ControlBindings,
    controls: ControlLayout,
    opponent: HeuristicOpponent,
    pending: DelayQueue<PendingMove>,
    computer_delay: Duration,
    tracker: TrackerConfig,
    surface: Size,
    last_pointer: Option<PixelPoint>,
    hand_visible: bool,
    frame_image: Option<FrameImage>,
    scene: Scene,
}

impl App {
    pub fn new(config: &Config, opponent: HeuristicOpponent) -> Self {
        let surface = config.surface();
        let game = GameState::new(config.start_mode);
        let mut app = Self {
            game,
            dwell: DwellEngine::new(config.dwell_threshold()),
            bindings: ControlBindings::default(),
            controls: ControlLayout::new(),
            opponent,
            pending: DelayQueue::new(),
            computer_delay: config.computer_delay(),
            tracker: config.tracker,
            surface,
            last_pointer: None,
            hand_visible: false,
            frame_image: None,
            scene: Scene::blank(surface),
        };
        app.redraw(Instant::now());
        app
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn dwell(&self) -> &DwellEngine {
        &self.dwell
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn status(&self) -> StatusView {
        StatusView::of(&self.game)
    }

    pub fn surface(&self) -> Size {
        self.surface
    }

    /// Last place a hand was seen, kept across frames without one.
    pub fn last_pointer(&self) -> Option<PixelPoint> {
        self.last_pointer
    }

    /// Latest camera image, what `DrawOp::CameraFrame` crops from.
    pub fn frame_image(&self) -> Option<&FrameImage> {
        self.frame_image.as_ref()
    }

    pub fn pending_moves(&self) -> usize {
        self.pending.len()
    }

    /// Control the pointer is currently dwelling on, for highlighting.
    pub fn active_control(&self) -> Option<Control> {
        match self.dwell.target() {
            Some(Target::Control(c)) => Some(c),
            _ => None,
        }
    }

    /// Control bounds in surface pixels, taken from the latest screen layout.
    pub fn set_controls(&mut self, controls: ControlLayout) {
        self.controls = controls;
    }

    /// Handles one tracker frame: locate the fingertip, advance the dwell,
    /// commit if it completed, then rebuild the scene.
    pub fn on_frame(&mut self, frame: TrackingFrame, now: Instant) -> DwellUpdate {
        let pointer = frame
            .fingertip(&self.tracker)
            .map(|tip| project_fingertip(tip, self.surface));
        self.hand_visible = pointer.is_some();
        if pointer.is_some() {
            self.last_pointer = pointer;
        }
        self.frame_image = frame.image;

        let candidate = candidate_target(pointer, &self.controls, &self.game, self.surface);
        let update = self.dwell.update(candidate, now);
        trace!(?pointer, ?candidate, ?update, "frame");

        if let Some(target) = update.committed() {
            self.commit(target, now);
        }

        self.scene = compose(SceneInput {
            game: &self.game,
            pointer,
            progress: update.progress(),
            frame: self.frame_image.as_ref(),
            surface: self.surface,
        });
        update
    }

    /// Direct activation, skipping the dwell entirely.
    pub fn activate(&mut self, control: Control, now: Instant) {
        debug!(%control, "direct activation");
        self.apply(self.bindings.action(control));
        self.redraw(now);
    }

    /// Fires computer moves whose delay has run out. Returns how many fired.
    pub fn on_tick(&mut self, now: Instant) -> usize {
        let due = self.pending.drain_due(now);
        let fired = due.len();
        for pending in due {
            self.computer_move(pending, now);
        }
        if fired > 0 {
            self.redraw(now);
        }
        fired
    }

    pub fn reset(&mut self) {
        self.game.reset();
        self.dwell.clear();
    }

    pub fn switch_mode(&mut self) {
        self.game.switch_mode();
        self.dwell.clear();
        info!(mode = %self.game.mode(), "mode switched");
    }

    /// Places the current player's mark. Hands the turn to the computer when
    /// it is due to move.
    pub fn play(&mut self, index: usize, now: Instant) -> MoveResult {
        let result = self.game.make_move(index);
        if result == MoveResult::ComputerTurn {
            self.pending.schedule(
                now + self.computer_delay,
                PendingMove {
                    round: self.game.round(),
                },
            );
        }
        result
    }

    fn commit(&mut self, target: Target, now: Instant) {
        match target {
            Target::Cell(index) => {
                self.play(index, now);
            }
            Target::Control(control) => self.apply(self.bindings.action(control)),
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::ResetGame => self.reset(),
            Action::SwitchMode => self.switch_mode(),
        }
    }

    /// The game may have been reset, switched or finished since the move was
    /// scheduled; only a move still owed in the same round is played.
    fn computer_move(&mut self, pending: PendingMove, now: Instant) {
        if pending.round != self.game.round() || !self.game.is_computer_turn() {
            debug!(?pending, round = self.game.round(), "stale computer move dropped");
            return;
        }
        let mark = self.game.current_player();
        if let Some(index) = self.opponent.pick(self.game.board(), mark) {
            debug!(index, %mark, "computer moves");
            self.play(index, now);
        }
    }

    fn redraw(&mut self, now: Instant) {
        let pointer = self.last_pointer.filter(|_| self.hand_visible);
        self.scene = compose(SceneInput {
            game: &self.game,
            pointer,
            progress: self.dwell.progress(now),
            frame: self.frame_image.as_ref(),
            surface: self.surface,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Mark, Mode, Outcome};
    use crate::geometry::{unproject_to_tracker, Rect};
    use crate::tracking::{landmarks, Hand, Landmark};
    use assert_matches::assert_matches;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn app(mode: Mode) -> App {
        let config = Config {
            start_mode: mode,
            ..Config::default()
        };
        let mut app = App::new(&config, HeuristicOpponent::seeded(11));
        app.set_controls(
            ControlLayout::new()
                .with(Control::Reset, Rect::new(0.0, 0.0, 120.0, 40.0))
                .with(Control::ModeToggle, Rect::new(680.0, 0.0, 120.0, 40.0)),
        );
        app
    }

    /// Frame with the fingertip landing on surface point `p`.
    fn frame_at(app: &App, p: PixelPoint) -> TrackingFrame {
        let n = unproject_to_tracker(p, app.surface());
        let tip = Landmark {
            x: n.x as f32,
            y: n.y as f32,
            z: 0.0,
        };
        let mut frame = TrackingFrame::empty(Size::new(640.0, 480.0));
        frame.hands.push(Hand {
            landmarks: vec![tip; landmarks::COUNT],
            score: 0.95,
            handedness: "Right".into(),
        });
        frame
    }

    fn cell_point(index: usize) -> PixelPoint {
        let side = 800.0 / 3.0;
        PixelPoint::new(
            (index % 3) as f64 * side + side / 2.0,
            (index / 3) as f64 * side + side / 2.0,
        )
    }

    fn dwell_on(app: &mut App, p: PixelPoint, start: Instant) -> Instant {
        let f = frame_at(app, p);
        app.on_frame(f.clone(), start);
        let end = start + ms(1600);
        app.on_frame(f, end);
        end
    }

    #[test]
    fn test_dwell_places_mark() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        let f = frame_at(&app, cell_point(5));

        assert_matches!(app.on_frame(f.clone(), t0), DwellUpdate::Started(Target::Cell(5)));
        assert_matches!(app.on_frame(f.clone(), t0 + ms(700)), DwellUpdate::Progress { .. });
        assert_eq!(app.game().board().get(5), None);
        assert_eq!(
            app.on_frame(f, t0 + ms(1600)),
            DwellUpdate::Commit(Target::Cell(5))
        );
        assert_eq!(app.game().board().get(5), Some(Mark::X));
        assert_eq!(app.game().current_player(), Mark::O);
    }

    #[test]
    fn test_lost_hand_keeps_pointer_but_drops_dwell() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        let p = cell_point(4);
        app.on_frame(frame_at(&app, p), t0);

        app.on_frame(TrackingFrame::empty(Size::new(640.0, 480.0)), t0 + ms(100));
        assert!(app.dwell().session().is_none());
        let kept = app.last_pointer().unwrap();
        assert!((kept.x - p.x).abs() < 0.01 && (kept.y - p.y).abs() < 0.01);

        // frames without a hand never re-arm the cell
        let up = app.on_frame(TrackingFrame::empty(Size::new(640.0, 480.0)), t0 + ms(2000));
        assert_eq!(up, DwellUpdate::Idle);
        assert_eq!(app.game().board().get(4), None);
    }

    #[test]
    fn test_reset_control_by_dwell() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        app.play(0, t0);
        dwell_on(&mut app, PixelPoint::new(60.0, 20.0), t0);
        assert_eq!(app.game().board().get(0), None);
        assert_eq!(app.game().mode(), Mode::PvP);
    }

    #[test]
    fn test_mode_control_by_dwell_fires_once() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        let p = PixelPoint::new(740.0, 20.0);
        let end = dwell_on(&mut app, p, t0);
        assert_eq!(app.game().mode(), Mode::PvE);

        // keep hovering well past another threshold
        for i in 1..40 {
            app.on_frame(frame_at(&app, p), end + ms(i * 100));
        }
        assert_eq!(app.game().mode(), Mode::PvE);
    }

    #[test]
    fn test_active_control_while_hovering() {
        let mut app = app(Mode::PvP);
        app.on_frame(frame_at(&app, PixelPoint::new(60.0, 20.0)), Instant::now());
        assert_eq!(app.active_control(), Some(Control::Reset));
    }

    #[test]
    fn test_direct_activation_bypasses_dwell() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        app.play(4, t0);
        app.activate(Control::ModeToggle, t0);
        assert_eq!(app.game().mode(), Mode::PvE);
        assert_eq!(app.game().board().empty_cells().len(), 9);

        app.play(4, t0);
        app.activate(Control::Reset, t0);
        assert_eq!(app.game().mode(), Mode::PvE);
        assert_eq!(app.game().board().get(4), None);
    }

    #[test]
    fn test_reset_clears_running_dwell() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        app.on_frame(frame_at(&app, cell_point(2)), t0);
        assert!(app.dwell().session().is_some());
        app.activate(Control::Reset, t0 + ms(10));
        assert!(app.dwell().session().is_none());
    }

    #[test]
    fn test_computer_replies_after_delay() {
        let mut app = app(Mode::PvE);
        let t0 = Instant::now();
        assert_eq!(app.play(4, t0), MoveResult::ComputerTurn);
        assert_eq!(app.pending_moves(), 1);

        assert_eq!(app.on_tick(t0 + ms(100)), 0);
        assert_eq!(app.game().current_player(), Mark::O);

        assert_eq!(app.on_tick(t0 + ms(500)), 1);
        assert_eq!(app.game().current_player(), Mark::X);
        assert_eq!(app.game().board().empty_cells().len(), 7);
    }

    #[test]
    fn test_cells_locked_while_computer_thinks() {
        let mut app = app(Mode::PvE);
        let t0 = Instant::now();
        app.play(4, t0);
        let up = app.on_frame(frame_at(&app, cell_point(0)), t0 + ms(10));
        assert_eq!(up, DwellUpdate::Idle);
    }

    #[test]
    fn test_reset_turns_pending_move_into_noop() {
        let mut app = app(Mode::PvE);
        let t0 = Instant::now();
        app.play(4, t0);
        app.activate(Control::Reset, t0 + ms(100));
        // the timer is not cancelled, the move just no longer applies
        assert_eq!(app.pending_moves(), 1);

        app.on_tick(t0 + ms(600));
        assert_eq!(app.game().board().empty_cells().len(), 9);
        assert_eq!(app.game().current_player(), Mark::X);
    }

    #[test]
    fn test_stale_move_ignored_even_when_computer_owes_one_again() {
        let mut app = app(Mode::PvE);
        let t0 = Instant::now();
        app.play(4, t0);
        app.reset();
        app.play(0, t0 + ms(100));
        assert_eq!(app.pending_moves(), 2);

        // first timer belongs to the discarded round
        app.on_tick(t0 + ms(550));
        assert_eq!(app.game().current_player(), Mark::O);
        app.on_tick(t0 + ms(650));
        assert_eq!(app.game().current_player(), Mark::X);
        assert_eq!(app.game().board().empty_cells().len(), 7);
    }

    #[test]
    fn test_mode_switch_turns_pending_move_into_noop() {
        let mut app = app(Mode::PvE);
        let t0 = Instant::now();
        app.play(0, t0);
        app.switch_mode();
        app.on_tick(t0 + ms(1000));
        assert_eq!(app.game().mode(), Mode::PvP);
        assert_eq!(app.game().board().empty_cells().len(), 9);
    }

    #[test]
    fn test_scene_tracks_game() {
        let mut app = app(Mode::PvP);
        let t0 = Instant::now();
        app.play(0, t0);
        app.on_frame(TrackingFrame::empty(Size::new(640.0, 480.0)), t0);
        let marks = app
            .scene()
            .ops
            .iter()
            .filter(|op| matches!(op, crate::render::DrawOp::Mark { .. }))
            .count();
        assert_eq!(marks, 1);
    }

    #[test]
    fn test_full_pvp_game_to_win() {
        let mut app = app(Mode::PvP);
        let mut t = Instant::now();
        for i in [0, 4, 1, 3, 2] {
            t = dwell_on(&mut app, cell_point(i), t) + ms(10);
        }
        assert_eq!(app.game().outcome(), Some(Outcome::Win(Mark::X)));
        assert!(app.game().is_over());
        let cells: Vec<_> = (0..9).map(|i| app.game().board().get(i)).collect();
        assert_eq!(
            cells,
            [
                Some(Mark::X),
                Some(Mark::X),
                Some(Mark::X),
                Some(Mark::O),
                Some(Mark::O),
                None,
                None,
                None,
                None
            ]
        );
        assert_eq!(app.status().status.text, "PLAYER X WINS!");
    }
}
