use crate::game::{GameState, Mark, CELL_COUNT};
use crate::geometry::{cell_center, cell_size, cover_crop, PixelPoint, Rect, Size, GRID_SIDE};
use crate::tracking::FrameImage;

pub const POINTER_RADIUS: f64 = 8.0;
pub const PROGRESS_RADIUS: f64 = 22.0;
/// Mark half-extent as a share of the smaller cell side
pub const MARK_SCALE: f64 = 0.15;

/// One drawing step, in surface pixels
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    /// Draw `crop` of the camera frame stretched over the whole surface
    CameraFrame { crop: Rect, mirrored: bool },
    GridLine { from: PixelPoint, to: PixelPoint },
    /// Fingertip marker, coloured by whose turn it is
    Pointer { at: PixelPoint, radius: f64, turn: Mark },
    /// Dwell progress, a clockwise arc from twelve o'clock
    ProgressRing {
        at: PixelPoint,
        radius: f64,
        fraction: f64,
    },
    /// X is two diagonals, O a circle, both `size` from the centre
    Mark {
        mark: Mark,
        center: PixelPoint,
        size: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub surface: Size,
    pub ops: Vec<DrawOp>,
}

impl Scene {
    pub fn blank(surface: Size) -> Self {
        Self {
            surface,
            ops: vec![DrawOp::Clear],
        }
    }
}

/// Everything a frame is drawn from
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub game: &'a GameState,
    /// Fingertip seen this frame; `None` when no hand was detected
    pub pointer: Option<PixelPoint>,
    /// Dwell progress to show, if a dwell is running
    pub progress: Option<f64>,
    pub frame: Option<&'a FrameImage>,
    pub surface: Size,
}

pub fn compose(input: SceneInput<'_>) -> Scene {
    let SceneInput {
        game,
        pointer,
        progress,
        frame,
        surface,
    } = input;

    let mut ops = vec![DrawOp::Clear];

    if let Some(frame) = frame {
        ops.push(DrawOp::CameraFrame {
            crop: cover_crop(frame.size(), surface),
            mirrored: true,
        });
    }

    let cell = cell_size(surface);
    for i in 1..GRID_SIDE {
        let x = i as f64 * cell.width;
        let y = i as f64 * cell.height;
        ops.push(DrawOp::GridLine {
            from: PixelPoint::new(x, 0.0),
            to: PixelPoint::new(x, surface.height),
        });
        ops.push(DrawOp::GridLine {
            from: PixelPoint::new(0.0, y),
            to: PixelPoint::new(surface.width, y),
        });
    }

    if let Some(at) = pointer {
        ops.push(DrawOp::Pointer {
            at,
            radius: POINTER_RADIUS,
            turn: game.current_player(),
        });
        if let Some(fraction) = progress {
            ops.push(DrawOp::ProgressRing {
                at,
                radius: PROGRESS_RADIUS,
                fraction: fraction.clamp(0.0, 1.0),
            });
        }
    }

    let size = cell.width.min(cell.height) * MARK_SCALE;
    for index in 0..CELL_COUNT {
        if let Some(mark) = game.board().get(index) {
            ops.push(DrawOp::Mark {
                mark,
                center: cell_center(index, surface),
                size,
            });
        }
    }

    Scene { surface, ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SURFACE: Size = Size {
        width: 800.0,
        height: 800.0,
    };

    fn input(game: &GameState) -> SceneInput<'_> {
        SceneInput {
            game,
            pointer: None,
            progress: None,
            frame: None,
            surface: SURFACE,
        }
    }

    #[test]
    fn test_empty_game_is_clear_and_grid() {
        let game = GameState::default();
        let scene = compose(input(&game));
        assert_eq!(scene.ops[0], DrawOp::Clear);
        let grid = scene
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::GridLine { .. }))
            .count();
        assert_eq!(grid, 4);
        assert_eq!(scene.ops.len(), 5);
    }

    #[test]
    fn test_camera_frame_drawn_first_after_clear() {
        let game = GameState::default();
        let image = FrameImage {
            width: 4,
            height: 3,
            luma: vec![0; 12],
        };
        let scene = compose(SceneInput {
            frame: Some(&image),
            ..input(&game)
        });
        assert_matches!(scene.ops[1], DrawOp::CameraFrame { mirrored: true, .. });
    }

    #[test]
    fn test_pointer_without_progress() {
        let game = GameState::default();
        let scene = compose(SceneInput {
            pointer: Some(PixelPoint::new(10.0, 20.0)),
            ..input(&game)
        });
        assert!(scene.ops.contains(&DrawOp::Pointer {
            at: PixelPoint::new(10.0, 20.0),
            radius: POINTER_RADIUS,
            turn: Mark::X,
        }));
        assert!(!scene
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::ProgressRing { .. })));
    }

    #[test]
    fn test_progress_needs_a_pointer() {
        let game = GameState::default();
        let scene = compose(SceneInput {
            progress: Some(0.5),
            ..input(&game)
        });
        assert!(!scene
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::ProgressRing { .. } | DrawOp::Pointer { .. })));
    }

    #[test]
    fn test_progress_ring_follows_pointer() {
        let mut game = GameState::default();
        game.make_move(0);
        let at = PixelPoint::new(400.0, 400.0);
        let scene = compose(SceneInput {
            pointer: Some(at),
            progress: Some(0.25),
            ..input(&game)
        });
        assert!(scene.ops.contains(&DrawOp::ProgressRing {
            at,
            radius: PROGRESS_RADIUS,
            fraction: 0.25,
        }));
        assert_matches!(
            scene.ops.iter().find(|op| matches!(op, DrawOp::Pointer { .. })),
            Some(DrawOp::Pointer { turn: Mark::O, .. })
        );
    }

    #[test]
    fn test_marks_drawn_last_at_cell_centres() {
        let mut game = GameState::default();
        game.make_move(0);
        game.make_move(8);
        let scene = compose(SceneInput {
            pointer: Some(PixelPoint::new(1.0, 1.0)),
            progress: Some(0.1),
            ..input(&game)
        });

        let n = scene.ops.len();
        let cell = SURFACE.width / 3.0;
        assert_eq!(
            scene.ops[n - 2],
            DrawOp::Mark {
                mark: Mark::X,
                center: PixelPoint::new(cell / 2.0, cell / 2.0),
                size: cell * MARK_SCALE,
            }
        );
        assert_matches!(scene.ops[n - 1], DrawOp::Mark { mark: Mark::O, .. });
    }
}
