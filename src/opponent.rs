use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::game::{check_outcome, Board, Mark, Outcome};

/// One-ply opponent: take a win, else block one, else play anywhere.
///
/// Never looks further ahead than one ply, so a fork beats it.
pub fn choose_move<R: Rng + ?Sized>(
    board: &Board,
    mark: Mark,
    opponent: Mark,
    rng: &mut R,
) -> Option<usize> {
    let available = board.empty_cells();

    let completes = |m: Mark| {
        available
            .iter()
            .copied()
            .find(|&i| check_outcome(&board.with(i, m)) == Some(Outcome::Win(m)))
    };

    if let Some(win) = completes(mark) {
        debug!(index = win, "opponent takes the win");
        return Some(win);
    }
    if let Some(block) = completes(opponent) {
        debug!(index = block, "opponent blocks");
        return Some(block);
    }
    available.choose(rng).copied()
}

/// [`choose_move`] bundled with its own random source
#[derive(Debug)]
pub struct HeuristicOpponent {
    rng: StdRng,
}

impl HeuristicOpponent {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic fallback picks, for replays and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self, board: &Board, mark: Mark) -> Option<usize> {
        choose_move(board, mark, mark.other(), &mut self.rng)
    }
}

impl Default for HeuristicOpponent {
    fn default() -> Self {
        Self::new()
    }
}
