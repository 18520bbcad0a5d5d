use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CELL_COUNT: usize = 9;

/// Rows, columns, then the two diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Mode {
    #[default]
    PvP,
    PvE,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::PvP => Mode::PvE,
            Mode::PvE => Mode::PvP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win(Mark),
    Draw,
}

/// Nine cells, row-major: index `i` is row `i / 3`, column `i % 3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    pub fn is_empty_at(&self, index: usize) -> bool {
        index < CELL_COUNT && self.cells[index].is_none()
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT).filter(|&i| self.cells[i].is_none()).collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Copy of this board with `mark` placed at `index`
    pub fn with(&self, index: usize, mark: Mark) -> Self {
        let mut next = *self;
        next.cells[index] = Some(mark);
        next
    }

    fn set(&mut self, index: usize, mark: Mark) {
        self.cells[index] = Some(mark);
    }
}

/// First full line wins; otherwise a full board is a draw.
pub fn check_outcome(board: &Board) -> Option<Outcome> {
    for [a, b, c] in WIN_LINES {
        if let Some(mark) = board.get(a) {
            if board.get(b) == Some(mark) && board.get(c) == Some(mark) {
                return Some(Outcome::Win(mark));
            }
        }
    }
    if board.is_full() {
        return Some(Outcome::Draw);
    }
    None
}

/// What a call to [`GameState::make_move`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// Occupied cell, out-of-range index, or game already over
    Ignored,
    /// Mark placed, turn passed to the next human
    Continued,
    /// Mark placed, turn passed to the computer; caller schedules its move
    ComputerTurn,
    Finished(Outcome),
}

/// Whole game: board, turn, outcome, mode
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    current_player: Mark,
    outcome: Option<Outcome>,
    mode: Mode,
    round: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl GameState {
    /// The human always plays X; under PvE the computer answers as O.
    pub const HUMAN_MARK: Mark = Mark::X;
    pub const COMPUTER_MARK: Mark = Mark::O;

    pub fn new(mode: Mode) -> Self {
        Self {
            board: Board::default(),
            current_player: Mark::X,
            outcome: None,
            mode,
            round: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Mark {
        self.current_player
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Bumped on every reset; lets deferred work detect that its game is gone.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// True when a human may pick a cell right now.
    pub fn accepts_human_move(&self) -> bool {
        !self.is_over() && (self.mode == Mode::PvP || self.current_player == Self::HUMAN_MARK)
    }

    pub fn is_computer_turn(&self) -> bool {
        !self.is_over() && self.mode == Mode::PvE && self.current_player == Self::COMPUTER_MARK
    }

    pub fn reset(&mut self) {
        self.board = Board::default();
        self.current_player = Mark::X;
        self.outcome = None;
        self.round += 1;
        info!(round = self.round, mode = %self.mode, "new game");
    }

    /// Flips PvP/PvE. Always restarts, discarding any game in progress.
    pub fn switch_mode(&mut self) {
        self.mode = self.mode.toggled();
        self.reset();
    }

    pub fn make_move(&mut self, index: usize) -> MoveResult {
        if self.is_over() || !self.board.is_empty_at(index) {
            return MoveResult::Ignored;
        }

        let mark = self.current_player;
        self.board.set(index, mark);
        debug!(index, %mark, "mark placed");

        if let Some(outcome) = check_outcome(&self.board) {
            self.outcome = Some(outcome);
            info!(?outcome, "game over");
            return MoveResult::Finished(outcome);
        }

        self.current_player = mark.other();
        if self.is_computer_turn() {
            MoveResult::ComputerTurn
        } else {
            MoveResult::Continued
        }
    }
}
