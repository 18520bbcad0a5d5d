use crate::game::{GameState, Mark, Mode, Outcome};

/// Tone a label is shown in; the terminal maps these to colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Player(Mark),
    Neutral,
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pill {
    pub text: String,
    pub tone: Tone,
}

/// Text shown around the board. Derived fresh from the game every draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub turn: Pill,
    pub status: Pill,
    /// `(mode, active)` for each mode, in display order
    pub modes: [(Mode, bool); 2],
}

impl StatusView {
    pub fn of(game: &GameState) -> Self {
        let player = game.current_player();
        let status = match game.outcome() {
            None => Pill {
                text: "PLAYING".into(),
                tone: Tone::Neutral,
            },
            Some(Outcome::Win(mark)) => Pill {
                text: format!("PLAYER {mark} WINS!"),
                tone: Tone::Player(mark),
            },
            Some(Outcome::Draw) => Pill {
                text: "IT'S A DRAW!".into(),
                tone: Tone::Highlight,
            },
        };

        Self {
            turn: Pill {
                text: format!("TURN: {player}"),
                tone: Tone::Player(player),
            },
            status,
            modes: [
                (Mode::PvE, game.mode() == Mode::PvE),
                (Mode::PvP, game.mode() == Mode::PvP),
            ],
        }
    }
}
