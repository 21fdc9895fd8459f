//! Typed errors for the one recoverable failure kind the core exposes:
//! malformed level input. Invariant violations are assertions, not `Result`s
//! (see `board`); budget exhaustion is a `SolveResult` variant, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("unrecognized character {ch:?} at row {row}, column {col}")]
    UnknownCharacter { ch: char, row: usize, col: usize },

    #[error("no player found on board")]
    MissingPlayer,

    #[error("multiple players found on board")]
    MultiplePlayers,

    #[error("box count ({boxes}) does not match goal count ({goals})")]
    BoxGoalMismatch { boxes: usize, goals: usize },

    #[error("board has {boxes} boxes, exceeding the maximum of {max}")]
    TooLarge { boxes: usize, max: usize },

    #[error("board has no rows")]
    Empty,

    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
}
