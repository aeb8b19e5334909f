//! First-class move types for ultimate tic-tac-toe.
//!
//! Moves are domain events. They record the player's intent and are
//! validated against the board before anything is mutated.

use crate::types::Mark;
use serde::{Deserialize, Serialize};

/// A move: a mark placed into one cell of one local board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The mark being played.
    pub mark: Mark,
    /// Target local board (0-8).
    pub board: usize,
    /// Target cell within that local board (0-8).
    pub cell: usize,
}

impl Move {
    /// Creates a new move.
    pub fn new(mark: Mark, board: usize, cell: usize) -> Self {
        Self { mark, board, cell }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> board {} cell {}", self.mark, self.board, self.cell)
    }
}

/// Why a move was rejected. A rejected move never mutates the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum MoveError {
    /// Board or cell index outside 0-8.
    #[display("Board {} / cell {} is out of range", board, cell)]
    OutOfRange {
        /// Requested local board.
        board: usize,
        /// Requested cell.
        cell: usize,
    },

    /// The mover is not the mark due to play.
    #[display("It's not {}'s turn", _0)]
    WrongTurn(#[error(not(source))] Mark),

    /// The active-board constraint points elsewhere.
    #[display("Local board {} is not playable; play on board {}", requested, required)]
    WrongLocalBoard {
        /// Board the move targeted.
        requested: usize,
        /// Board the constraint requires.
        required: usize,
    },

    /// The local board is already decided on the global grid.
    #[display("Local board {} is already decided", _0)]
    LocalBoardDecided(#[error(not(source))] usize),

    /// The addressed cell already holds a mark.
    #[display("Cell {} of board {} is already occupied", cell, board)]
    CellOccupied {
        /// Local board.
        board: usize,
        /// Occupied cell.
        cell: usize,
    },
}
