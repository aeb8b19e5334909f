//! Active-board invariant: the constraint never points at a decided board.

use super::Invariant;
use crate::types::{ActiveBoard, Cell};
use crate::Board;

/// Invariant: the active-board constraint is `Any` or an undecided index.
pub struct ActiveBoardInvariant;

impl Invariant<Board> for ActiveBoardInvariant {
    fn holds(board: &Board) -> bool {
        match board.active_board() {
            ActiveBoard::Any => true,
            ActiveBoard::Board(index) => board.global().get(index) == Some(Cell::Empty),
        }
    }

    fn description() -> &'static str {
        "Active board is any or an undecided local board"
    }
}
