//! Monotonic board invariant: cells never change once set.

use super::Invariant;
use crate::rules::is_won_by;
use crate::types::{Cell, GRID_CELLS, Grid};
use crate::Board;

/// Invariant: cells are monotonic (never overwritten).
///
/// Replays the move log onto empty grids, requiring each target cell to be
/// empty when played, and compares the result with the live board.
pub struct MonotonicBoardInvariant;

impl Invariant<Board> for MonotonicBoardInvariant {
    fn holds(board: &Board) -> bool {
        let mut global = Grid::new();
        let mut locals = [Grid::new(); GRID_CELLS];

        for mov in board.history() {
            let Some(local) = locals.get_mut(mov.board) else {
                return false;
            };
            if !local.is_empty(mov.cell) || local.set(mov.cell, Cell::Marked(mov.mark)).is_err() {
                return false;
            }
            if global.is_empty(mov.board) && is_won_by(local, mov.mark) {
                // Decided cells are only ever written once.
                if global.set(mov.board, Cell::Marked(mov.mark)).is_err() {
                    return false;
                }
            }
        }

        &global == board.global() && &locals == board.locals()
    }

    fn description() -> &'static str {
        "Cells are monotonic (never overwritten)"
    }
}
