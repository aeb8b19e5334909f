//! Closed-board detection and the active-board constraint.

use crate::types::{ActiveBoard, Cell, Grid};
use tracing::instrument;

/// A local board is closed once it is decided on the global grid or full.
///
/// No further move may target a closed board.
#[instrument(level = "trace", skip(global, local))]
pub fn is_closed(global: &Grid, local: &Grid, index: usize) -> bool {
    global.get(index) != Some(Cell::Empty) || local.is_full()
}

/// The constraint for the move after one that played into `cell`.
///
/// The opponent is sent to local board `cell` unless that board is closed,
/// in which case they may play anywhere.
#[instrument(level = "trace", skip(global, locals))]
pub fn next_active_board(global: &Grid, locals: &[Grid; 9], cell: usize) -> ActiveBoard {
    match locals.get(cell) {
        Some(local) if !is_closed(global, local, cell) => ActiveBoard::Board(cell),
        _ => ActiveBoard::Any,
    }
}
