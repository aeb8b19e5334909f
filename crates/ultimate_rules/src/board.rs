//! The nested ultimate tic-tac-toe board.

use crate::action::{Move, MoveError};
use crate::invariants::{BoardInvariants, InvariantSet};
use crate::rules::{check_winner, is_closed, is_won_by, next_active_board};
use crate::types::{ActiveBoard, Cell, GRID_CELLS, Grid, Mark, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, instrument, trace};

/// Prefix of every canonical state snapshot.
pub const SNAPSHOT_PREFIX: &str = "state: ";

/// Byte length of a canonical snapshot: prefix + (9 + 81 + 1 + 1) two-digit codes.
pub const SNAPSHOT_LEN: usize = SNAPSHOT_PREFIX.len() + 2 * (GRID_CELLS + GRID_CELLS * GRID_CELLS + 2);

/// Full state of one ultimate tic-tac-toe game.
///
/// The global grid records which mark won each local board. Everything else
/// is control state: who moves next, where they may move, and the move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub(crate) global: Grid,
    pub(crate) locals: [Grid; GRID_CELLS],
    pub(crate) next_mover: Mark,
    pub(crate) active: ActiveBoard,
    pub(crate) history: Vec<Move>,
}

impl Board {
    /// Creates an empty board with X to move anywhere.
    pub fn new() -> Self {
        Self {
            global: Grid::new(),
            locals: [Grid::new(); GRID_CELLS],
            next_mover: Mark::X,
            active: ActiveBoard::Any,
            history: Vec::with_capacity(GRID_CELLS * GRID_CELLS),
        }
    }

    /// The global grid (per-local-board outcome).
    pub fn global(&self) -> &Grid {
        &self.global
    }

    /// The local board at `index`.
    pub fn local(&self, index: usize) -> Option<&Grid> {
        self.locals.get(index)
    }

    /// All nine local boards.
    pub fn locals(&self) -> &[Grid; GRID_CELLS] {
        &self.locals
    }

    /// The mark due to play.
    pub fn next_mover(&self) -> Mark {
        self.next_mover
    }

    /// Where the next move must go.
    pub fn active_board(&self) -> ActiveBoard {
        self.active
    }

    /// Accepted moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Validates and applies a move.
    ///
    /// Checks run in a fixed order: index range, turn, active-board
    /// constraint, decided local board, occupied cell. The first failing
    /// check is returned and the board is left untouched.
    #[instrument(skip(self), fields(next = %self.next_mover, active = ?self.active))]
    pub fn apply_move(&mut self, mover: Mark, board: usize, cell: usize) -> Result<(), MoveError> {
        self.validate(mover, board, cell).inspect_err(|e| {
            debug!(error = %e, "Move rejected");
        })?;

        let local = &mut self.locals[board];
        local
            .set(cell, Cell::Marked(mover))
            .map_err(|_| MoveError::OutOfRange { board, cell })?;

        if is_won_by(local, mover) {
            debug!(board, mark = %mover, "Local board decided");
            self.global
                .set(board, Cell::Marked(mover))
                .map_err(|_| MoveError::OutOfRange { board, cell })?;
        }

        self.active = next_active_board(&self.global, &self.locals, cell);
        self.next_mover = mover.opponent();
        self.history.push(Move::new(mover, board, cell));

        trace!(moves = self.history.len(), active = ?self.active, "Move applied");
        debug_assert!(
            BoardInvariants::check_all(self).is_ok(),
            "Board invariants violated after {mover} played {board}/{cell}"
        );

        Ok(())
    }

    fn validate(&self, mover: Mark, board: usize, cell: usize) -> Result<(), MoveError> {
        if board >= GRID_CELLS || cell >= GRID_CELLS {
            return Err(MoveError::OutOfRange { board, cell });
        }

        if mover != self.next_mover {
            return Err(MoveError::WrongTurn(mover));
        }

        if let ActiveBoard::Board(required) = self.active
            && required != board
        {
            return Err(MoveError::WrongLocalBoard {
                requested: board,
                required,
            });
        }

        if self.global.get(board) != Some(Cell::Empty) {
            return Err(MoveError::LocalBoardDecided(board));
        }

        if !self.locals[board].is_empty(cell) {
            return Err(MoveError::CellOccupied { board, cell });
        }

        Ok(())
    }

    /// The game result read off the global grid.
    pub fn outcome(&self) -> Outcome {
        if let Some(winner) = check_winner(&self.global) {
            return Outcome::Won(winner);
        }

        let playable = (0..GRID_CELLS).any(|index| !is_closed(&self.global, &self.locals[index], index));
        if playable {
            Outcome::InProgress
        } else {
            Outcome::Draw
        }
    }

    /// Renders the canonical fixed-width state snapshot.
    ///
    /// `state: ` followed by two-digit signed codes for the nine global
    /// cells, the 81 local cells in board-major order, the next mover and
    /// the active board (`-1` for any).
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(SNAPSHOT_LEN);
        out.push_str(SNAPSHOT_PREFIX);

        let codes = self
            .global
            .cells()
            .iter()
            .chain(self.locals.iter().flat_map(|local| local.cells().iter()))
            .map(|cell| cell.code())
            .chain([self.next_mover.code(), self.active.code()]);

        for code in codes {
            // Writing into a String cannot fail.
            let _ = write!(out, "{code:02}");
        }

        out
    }

    /// Restores the initial empty configuration in place.
    #[instrument(skip(self), fields(moves = self.history.len()))]
    pub fn reset(&mut self) {
        self.global.reset();
        for local in &mut self.locals {
            local.reset();
        }
        self.next_mover = Mark::X;
        self.active = ActiveBoard::Any;
        self.history.clear();
        debug!("Board reset");
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
