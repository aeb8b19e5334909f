//! Core domain types for ultimate tic-tac-toe.

use serde::{Deserialize, Serialize};

/// Number of cells in a grid, and number of local boards in a game.
pub const GRID_CELLS: usize = 9;

/// A player's mark.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum Mark {
    /// Mark X (moves first, seat A).
    X,
    /// Mark O (moves second, seat B).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Wire code for this mark: `-1` for X, `1` for O.
    pub fn code(self) -> i8 {
        match self {
            Mark::X => -1,
            Mark::O => 1,
        }
    }

    /// Parses a wire code back into a mark.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Mark::X),
            1 => Some(Mark::O),
            _ => None,
        }
    }
}

/// A single cell, on a local board or on the global board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing played (or, on the global board, not yet decided).
    #[default]
    Empty,
    /// Claimed by a mark.
    Marked(Mark),
}

impl Cell {
    /// Wire code: `0` when empty, otherwise the mark's code.
    pub fn code(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Marked(mark) => mark.code(),
        }
    }

    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Marked(mark) => Some(mark),
        }
    }

    /// True if nothing occupies the cell.
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// A 3x3 grid of cells in row-major order (0-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Grid {
    cells: [Cell; GRID_CELLS],
}

impl Grid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cell at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Checks whether the cell at `index` is empty. Out-of-range is never empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// Sets the cell at `index`.
    pub(crate) fn set(&mut self, index: usize, cell: Cell) -> Result<(), &'static str> {
        let slot = self.cells.get_mut(index).ok_or("Cell index out of bounds")?;
        *slot = cell;
        Ok(())
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[Cell; GRID_CELLS] {
        &self.cells
    }

    /// True when every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    /// Clears every cell.
    pub fn reset(&mut self) {
        self.cells = [Cell::Empty; GRID_CELLS];
    }

    /// Formats the grid as three rows of `X`, `O` and `.`.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                result.push(match self.cells[row * 3 + col] {
                    Cell::Empty => '.',
                    Cell::Marked(Mark::X) => 'X',
                    Cell::Marked(Mark::O) => 'O',
                });
            }
            if row < 2 {
                result.push('\n');
            }
        }
        result
    }
}

/// Which local board the next move must target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActiveBoard {
    /// Any undecided local board.
    #[default]
    Any,
    /// Only the local board with this index.
    Board(usize),
}

impl ActiveBoard {
    /// Wire code: `-1` for any, otherwise the board index.
    pub fn code(self) -> i8 {
        match self {
            ActiveBoard::Any => -1,
            // Board indices are always < 9.
            ActiveBoard::Board(index) => index as i8,
        }
    }

    /// Whether a move into `board` satisfies this constraint.
    pub fn permits(self, board: usize) -> bool {
        match self {
            ActiveBoard::Any => true,
            ActiveBoard::Board(index) => index == board,
        }
    }
}

/// Result of the whole game, read off the global grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Moves are still possible and nobody holds a global line.
    InProgress,
    /// A mark completed a line on the global grid.
    Won(Mark),
    /// No local board can take another move and nobody won.
    Draw,
}

impl Outcome {
    /// True once the game is won or drawn.
    pub fn is_concluded(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}
