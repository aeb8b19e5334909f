//! Win detection on a single grid.

use crate::types::{Cell, Grid, Mark};
use tracing::instrument;

/// The eight winning lines: three rows, three columns, two diagonals.
pub const LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Checks whether `mark` holds a complete line on the grid.
#[instrument(level = "trace", skip(grid))]
pub fn is_won_by(grid: &Grid, mark: Mark) -> bool {
    let target = Some(Cell::Marked(mark));
    LINES
        .iter()
        .any(|line| line.iter().all(|&index| grid.get(index) == target))
}

/// Returns the mark holding a complete line, if any.
#[instrument(level = "trace", skip(grid))]
pub fn check_winner(grid: &Grid) -> Option<Mark> {
    for [a, b, c] in LINES {
        let cell = grid.get(a);
        if cell != Some(Cell::Empty) && cell == grid.get(b) && cell == grid.get(c) {
            return cell.and_then(Cell::mark);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn grid_with(mark: Mark, indices: &[usize]) -> Grid {
        let mut grid = Grid::new();
        for &index in indices {
            grid.set(index, Cell::Marked(mark)).unwrap();
        }
        grid
    }

    #[test]
    fn test_no_winner_empty_grid() {
        let grid = Grid::new();
        assert_eq!(check_winner(&grid), None);
        assert!(!is_won_by(&grid, Mark::X));
    }

    #[test]
    fn test_every_line_wins_for_every_mark() {
        for mark in Mark::iter() {
            for line in LINES {
                let grid = grid_with(mark, &line);
                assert!(is_won_by(&grid, mark), "{line:?} should win for {mark}");
                assert!(!is_won_by(&grid, mark.opponent()));
                assert_eq!(check_winner(&grid), Some(mark));
            }
        }
    }

    #[test]
    fn test_only_lines_win() {
        // Every 3-cell subset that is not one of the eight lines must not win.
        for a in 0..9 {
            for b in (a + 1)..9 {
                for c in (b + 1)..9 {
                    let grid = grid_with(Mark::X, &[a, b, c]);
                    let is_line = LINES.contains(&[a, b, c]);
                    assert_eq!(is_won_by(&grid, Mark::X), is_line, "cells {a},{b},{c}");
                }
            }
        }
    }

    #[test]
    fn test_mixed_line_does_not_win() {
        let mut grid = grid_with(Mark::X, &[0, 1]);
        grid.set(2, Cell::Marked(Mark::O)).unwrap();
        assert_eq!(check_winner(&grid), None);
    }
}
