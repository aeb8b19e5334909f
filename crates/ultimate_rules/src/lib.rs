//! Ultimate tic-tac-toe rules.
//!
//! A pure state machine for one nested game: nine local boards whose
//! winners claim the cells of a global board. No I/O happens here; the
//! server crate owns seating, broadcasting and connections.
//!
//! # Example
//!
//! ```
//! use ultimate_rules::{ActiveBoard, Board, Mark};
//!
//! let mut board = Board::new();
//! board.apply_move(Mark::X, 4, 4).unwrap();
//! assert_eq!(board.active_board(), ActiveBoard::Board(4));
//! assert_eq!(board.next_mover(), Mark::O);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod board;
pub mod invariants;
pub mod rules;
mod types;

pub use action::{Move, MoveError};
pub use board::{Board, SNAPSHOT_LEN, SNAPSHOT_PREFIX};
pub use types::{ActiveBoard, Cell, GRID_CELLS, Grid, Mark, Outcome};
