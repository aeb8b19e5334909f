//! Game rules for ultimate tic-tac-toe.
//!
//! Pure functions over grids. Rules are kept apart from board storage so the
//! same line check serves both the local boards and the global board.

pub mod draw;
pub mod win;

pub use draw::{is_closed, next_active_board};
pub use win::{LINES, check_winner, is_won_by};
