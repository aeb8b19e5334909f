//! Text wire protocol between clients and the server.

use std::str::FromStr;
use ultimate_rules::Mark;

/// A message pushed to a client.
///
/// `Display` renders the exact wire text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ServerMessage {
    /// Canonical board snapshot (already prefixed with `state: `).
    #[display("{}", _0)]
    State(String),
    /// Admission acknowledgement.
    #[display("connected {} {}", game_id, mark.code())]
    Connected {
        /// Pool slot the player was seated in.
        game_id: usize,
        /// Seat mark.
        mark: Mark,
    },
    /// Reconnection acknowledgement.
    #[display("reconnected {} {}", game_id, mark.code())]
    Reconnected {
        /// Pool slot of the rebound seat.
        game_id: usize,
        /// Seat mark.
        mark: Mark,
    },
    /// Reconnection was refused.
    #[display("reconnect failed")]
    ReconnectFailed,
    /// The pool has no open game.
    #[display("no capacity")]
    NoCapacity,
    /// Signed identity to present when reconnecting.
    #[display("token {}", _0)]
    Token(String),
}

/// A structural event sent by a client over an open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// `move <board> <cell>`
    Move {
        /// Target local board.
        board: usize,
        /// Target cell.
        cell: usize,
    },
}

/// A client frame that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ProtocolError {
    /// Blank frame.
    #[display("empty message")]
    Empty,
    /// First word is not a known command.
    #[display("unknown command: {}", _0)]
    UnknownCommand(#[error(not(source))] String),
    /// A required argument was absent.
    #[display("missing argument: {}", _0)]
    MissingArgument(#[error(not(source))] &'static str),
    /// An argument was not a non-negative integer.
    #[display("invalid number: {}", _0)]
    InvalidNumber(#[error(not(source))] String),
    /// More words than the command takes.
    #[display("unexpected trailing input")]
    TrailingInput,
}

fn parse_index(word: Option<&str>, name: &'static str) -> Result<usize, ProtocolError> {
    let word = word.ok_or(ProtocolError::MissingArgument(name))?;
    word.parse()
        .map_err(|_| ProtocolError::InvalidNumber(word.to_string()))
}

impl FromStr for ClientEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().ok_or(ProtocolError::Empty)?;

        let event = match command {
            "move" => ClientEvent::Move {
                board: parse_index(words.next(), "board")?,
                cell: parse_index(words.next(), "cell")?,
            },
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        if words.next().is_some() {
            return Err(ProtocolError::TrailingInput);
        }
        Ok(event)
    }
}
