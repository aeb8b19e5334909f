//! One two-seat game: a board, its seats, and state broadcasting.

use crate::connection::{Connection, ConnectionId, Disconnected};
use crate::identity::PlayerId;
use crate::protocol::ServerMessage;
use tracing::{debug, error, info, instrument, warn};
use ultimate_rules::{Board, Mark, MoveError, Outcome};

/// Occupancy of a game slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum GameStatus {
    /// No seats filled.
    Empty,
    /// Seat A filled, waiting for an opponent.
    Waiting,
    /// Both seats filled; moves are accepted.
    Full,
}

/// A seat: the durable identity plus whatever connection currently speaks for it.
#[derive(Debug)]
pub struct Seat {
    identity: PlayerId,
    connection: Option<Connection>,
}

impl Seat {
    /// The identity this seat was assigned to.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// True while a connection is bound and its reader is still there.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| !c.is_closed())
    }
}

/// Seating failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SeatError {
    /// Tried to seat a third player. Correct hub routing never does this.
    #[display("game {} already has two players", game_id)]
    Overflow {
        /// Offending game.
        game_id: usize,
    },
    /// Tried to rebind a seat nobody holds.
    #[display("seat {} is vacant", _0)]
    Vacant(#[error(not(source))] Mark),
}

/// Move failures at the game level.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GameError {
    /// Moves are only accepted once both seats are filled.
    #[display("game not ready ({})", _0)]
    #[from(ignore)]
    NotReady(#[error(not(source))] GameStatus),
    /// The board rejected the move.
    #[display("{}", _0)]
    Move(MoveError),
}

fn slot(mark: Mark) -> usize {
    match mark {
        Mark::X => 0,
        Mark::O => 1,
    }
}

/// A pool slot: one board and two seats.
///
/// Status is derived from the seats, so it always matches the filled-seat
/// count. Nothing here is synchronized; the owner must serialize access.
#[derive(Debug)]
pub struct Game {
    id: usize,
    seats: [Option<Seat>; 2],
    board: Board,
}

impl Game {
    /// Creates an empty game for pool slot `id`.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            seats: [None, None],
            board: Board::new(),
        }
    }

    /// Pool slot index.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current occupancy.
    pub fn status(&self) -> GameStatus {
        match &self.seats {
            [None, _] => GameStatus::Empty,
            [Some(_), None] => GameStatus::Waiting,
            [Some(_), Some(_)] => GameStatus::Full,
        }
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The seat for `mark`, if filled.
    pub fn seat(&self, mark: Mark) -> Option<&Seat> {
        self.seats[slot(mark)].as_ref()
    }

    /// Seats a new player: X first, then O.
    ///
    /// Seating into a full game is a routing defect; it is logged and
    /// rejected, and the offered connection is closed.
    #[instrument(skip(self, connection), fields(game_id = self.id, connection_id = %connection.id()))]
    pub fn register_player(
        &mut self,
        identity: PlayerId,
        connection: Connection,
    ) -> Result<Mark, SeatError> {
        let mark = match self.status() {
            GameStatus::Empty => Mark::X,
            GameStatus::Waiting => Mark::O,
            GameStatus::Full => {
                error!(player_id = %identity, "Seat overflow: game already full");
                return Err(SeatError::Overflow { game_id: self.id });
            }
        };

        info!(player_id = %identity, %mark, "Player seated");
        self.seats[slot(mark)] = Some(Seat {
            identity,
            connection: Some(connection),
        });
        Ok(mark)
    }

    /// Finds the seat holding `identity`.
    pub fn seat_for(&self, identity: &str) -> Option<Mark> {
        [Mark::X, Mark::O]
            .into_iter()
            .find(|&mark| self.seat(mark).is_some_and(|seat| seat.identity == identity))
    }

    /// Finds the seat currently bound to `connection_id`.
    pub fn seat_of(&self, connection_id: ConnectionId) -> Option<Mark> {
        [Mark::X, Mark::O].into_iter().find(|&mark| {
            self.seat(mark)
                .and_then(|seat| seat.connection.as_ref())
                .is_some_and(|connection| connection.id() == connection_id)
        })
    }

    /// Points a filled seat at a new connection, closing the previous one.
    #[instrument(skip(self, connection), fields(game_id = self.id, connection_id = %connection.id()))]
    pub fn rebind(&mut self, mark: Mark, connection: Connection) -> Result<(), SeatError> {
        let seat = self.seats[slot(mark)]
            .as_mut()
            .ok_or(SeatError::Vacant(mark))?;
        if let Some(previous) = seat.connection.replace(connection) {
            debug!(previous = %previous.id(), "Closing superseded connection");
            previous.close();
        }
        info!(%mark, player_id = %seat.identity, "Seat rebound");
        Ok(())
    }

    /// Sends one message to one seat without waiting.
    ///
    /// If the seat's queue cannot take it, the connection is dropped from
    /// the seat (closing it). The seat itself and its identity remain.
    pub fn deliver(&mut self, mark: Mark, message: &str) -> Result<(), Disconnected> {
        let game_id = self.id;
        let seat = self.seats[slot(mark)].as_mut().ok_or(Disconnected::Closed)?;
        let connection = seat.connection.as_ref().ok_or(Disconnected::Closed)?;

        let Err(e) = connection.try_send(message) else {
            return Ok(());
        };
        warn!(game_id, %mark, connection_id = %connection.id(), error = %e, "Dropping connection");
        if let Some(dropped) = seat.connection.take() {
            dropped.close();
        }
        Err(e)
    }

    /// Pushes the canonical snapshot to every connected seat.
    ///
    /// Returns how many seats accepted it.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn broadcast_state(&mut self) -> usize {
        let snapshot = ServerMessage::State(self.board.serialize()).to_string();
        [Mark::X, Mark::O]
            .into_iter()
            .filter(|&mark| self.deliver(mark, &snapshot).is_ok())
            .count()
    }

    /// Applies a move for `mover` and broadcasts the resulting state.
    ///
    /// The broadcast happens whether or not the board accepted the move, so
    /// a rejected move shows up to clients as an unchanged snapshot.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn make_move(&mut self, mover: Mark, board: usize, cell: usize) -> Result<Outcome, GameError> {
        let status = self.status();
        if status != GameStatus::Full {
            warn!(%status, "Move before game is ready");
            return Err(GameError::NotReady(status));
        }

        let applied = self.board.apply_move(mover, board, cell);
        self.broadcast_state();
        applied?;

        let outcome = self.board.outcome();
        if outcome.is_concluded() {
            info!(?outcome, moves = self.board.history().len(), "Game concluded");
        }
        Ok(outcome)
    }

    /// Clears both seats (closing their connections) and the board.
    #[instrument(skip(self), fields(game_id = self.id, status = %self.status()))]
    pub fn reset(&mut self) {
        for seat in self.seats.iter_mut().filter_map(Option::take) {
            if let Some(connection) = seat.connection {
                connection.close();
            }
        }
        self.board.reset();
        info!("Game slot reset");
    }
}
