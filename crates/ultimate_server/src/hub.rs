//! Fixed pool of games and the single coordinator that seats players in it.

use crate::connection::Connection;
use crate::game::{Game, GameStatus};
use crate::identity::{IdentityError, IdentityService, PlayerId};
use crate::protocol::ServerMessage;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};
use ultimate_rules::Mark;

/// A game slot shared between the hub and the connections seated in it.
///
/// The mutex is the per-game exclusion: whoever holds it is the only one
/// mutating that board, and a move plus its broadcast happen under one lock.
pub type SharedGame = Arc<Mutex<Game>>;

/// Depth of each hub mailbox queue.
const MAILBOX_DEPTH: usize = 64;

/// Where a connection ended up.
#[derive(Debug, Clone, derive_new::new)]
pub struct SeatTicket {
    /// Pool slot index.
    pub game_id: usize,
    /// Seat mark.
    pub mark: Mark,
    /// The game itself, for routing moves.
    pub game: SharedGame,
}

/// Admission and reconnection failures.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HubError {
    /// Every game in the pool is full.
    #[display("no open game among {} slots", capacity)]
    NoCapacity {
        /// Pool size.
        capacity: usize,
    },
    /// The requested game id is not in the pool.
    #[display("unknown game {}", _0)]
    UnknownGame(#[error(not(source))] usize),
    /// The presented token did not verify.
    #[display("identity rejected: {}", _0)]
    Identity(IdentityError),
    /// The verified identity holds neither seat of the game.
    #[display("identity does not match any seat of game {}", game_id)]
    IdentityMismatch {
        /// Game the client asked for.
        game_id: usize,
    },
    /// A third player was routed into a full game.
    #[display("seat overflow in game {}", game_id)]
    SeatOverflow {
        /// Offending game.
        game_id: usize,
    },
    /// A seat matched by identity turned out to be empty.
    #[display("seat vanished in game {}", game_id)]
    SeatVacant {
        /// Offending game.
        game_id: usize,
    },
    /// The hub task is no longer running.
    #[display("hub is shut down")]
    Shutdown,
}

impl HubError {
    /// True for broken internal invariants, as opposed to ordinary
    /// user-caused failures.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            HubError::SeatOverflow { .. } | HubError::SeatVacant { .. }
        )
    }
}

/// The game pool and its admission logic.
///
/// All seat-assignment mutations go through `&mut self`; once spawned, the
/// hub's task is the only owner, so admissions never interleave.
pub struct Hub {
    games: Vec<SharedGame>,
    identity: Arc<dyn IdentityService>,
}

impl Hub {
    /// Allocates `capacity` empty games.
    #[instrument(skip(identity))]
    pub fn new(capacity: usize, identity: Arc<dyn IdentityService>) -> Self {
        info!(capacity, "Creating game pool");
        let games = (0..capacity)
            .map(|id| Arc::new(Mutex::new(Game::new(id))))
            .collect();
        Self { games, identity }
    }

    /// Number of games in the pool.
    pub fn capacity(&self) -> usize {
        self.games.len()
    }

    /// The game in slot `id`.
    pub fn game(&self, id: usize) -> Option<SharedGame> {
        self.games.get(id).cloned()
    }

    /// First game that is empty or waiting for an opponent.
    pub async fn find_open_game(&self) -> Result<usize, HubError> {
        for (id, game) in self.games.iter().enumerate() {
            if game.lock().await.status() != GameStatus::Full {
                return Ok(id);
            }
        }
        Err(HubError::NoCapacity {
            capacity: self.capacity(),
        })
    }

    /// Seats a new connection in the first open game and acknowledges it.
    ///
    /// `grant` is the identity token to hand the player. It is sent only once
    /// a seat is secured, just before the `connected` ack. Completing a pair
    /// pushes the opening snapshot to both seats.
    #[instrument(skip(self, grant, connection), fields(connection_id = %connection.id()))]
    pub async fn register(
        &mut self,
        identity: PlayerId,
        grant: Option<String>,
        connection: Connection,
    ) -> Result<SeatTicket, HubError> {
        let game_id = match self.find_open_game().await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Admission failed: pool exhausted");
                let _ = connection.try_send(ServerMessage::NoCapacity.to_string());
                connection.close();
                return Err(e);
            }
        };

        let shared = self.games[game_id].clone();
        let mut game = shared.lock().await;
        let mark = game.register_player(identity, connection).map_err(|e| {
            error!(game_id, error = %e, "Defect: seat routing produced an overflow");
            HubError::SeatOverflow { game_id }
        })?;

        if mark == Mark::O && !game.seat(Mark::X).is_some_and(|seat| seat.is_connected()) {
            warn!(game_id, "Pairing with an opponent who has no live connection");
        }

        let ack = ServerMessage::Connected { game_id, mark }.to_string();
        let delivered = match grant {
            Some(token) => {
                let grant = ServerMessage::Token(token).to_string();
                game.deliver(mark, &grant).is_ok() && game.deliver(mark, &ack).is_ok()
            }
            None => game.deliver(mark, &ack).is_ok(),
        };
        if !delivered {
            warn!(game_id, %mark, "Admission ack undeliverable; connection dropped");
        }
        if game.status() == GameStatus::Full {
            game.broadcast_state();
        }

        info!(game_id, %mark, status = %game.status(), "Player admitted");
        drop(game);
        Ok(SeatTicket::new(game_id, mark, shared))
    }

    /// Rebinds a seat to a new connection if the token matches its identity.
    ///
    /// Any failure (unknown game, bad token, wrong identity) gets the same
    /// `reconnect failed` reply and leaves the pool untouched.
    #[instrument(skip(self, token, connection), fields(connection_id = %connection.id()))]
    pub async fn reconnect(
        &mut self,
        game_id: usize,
        token: &str,
        connection: Connection,
    ) -> Result<SeatTicket, HubError> {
        let (shared, mut game, mark) = match self.authorize(game_id, token).await {
            Ok(authorized) => authorized,
            Err(e) => {
                warn!(game_id, error = %e, "Reconnection refused");
                let _ = connection.try_send(ServerMessage::ReconnectFailed.to_string());
                connection.close();
                return Err(e);
            }
        };

        game.rebind(mark, connection).map_err(|e| {
            error!(game_id, error = %e, "Defect: matched seat is vacant");
            HubError::SeatVacant { game_id }
        })?;

        let ack = ServerMessage::Reconnected { game_id, mark }.to_string();
        let snapshot = ServerMessage::State(game.board().serialize()).to_string();
        let delivered = game.deliver(mark, &ack).is_ok() && game.deliver(mark, &snapshot).is_ok();
        if !delivered {
            warn!(game_id, %mark, "Reconnection ack undeliverable; connection dropped");
        }

        info!(game_id, %mark, "Player reconnected");
        drop(game);
        Ok(SeatTicket::new(game_id, mark, shared))
    }

    /// Resolves which seat of `game_id` the token's holder owns, returning
    /// the game locked so the seat cannot change before it is rebound.
    async fn authorize(
        &self,
        game_id: usize,
        token: &str,
    ) -> Result<(SharedGame, OwnedMutexGuard<Game>, Mark), HubError> {
        let shared = self.game(game_id).ok_or(HubError::UnknownGame(game_id))?;
        let player_id = self.identity.verify(token).map_err(HubError::Identity)?;

        let game = shared.clone().lock_owned().await;
        let mark = game
            .seat_for(&player_id)
            .ok_or(HubError::IdentityMismatch { game_id })?;
        debug!(game_id, %mark, %player_id, "Token matches seat");
        Ok((shared, game, mark))
    }

    /// Returns a concluded game's slot to the pool.
    ///
    /// A no-op (returning `false`) unless the game's board is concluded, so
    /// a late or duplicate release cannot clear a game in progress.
    #[instrument(skip(self))]
    pub async fn release(&mut self, game_id: usize) -> bool {
        let Some(shared) = self.game(game_id) else {
            warn!("Release for unknown game");
            return false;
        };
        let mut game = shared.lock().await;
        if !game.board().outcome().is_concluded() {
            debug!("Release ignored: game still in progress");
            return false;
        }
        game.reset();
        true
    }

    /// Moves the hub onto its own task and returns the handle that feeds it.
    pub fn spawn(self) -> HubHandle {
        let (admissions_tx, admissions) = mpsc::channel(MAILBOX_DEPTH);
        let (reconnections_tx, reconnections) = mpsc::channel(MAILBOX_DEPTH);
        let (releases_tx, releases) = mpsc::channel(MAILBOX_DEPTH);
        tokio::spawn(self.run(admissions, reconnections, releases));
        HubHandle {
            admissions: admissions_tx,
            reconnections: reconnections_tx,
            releases: releases_tx,
        }
    }

    /// The control loop: one request is fully handled before the next.
    async fn run(
        mut self,
        mut admissions: mpsc::Receiver<Admission>,
        mut reconnections: mpsc::Receiver<Reconnection>,
        mut releases: mpsc::Receiver<Release>,
    ) {
        info!(capacity = self.capacity(), "Hub running");
        loop {
            tokio::select! {
                Some(request) = admissions.recv() => {
                    let result = self
                        .register(request.identity, request.grant, request.connection)
                        .await;
                    let _ = request.reply.send(result);
                }
                Some(request) = reconnections.recv() => {
                    let result = self
                        .reconnect(request.game_id, &request.token, request.connection)
                        .await;
                    let _ = request.reply.send(result);
                }
                Some(request) = releases.recv() => {
                    let released = self.release(request.game_id).await;
                    let _ = request.reply.send(released);
                }
                else => break,
            }
        }
        info!("Hub stopped");
    }
}

#[derive(Debug)]
struct Admission {
    identity: PlayerId,
    grant: Option<String>,
    connection: Connection,
    reply: oneshot::Sender<Result<SeatTicket, HubError>>,
}

#[derive(Debug)]
struct Reconnection {
    game_id: usize,
    token: String,
    connection: Connection,
    reply: oneshot::Sender<Result<SeatTicket, HubError>>,
}

#[derive(Debug)]
struct Release {
    game_id: usize,
    reply: oneshot::Sender<bool>,
}

/// Cloneable front door to a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    admissions: mpsc::Sender<Admission>,
    reconnections: mpsc::Sender<Reconnection>,
    releases: mpsc::Sender<Release>,
}

impl HubHandle {
    /// Queues an admission and waits for its outcome.
    pub async fn register(
        &self,
        identity: PlayerId,
        grant: Option<String>,
        connection: Connection,
    ) -> Result<SeatTicket, HubError> {
        let (reply, outcome) = oneshot::channel();
        self.admissions
            .send(Admission {
                identity,
                grant,
                connection,
                reply,
            })
            .await
            .map_err(|_| HubError::Shutdown)?;
        outcome.await.map_err(|_| HubError::Shutdown)?
    }

    /// Queues a reconnection and waits for its outcome.
    pub async fn reconnect(
        &self,
        game_id: usize,
        token: String,
        connection: Connection,
    ) -> Result<SeatTicket, HubError> {
        let (reply, outcome) = oneshot::channel();
        self.reconnections
            .send(Reconnection {
                game_id,
                token,
                connection,
                reply,
            })
            .await
            .map_err(|_| HubError::Shutdown)?;
        outcome.await.map_err(|_| HubError::Shutdown)?
    }

    /// Reports that a game concluded so its slot can be recycled.
    ///
    /// Resolves once the hub has handled it; `true` if the slot was reset.
    pub async fn release(&self, game_id: usize) -> bool {
        let (reply, outcome) = oneshot::channel();
        if self.releases.send(Release { game_id, reply }).await.is_err() {
            warn!(game_id, "Release dropped: hub is shut down");
            return false;
        }
        outcome.await.unwrap_or(false)
    }
}
