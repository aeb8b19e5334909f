//! Ultimate tic-tac-toe session server.
//!
//! Matches arriving players into a fixed pool of two-seat games and keeps
//! both seats' views of a game in sync, including across reconnection.
//!
//! # Architecture
//!
//! - **Hub**: the pool of games and the single task that seats players
//! - **Game**: one board, two seats, best-effort state broadcast
//! - **Connection**: send-or-drop outbound queue for one participant
//! - **Identity**: signed tokens tying a reconnect to its original seat
//! - **Transport**: axum WebSocket pumps in front of the hub
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ultimate_server::{AppState, Hub, JwtIdentity, router};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let identity = Arc::new(JwtIdentity::new(b"secret", JwtIdentity::DEFAULT_TTL));
//! let hub = Hub::new(100, identity.clone()).spawn();
//! let app = router(AppState::new(hub, identity, 32));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod connection;
mod game;
mod hub;
mod identity;
mod protocol;
mod transport;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Connections
pub use connection::{Connection, ConnectionId, Disconnected};

// Crate-level exports - Games and the pool
pub use game::{Game, GameError, GameStatus, Seat, SeatError};
pub use hub::{Hub, HubError, HubHandle, SeatTicket, SharedGame};

// Crate-level exports - Identity
pub use identity::{Claims, IdentityError, IdentityService, JwtIdentity, PlayerId};

// Crate-level exports - Wire protocol
pub use protocol::{ClientEvent, ProtocolError, ServerMessage};

// Crate-level exports - Transport
pub use transport::{AppState, ConnectParams, router};
