//! Handle to one live participant's outbound queue.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier, used for routing and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("conn-{}", _0)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Why an outbound message could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Disconnected {
    /// The queue is at capacity; the peer is not keeping up.
    #[display("outbound queue full")]
    QueueFull,
    /// The queue's reader is gone, or there is no live connection at all.
    #[display("connection closed")]
    Closed,
}

/// The sending half of a connection.
///
/// Delivery is best-effort and never waits. The handle is deliberately not
/// `Clone`: dropping it (or calling [`Connection::close`]) closes the
/// outbound queue, which is the only disconnect signal the writer pump sees.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
}

impl Connection {
    /// Wraps an existing outbound queue.
    pub fn new(outbound: mpsc::Sender<String>) -> Self {
        Self {
            id: ConnectionId::next(),
            outbound,
        }
    }

    /// Creates a connection with a fresh bounded queue, returning the
    /// receiving half for the writer pump.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// This connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a message without waiting.
    pub fn try_send(&self, message: impl Into<String>) -> Result<(), Disconnected> {
        match self.outbound.try_send(message.into()) {
            Ok(()) => {
                trace!(connection_id = %self.id, "Message queued");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(Disconnected::QueueFull),
            Err(TrySendError::Closed(_)) => Err(Disconnected::Closed),
        }
    }

    /// True once the reading side has gone away.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Closes the outbound queue. Already queued messages still drain.
    pub fn close(self) {
        trace!(connection_id = %self.id, "Connection closed");
    }
}
