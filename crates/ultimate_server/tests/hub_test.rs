//! End-to-end session scenarios against a running hub.

use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use ultimate_rules::{Board, Mark, Outcome};
use ultimate_server::{
    Connection, GameStatus, Hub, HubError, HubHandle, IdentityService, JwtIdentity, SeatTicket,
};

struct Player {
    id: String,
    ticket: SeatTicket,
    connection_id: ultimate_server::ConnectionId,
    inbox: Receiver<String>,
}

impl Player {
    async fn join(hub: &HubHandle, id: &str) -> Self {
        let (connection, inbox) = Connection::channel(128);
        let connection_id = connection.id();
        let ticket = hub.register(id.to_string(), None, connection).await.unwrap();
        Self {
            id: id.to_string(),
            ticket,
            connection_id,
            inbox,
        }
    }

    /// Plays as whatever seat this player's live connection holds.
    async fn play(&self, board: usize, cell: usize) -> Option<Outcome> {
        let mut game = self.ticket.game.lock().await;
        let mark = game.seat_of(self.connection_id)?;
        game.make_move(mark, board, cell).ok()
    }

    fn drain(&mut self) -> Vec<String> {
        std::iter::from_fn(|| self.inbox.try_recv().ok()).collect()
    }
}

fn setup(capacity: usize) -> (HubHandle, Arc<JwtIdentity>) {
    let identity = Arc::new(JwtIdentity::new(b"integration", JwtIdentity::DEFAULT_TTL));
    (Hub::new(capacity, identity.clone()).spawn(), identity)
}

#[tokio::test]
async fn test_two_players_share_a_game() {
    let (hub, _) = setup(4);
    let mut a = Player::join(&hub, "a").await;
    assert_eq!(a.ticket.game.lock().await.status(), GameStatus::Waiting);
    let mut b = Player::join(&hub, "b").await;

    assert_eq!(a.ticket.game_id, b.ticket.game_id);
    assert_eq!((a.ticket.mark, b.ticket.mark), (Mark::X, Mark::O));
    assert_eq!(b.ticket.game.lock().await.status(), GameStatus::Full);

    assert_eq!(a.drain(), vec!["connected 0 -1".to_string(), Board::new().serialize()]);
    assert_eq!(b.drain(), vec!["connected 0 1".to_string(), Board::new().serialize()]);
}

#[tokio::test]
async fn test_center_opening_constrains_opponent() {
    let (hub, _) = setup(1);
    let mut a = Player::join(&hub, "a").await;
    let mut b = Player::join(&hub, "b").await;
    a.drain();
    b.drain();

    assert_eq!(a.play(4, 4).await, Some(Outcome::InProgress));
    let seen_a = a.drain();
    let seen_b = b.drain();
    assert_eq!(seen_a, seen_b);
    // Next mover O (01), active board 4 (04).
    assert!(seen_a[0].ends_with("0104"));
}

#[tokio::test]
async fn test_moves_from_the_wrong_seat_change_nothing() {
    let (hub, _) = setup(1);
    let mut a = Player::join(&hub, "a").await;
    let b = Player::join(&hub, "b").await;
    a.drain();

    // O tries to open.
    assert_eq!(b.play(4, 4).await, None);
    assert_eq!(a.drain(), vec![Board::new().serialize()]);
}

#[tokio::test]
async fn test_pool_exhaustion() {
    let (hub, _) = setup(2);
    let mut players = Vec::new();
    for id in ["a", "b", "c", "d"] {
        players.push(Player::join(&hub, id).await);
    }

    let (connection, mut inbox) = Connection::channel(4);
    let err = hub.register("e".into(), Some("e-token".into()), connection).await.unwrap_err();
    assert_eq!(err, HubError::NoCapacity { capacity: 2 });
    assert!(!err.is_defect());
    assert_eq!(inbox.recv().await.unwrap(), "no capacity");
    assert_eq!(inbox.recv().await, None);

    for player in &players {
        let game = player.ticket.game.lock().await;
        assert_eq!(game.status(), GameStatus::Full);
        assert_eq!(game.seat(player.ticket.mark).unwrap().identity(), player.id);
    }
}

#[tokio::test]
async fn test_reconnection_resumes_seat() {
    let (hub, identity) = setup(1);
    let mut a = Player::join(&hub, "a").await;
    let mut b = Player::join(&hub, "b").await;
    a.play(4, 4).await;
    b.drain();

    let (connection, mut inbox) = Connection::channel(8);
    let token = identity.mint("b").unwrap();
    let resumed = hub.reconnect(0, token, connection).await.unwrap();
    assert_eq!(resumed.mark, Mark::O);

    let snapshot = a.ticket.game.lock().await.board().serialize();
    assert_eq!(inbox.recv().await.unwrap(), "reconnected 0 1");
    assert_eq!(inbox.recv().await.unwrap(), snapshot);

    // The old connection is closed and no longer speaks for the seat.
    assert_eq!(b.inbox.recv().await, None);
    assert_eq!(b.play(4, 0).await, None);
    a.drain();
}

#[tokio::test]
async fn test_mismatched_reconnection_is_idempotent() {
    let (hub, identity) = setup(1);
    let a = Player::join(&hub, "a").await;
    let _b = Player::join(&hub, "b").await;
    let token = identity.mint("intruder").unwrap();

    for _ in 0..3 {
        let (connection, mut inbox) = Connection::channel(4);
        let err = hub.reconnect(0, token.clone(), connection).await.unwrap_err();
        assert_eq!(err, HubError::IdentityMismatch { game_id: 0 });
        assert_eq!(inbox.recv().await.unwrap(), "reconnect failed");
        assert_eq!(inbox.recv().await, None);
    }

    let game = a.ticket.game.lock().await;
    assert_eq!(game.seat_for("a"), Some(Mark::X));
    assert_eq!(game.seat_for("b"), Some(Mark::O));
    assert_eq!(game.board(), &Board::new());
}

#[tokio::test]
async fn test_concluded_game_is_released() {
    let (hub, _) = setup(1);
    let mut a = Player::join(&hub, "a").await;
    let mut b = Player::join(&hub, "b").await;

    // X takes the middle row of boards 0, 1 and 2 (the global top row),
    // sending O to boards 3-5. O answers in the cell that sends X back to
    // the board it is working on.
    let script = [
        (0, 3), (3, 0), (0, 4), (4, 0), (0, 5),
        (5, 1), (1, 3), (3, 1), (1, 4), (4, 1),
        (1, 5), (5, 2), (2, 3), (3, 2), (2, 4),
        (4, 2), (2, 5),
    ];
    let mut last = None;
    for (i, &(board, cell)) in script.iter().enumerate() {
        let player = if i % 2 == 0 { &a } else { &b };
        last = player.play(board, cell).await;
        assert!(last.is_some(), "move {i} ({board}, {cell}) rejected");
    }
    assert_eq!(last, Some(Outcome::Won(Mark::X)));

    // Both seats got the final snapshot.
    let final_a = a.drain().pop().unwrap();
    let final_b = b.drain().pop().unwrap();
    assert_eq!(final_a, final_b);

    assert!(hub.release(0).await);
    assert!(!hub.release(0).await);
    let (c, _inbox) = Connection::channel(4);
    let ticket = hub.register("c".into(), None, c).await.unwrap();
    assert_eq!((ticket.game_id, ticket.mark), (0, Mark::X));
    assert_eq!(ticket.game.lock().await.board().history().len(), 0);
}
