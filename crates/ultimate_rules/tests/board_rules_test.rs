//! Rules-level properties of the nested board.

use ultimate_rules::invariants::{BoardInvariants, InvariantSet};
use ultimate_rules::rules::LINES;
use ultimate_rules::{ActiveBoard, Board, Cell, Mark, MoveError, Outcome};

/// Plays a sequence of (board, cell) pairs for whoever is due to move.
fn play(board: &mut Board, moves: &[(usize, usize)]) {
    for &(local, cell) in moves {
        let mover = board.next_mover();
        board
            .apply_move(mover, local, cell)
            .unwrap_or_else(|e| panic!("{mover} {local}/{cell} rejected: {e}"));
    }
}

#[test]
fn test_center_opening_sets_constraint_and_flips_turn() {
    let mut board = Board::new();
    board.apply_move(Mark::X, 4, 4).expect("Valid opening");

    assert_eq!(board.active_board(), ActiveBoard::Board(4));
    assert_eq!(board.next_mover(), Mark::O);

    let snapshot = board.serialize();
    assert!(snapshot.ends_with("0104"), "snapshot tail was {snapshot}");
}

#[test]
fn test_top_row_of_board_two_claims_global_cell() {
    let mut board = Board::new();
    play(&mut board, &[(2, 0), (0, 2), (2, 1), (1, 2), (2, 2)]);

    assert_eq!(board.global().get(2), Some(Cell::Marked(Mark::X)));
    // Global cell 2 is the third code after the prefix.
    let snapshot = board.serialize();
    assert_eq!(&snapshot[7..13], "0000-1");
}

#[test]
fn test_every_line_on_a_local_board_decides_it() {
    for line in LINES {
        // Play cell 0 last so O is never sent into board 0 itself.
        let mut cells = line.to_vec();
        cells.sort_by_key(|&c| c == 0);
        let [a, b, c] = [cells[0], cells[1], cells[2]];

        let mut board = Board::new();
        // O answers in cell 0 of the board it is sent to, sending X back to 0.
        play(&mut board, &[(0, a), (a, 0), (0, b), (b, 0), (0, c)]);

        assert_eq!(board.global().get(0), Some(Cell::Marked(Mark::X)), "line {line:?}");
        assert!(BoardInvariants::check_all(&board).is_ok());
    }
}

#[test]
fn test_constraint_follows_cell_or_releases() {
    let mut board = Board::new();
    // X wins board 2, then later someone is sent to 2: constraint must be any.
    play(&mut board, &[(2, 0), (0, 2), (2, 1), (1, 2), (2, 2)]);
    assert_eq!(board.active_board(), ActiveBoard::Any);

    // O plays into cell 2 of board 5: board 2 is decided, so any.
    board.apply_move(Mark::O, 5, 2).unwrap();
    assert_eq!(board.active_board(), ActiveBoard::Any);

    // X plays cell 7 of board 5: board 7 is open, so 7.
    board.apply_move(Mark::X, 5, 7).unwrap();
    assert_eq!(board.active_board(), ActiveBoard::Board(7));
}

#[test]
fn test_rejections_never_mutate() {
    let mut board = Board::new();
    play(&mut board, &[(2, 0), (0, 2), (2, 1), (1, 2), (2, 2)]);
    let before = board.serialize();

    let attempts = [
        (Mark::O, 9, 0, MoveError::OutOfRange { board: 9, cell: 0 }),
        (Mark::X, 3, 3, MoveError::WrongTurn(Mark::X)),
        (Mark::O, 2, 8, MoveError::LocalBoardDecided(2)),
    ];
    for (mark, local, cell, expected) in attempts {
        assert_eq!(board.apply_move(mark, local, cell), Err(expected));
        assert_eq!(board.serialize(), before);
    }
    assert_eq!(board.history().len(), 5);
}

#[test]
fn test_accepted_moves_alternate_and_never_overwrite() {
    let mut board = Board::new();
    let mut accepted = 0;
    // Greedy walk: always play the lowest legal (board, cell).
    while board.outcome() == Outcome::InProgress && accepted < 81 {
        let mover = board.next_mover();
        let legal = (0..9)
            .flat_map(|b| (0..9).map(move |c| (b, c)))
            .find(|&(b, c)| board.clone().apply_move(mover, b, c).is_ok());
        let Some((b, c)) = legal else { break };

        let before: Vec<Cell> = board
            .locals()
            .iter()
            .flat_map(|g| g.cells().iter().copied())
            .collect();
        board.apply_move(mover, b, c).unwrap();
        accepted += 1;

        let after: Vec<Cell> = board
            .locals()
            .iter()
            .flat_map(|g| g.cells().iter().copied())
            .collect();
        for (index, (old, new)) in before.iter().zip(&after).enumerate() {
            if !old.is_empty() {
                assert_eq!(old, new, "cell {index} overwritten");
            }
        }
        assert_eq!(board.next_mover(), mover.opponent());
        assert!(BoardInvariants::check_all(&board).is_ok());
    }
    assert!(accepted > 0);
    assert_eq!(board.history().len(), accepted);
}

#[test]
fn test_snapshot_is_deterministic() {
    let mut a = Board::new();
    let mut b = Board::new();
    play(&mut a, &[(4, 4), (4, 0), (0, 8)]);
    play(&mut b, &[(4, 4), (4, 0), (0, 8)]);
    assert_eq!(a.serialize(), b.serialize());
    assert_eq!(a.serialize().len(), ultimate_rules::SNAPSHOT_LEN);
}

#[test]
fn test_global_row_wins_the_game() {
    let mut board = Board::new();
    // X takes the middle row of boards 0, 1 and 2; O is sent to boards 3-5
    // and answers with the cell that returns X to the board it needs.
    play(
        &mut board,
        &[
            (0, 3), (3, 0), (0, 4), (4, 0), (0, 5),
            (5, 1), (1, 3), (3, 1), (1, 4), (4, 1),
            (1, 5), (5, 2), (2, 3), (3, 2), (2, 4),
            (4, 2),
        ],
    );
    assert_eq!(board.outcome(), Outcome::InProgress);
    assert_eq!(board.global().get(3), Some(Cell::Marked(Mark::O)));

    board.apply_move(Mark::X, 2, 5).expect("Winning move");
    assert_eq!(board.outcome(), Outcome::Won(Mark::X));
    assert!(BoardInvariants::check_all(&board).is_ok());
}

#[test]
fn test_board_survives_json_round_trip() {
    let mut board = Board::new();
    play(&mut board, &[(4, 4), (4, 0), (0, 8), (8, 4)]);

    let json = serde_json::to_string(&board).expect("Board serializes");
    let restored: Board = serde_json::from_str(&json).expect("Board deserializes");
    assert_eq!(restored, board);
    assert_eq!(restored.serialize(), board.serialize());
}
