//! The round-trip laws: make then unmake restores every field, attack table
//! and hash included, for every kind of move the variants know.

use std::str::FromStr;

use moonrise::board::{Board, MoveList, Rules};
use moonrise::notation::parse_move;

fn play(b: &mut Board, text: &str) {
    let m = parse_move(b, text).unwrap_or_else(|| panic!("{text} should be legal"));
    b.make(m);
    b.assert_valid();
}

#[test]
fn ten_moves_of_a_real_game_round_trip_exactly() {
    let mut b = Board::new(Rules::Crazyhouse);
    let line = [
        "e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "g8f6", "O-O", "f6e4", "d2d4", "e5d4",
    ];
    for text in line {
        play(&mut b, text);
    }
    assert_eq!(b.move_num(), 11);

    for _ in 0..10 {
        b.unmake();
        b.assert_valid();
    }
    assert_eq!(b.snapshot(), Board::new(Rules::Crazyhouse).snapshot());
}

#[test]
fn every_legal_move_round_trips_in_a_loaded_position() {
    // A middlegame with holdings, promoted pieces, castling rights and an
    // en-passant square all live at once.
    let fen = "r3k2r/pPpq1ppp/2n2n2/3pp3/1b2P3/2NQ~1N2/PPPP1PPP/R1B1K2R[RBnp] w KQkq d6";
    let mut b = Board::from_str(fen).unwrap();
    b.assert_valid();

    let mut legal = MoveList::new();
    b.legal_moves(&mut legal);
    assert!(legal.len() > 40, "expected a rich position, got {}", legal.len());

    let before = b.snapshot();
    for &m in legal.iter() {
        b.make(m);
        b.assert_valid();
        b.unmake();
        assert_eq!(b.snapshot(), before, "round trip failed for {m}");
    }
}

#[test]
fn every_legal_move_round_trips_in_bughouse_too() {
    let fen = "r3k2r/pPpq1ppp/2n2n2/3pp3/1b2P3/2NQ2N1/PPPP1PPP/R1B1K2R[RBnp] b KQkq -";
    let mut b = Board::new(Rules::Bughouse);
    b.set_position(fen).unwrap();

    let mut legal = MoveList::new();
    b.legal_moves(&mut legal);
    let before = b.snapshot();
    for &m in legal.iter() {
        b.make(m);
        b.unmake();
        assert_eq!(b.snapshot(), before, "round trip failed for {m}");
    }
}

#[test]
fn null_move_round_trip_in_a_position_with_en_passant() {
    let mut b = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6").unwrap();
    let before = b.snapshot();
    b.make_null();
    b.unmake_null();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn deep_make_unmake_stack_unwinds_cleanly() {
    let mut b = Board::new(Rules::Crazyhouse);
    let mut legal = MoveList::new();
    let before = b.snapshot();
    let mut depth = 0;
    // March down a greedy line, then all the way back.
    for _ in 0..40 {
        b.legal_moves(&mut legal);
        let Some(&m) = legal.first() else { break };
        b.make(m);
        depth += 1;
    }
    for _ in 0..depth {
        b.unmake();
    }
    b.assert_valid();
    assert_eq!(b.snapshot(), before);
}
