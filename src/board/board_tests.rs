use std::str::FromStr;

use super::*;
use crate::moves::types::Move;

fn sq(s: &str) -> Square {
    Square::from_str(s).unwrap()
}

#[test]
fn start_position_attack_counts() {
    let b = Board::new(Rules::Crazyhouse);
    assert_eq!(b.attacks, b.recompute_attacks());
    // f3 is covered by the e2 and g2 pawns and the g1 knight.
    assert_eq!(b.attack_count(Color::White, sq("f3")), 3);
    // e4 is nobody's yet.
    assert_eq!(b.attack_count(Color::White, sq("e4")), 0);
    // The kings defend their neighborhoods.
    assert_eq!(b.attack_count(Color::White, sq("e2")), 4);
    b.assert_valid();
}

#[test]
fn make_unmake_is_identity_for_a_quiet_move() {
    let mut b = Board::new(Rules::Crazyhouse);
    let before = b.snapshot();
    b.make(Move::new(sq("e2"), sq("e4"), Piece::Pawn));
    assert_eq!(b.en_passant_square(), sq("e3"));
    b.assert_valid();
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn capture_feeds_the_hand_in_crazyhouse() {
    let mut b = Board::from_str("4k3/8/8/3p4/4P3/8/8/4K3 w - -").unwrap();
    let before = b.snapshot();
    b.make(Move::new(sq("e4"), sq("d5"), Piece::Pawn));
    assert_eq!(b.in_hand(Color::White, Piece::Pawn), 1);
    b.assert_valid();
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn bughouse_capture_leaves_the_hand_alone() {
    let mut b = Board::new(Rules::Bughouse);
    b.set_position("4k3/8/8/3p4/4P3/8/8/4K3 w - -").unwrap();
    let before = b.snapshot();
    b.make(Move::new(sq("e4"), sq("d5"), Piece::Pawn));
    assert_eq!(b.in_hand(Color::White, Piece::Pawn), 0);
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn drop_round_trip_updates_hand_and_hash() {
    let mut b = Board::from_str("4k3/8/8/8/8/8/8/4K3[N] w - -").unwrap();
    let before = b.snapshot();
    b.make(Move::drop(Piece::Knight, sq("f6")));
    assert_eq!(b.in_hand(Color::White, Piece::Knight), 0);
    assert_eq!(b.piece_on(sq("f6")), Piece::Knight);
    b.assert_valid();
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn en_passant_round_trip() {
    let mut b = Board::from_str("4k3/8/8/8/2p5/8/3P4/4K3 w - -").unwrap();
    b.make(Move::new(sq("d2"), sq("d4"), Piece::Pawn));
    assert_eq!(b.en_passant_square(), sq("d3"));
    let mid = b.snapshot();
    b.make(Move::new(sq("c4"), sq("d3"), Piece::Pawn));
    assert_eq!(b.piece_on(sq("d4")), Piece::None);
    assert_eq!(b.piece_on(sq("d3")), Piece::Pawn);
    assert_eq!(b.in_hand(Color::Black, Piece::Pawn), 1);
    b.assert_valid();
    b.unmake();
    assert_eq!(b.snapshot(), mid);
}

#[test]
fn castling_moves_the_rook_and_burns_the_rights() {
    let mut b = Board::from_str("4k3/8/8/8/8/8/8/4K2R w K -").unwrap();
    let before = b.snapshot();
    b.make(Move::new(E1, G1, Piece::King));
    assert_eq!(b.piece_on(F1), Piece::Rook);
    assert_eq!(b.piece_on(H1), Piece::None);
    assert_eq!(b.king_square(Color::White), G1);
    assert!(!b.can_castle[0][KING_SIDE]);
    b.assert_valid();
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn promotion_marks_the_square_and_capture_reverts_to_pawn() {
    let mut b = Board::from_str("3r3k/2P5/8/8/8/8/8/4K3 w - -").unwrap();
    let before = b.snapshot();
    b.make(Move::promoting(sq("c7"), sq("d8"), Piece::Pawn, Piece::Queen));
    assert!(b.promoted_pawns.has(sq("d8")));
    assert_eq!(b.in_hand(Color::White, Piece::Rook), 1);
    b.assert_valid();

    // Black has nothing to take with except the king.
    b.make(Move::new(sq("h8"), sq("g7"), Piece::King));
    b.unmake();
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn capturing_a_promoted_piece_yields_a_pawn() {
    let mut b = Board::from_str("2q~3k1/8/8/8/8/8/8/2R3K1[] w - -").unwrap();
    assert!(b.promoted_pawns.has(sq("c8")));
    let before = b.snapshot();
    b.make(Move::new(sq("c1"), sq("c8"), Piece::Rook));
    assert_eq!(b.in_hand(Color::White, Piece::Pawn), 1);
    assert_eq!(b.in_hand(Color::White, Piece::Queen), 0);
    b.unmake();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn null_move_round_trip_is_total_identity() {
    let mut b = Board::new(Rules::Crazyhouse);
    b.make(Move::new(sq("e2"), sq("e4"), Piece::Pawn));
    let before = b.snapshot();
    b.make_null();
    assert_eq!(b.to_move(), Color::White);
    assert_eq!(b.en_passant_square(), crate::square::OFF_BOARD);
    b.unmake_null();
    assert_eq!(b.snapshot(), before);
}

#[test]
fn fen_round_trips_with_holdings_and_promoted_marks() {
    let fen = "r3k2r/8/8/8/3Q~4/8/8/R3K2R[NNpq] w KQkq -";
    let b = Board::from_str(fen).unwrap();
    assert_eq!(b.to_fen(), fen);
    assert_eq!(b.in_hand(Color::White, Piece::Knight), 2);
    assert_eq!(b.in_hand(Color::Black, Piece::Pawn), 1);
    assert_eq!(b.in_hand(Color::Black, Piece::Queen), 1);
    assert!(b.promoted_pawns.has(sq("d4")));
}

#[test]
fn checkmate_needs_the_drop_test_in_bughouse() {
    // Back-rank mate by a rook at distance: blockable by a drop, so in
    // Bughouse it is not yet mate.
    let fen = "R5k1/5ppp/8/8/8/8/8/6K1 b - -";
    let mut zh = Board::from_str(fen).unwrap();
    assert!(zh.is_checkmate());

    let mut bug = Board::new(Rules::Bughouse);
    bug.set_position(fen).unwrap();
    assert!(bug.in_check(Color::Black) > 0);
    assert!(!bug.is_checkmate());
    assert!(!bug.cant_block());
}

#[test]
fn set_side_to_move_flips_hash_consistently() {
    let mut b = Board::new(Rules::Crazyhouse);
    b.set_side_to_move(Color::Black);
    assert_eq!(b.hash(), b.compute_hash_full());
    b.set_side_to_move(Color::White);
    assert_eq!(b.hash(), b.compute_hash_full());
}
