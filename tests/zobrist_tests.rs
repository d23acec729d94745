//! The hash is a deterministic function of the public state: transpositions
//! collide on purpose, different states do not.

use std::str::FromStr;

use moonrise::board::{Board, MoveList, Rules};
use moonrise::notation::parse_move;

fn play(b: &mut Board, text: &str) {
    let m = parse_move(b, text).unwrap_or_else(|| panic!("{text} should be legal"));
    b.make(m);
}

#[test]
fn knights_out_and_back_restores_the_hash() {
    let mut b = Board::new(Rules::Crazyhouse);
    let fresh_hash = b.hash();
    for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        play(&mut b, text);
    }
    assert_eq!(b.hash(), fresh_hash);
    assert_eq!(b.hash(), b.compute_hash_full());
}

#[test]
fn transposed_move_orders_reach_the_same_hash() {
    let mut a = Board::new(Rules::Crazyhouse);
    for text in ["g1f3", "d7d6", "d2d3"] {
        play(&mut a, text);
    }
    let mut b = Board::new(Rules::Crazyhouse);
    for text in ["d2d3", "d7d6", "g1f3"] {
        play(&mut b, text);
    }
    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn the_en_passant_file_is_part_of_the_hash() {
    // Same piece placement; only the double push differs from the two-step
    // march, through the en-passant field.
    let mut a = Board::from_str("4k3/8/8/8/3p4/8/2P5/4K3 w - -").unwrap();
    play(&mut a, "c2c4");
    let mut b = Board::from_str("4k3/8/8/8/2Pp4/8/8/4K3 b - -").unwrap();
    assert_ne!(a.hash(), b.hash());
    assert_eq!(a.to_fen().split(' ').next(), b.to_fen().split(' ').next());
}

#[test]
fn hands_are_part_of_the_hash() {
    let empty = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
    let with_n = Board::from_str("4k3/8/8/8/8/8/8/4K3[N] w - -").unwrap();
    let with_nn = Board::from_str("4k3/8/8/8/8/8/8/4K3[NN] w - -").unwrap();
    assert_ne!(empty.hash(), with_n.hash());
    assert_ne!(with_n.hash(), with_nn.hash());
}

#[test]
fn drops_update_the_hash_incrementally() {
    let mut b = Board::from_str("4k3/8/8/8/8/8/8/4K3[N] w - -").unwrap();
    let mut legal = MoveList::new();
    b.legal_moves(&mut legal);
    for &m in legal.iter().filter(|m| m.is_drop()).take(8) {
        b.make(m);
        assert_eq!(b.hash(), b.compute_hash_full(), "hash drift after {m}");
        b.unmake();
    }
}

#[test]
fn side_to_move_is_part_of_the_hash() {
    let w = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
    let b = Board::from_str("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
    assert_ne!(w.hash(), b.hash());
}
