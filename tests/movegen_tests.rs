//! Generator-level guarantees: legality of the enumerated set, pawn-drop
//! rank limits, and the no-moves-when-mated property.

use std::str::FromStr;

use moonrise::board::{Board, Color, MoveList, Piece, Rules};

fn legal(b: &mut Board) -> MoveList {
    let mut out = MoveList::new();
    b.legal_moves(&mut out);
    out
}

#[test]
fn legal_moves_never_leave_the_king_in_check() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -",
        "r3k2r/ppp2ppp/2nq1n2/3pp3/1b2P3/2NP1N2/PPPB1PPP/R2QKB1R[pn] w KQkq -",
        "4k3/4r3/8/8/8/8/4N3/4K3[q] w - -", // pinned knight
        "R6k/6pp/8/8/8/8/8/7K[rn] b - -",   // in check, drops available
    ];
    for fen in fens {
        let mut b = Board::from_str(fen).unwrap();
        let moves = legal(&mut b);
        for &m in moves.iter() {
            b.make(m);
            assert_eq!(
                b.in_check(b.off_move()),
                0,
                "{m} leaves the king in check in {fen}"
            );
            b.unmake();
        }
    }
}

#[test]
fn pinned_pieces_cannot_expose_the_king() {
    // The e2 knight is pinned by the e7 rook; it must not move.
    let mut b = Board::from_str("4k3/4r3/8/8/8/8/4N3/4K3 w - -").unwrap();
    let moves = legal(&mut b);
    assert!(moves.iter().all(|m| m.moved() != Piece::Knight));
}

#[test]
fn pawn_drops_never_reach_the_back_ranks() {
    let fens = [
        "4k3/8/8/8/8/8/8/4K3[Pp] w - -",
        "4k3/8/8/8/8/8/8/4K3[Pp] b - -",
        "r3k3/8/8/8/8/8/8/4K2R[PPPpp] w - -",
    ];
    for fen in fens {
        let mut b = Board::from_str(fen).unwrap();
        let moves = legal(&mut b);
        for m in moves.iter().filter(|m| m.is_drop() && m.moved() == Piece::Pawn) {
            assert!(
                m.to().rank() != 0 && m.to().rank() != 7,
                "pawn drop {m} on a back rank in {fen}"
            );
        }
    }
}

#[test]
fn mated_side_has_no_moves_and_knows_it() {
    // Smothered corner mate; no holdings to block with.
    let mut b = Board::from_str("6rk/5Npp/8/8/8/8/8/6K1 b - -").unwrap();
    assert!(b.in_check(Color::Black) > 0);
    assert!(legal(&mut b).is_empty());
    assert!(b.is_checkmate());
}

#[test]
fn a_drop_refutes_the_mate_in_bughouse_and_crazyhouse() {
    // The same back-rank check with a rook in hand: blockable.
    let mut b = Board::from_str("R5k1/5ppp/8/8/8/8/8/6K1[r] b - -").unwrap();
    assert!(b.in_check(Color::Black) > 0);
    let moves = legal(&mut b);
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|m| m.is_drop()));
    assert!(!b.is_checkmate());
}

#[test]
fn underpromotions_complete_the_legal_set() {
    let mut b = Board::from_str("4k3/6P1/8/8/8/8/8/4K3 w - -").unwrap();
    let moves = legal(&mut b);
    let promos: Vec<Piece> = moves
        .iter()
        .filter(|m| m.to().rank() == 7)
        .map(|m| m.promotion())
        .collect();
    assert_eq!(promos.len(), 4);
    for p in [Piece::Queen, Piece::Knight, Piece::Rook, Piece::Bishop] {
        assert!(promos.contains(&p), "missing promotion to {p:?}");
    }
}

#[test]
fn double_check_admits_only_king_moves() {
    // Rook on e8 and bishop on b4 both check the e1 king (discovered-style
    // setup); only king moves may come out.
    let mut b = Board::from_str("4r2k/8/8/8/1b6/8/8/4K3 b - -").unwrap();
    // Give the move to White.
    b.set_side_to_move(Color::White);
    assert_eq!(b.in_check(Color::White), 2);
    let moves = legal(&mut b);
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|m| m.moved() == Piece::King));
}
