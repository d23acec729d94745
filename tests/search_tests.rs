//! Search behavior on the canonical scenarios: a sane move from the start
//! position, forced mates found at the right depths, drop mates, a free
//! capture, and the Bughouse mate-versus-wait distinction.

use moonrise::board::{Color, Rules};
use moonrise::moves::types::Move;
use moonrise::search::search::Searcher;
use moonrise::search::{ALMOST_MATE, INFINITY, MATE, ONE_PLY};

fn searcher(rules: Rules, fen: &str, fixed_depth: usize) -> Searcher {
    let mut s = Searcher::new(rules, 16);
    s.board.set_position(fen).expect("fen parses");
    s.playing = s.board.to_move();
    s.clock.fixed_depth = fixed_depth;
    s
}

#[test]
fn initial_position_yields_a_sane_move() {
    let mut s = Searcher::new(Rules::Crazyhouse, 16);
    s.playing = Color::White;
    s.clock.fixed_depth = 2;
    let (m, value) = s.search_root(48);
    assert!(!m.is_bad());
    assert!(s.board.is_legal(m), "{m} should be legal from the start");
    assert!(value > -200 && value < 200, "start value {value} out of range");
}

#[test]
fn back_rank_mate_found_at_depth_two() {
    let mut s = searcher(Rules::Crazyhouse, "6k1/5ppp/8/8/8/8/8/R6K w - -", 3);
    let (m, value) = s.search_root(48);
    assert!(value >= MATE, "mate missed, value {value}");
    assert_eq!(m.to_string(), "a1a8");
}

#[test]
fn drop_mate_found_at_depth_one() {
    // Q@g8 is supported by the f7 pawn and cannot be blocked; every other
    // back-rank queen drop is answered by the a3 bishop.
    let mut s = searcher(Rules::Crazyhouse, "7k/5Ppp/8/8/8/b7/8/K7[Q] w - -", 2);
    let (m, value) = s.search_root(48);
    assert!(value >= MATE, "drop mate missed, value {value}");
    assert_eq!(m.to_string(), "Q@g8");
}

#[test]
fn free_queen_is_captured_by_depth_five() {
    let mut s = searcher(
        Rules::Crazyhouse,
        "rnb1kbnr/pppppppp/8/8/4q3/2N5/PPPPPPPP/R1BQKBNR w KQkq -",
        6,
    );
    let (m, value) = s.search_root(48);
    assert_eq!(m.to_string(), "c3e4", "expected Nxe4, got {m}");
    assert!(value > 300, "queen win should show, value {value}");
}

#[test]
fn root_returns_a_real_move_whenever_one_exists() {
    for fen in [
        "4k3/8/8/8/8/8/8/4K3[Pp] w - -",
        "r3k2r/ppp2ppp/2nq1n2/3pp3/1b2P3/2NP1N2/PPPB1PPP/R2QKB1R[pn] b KQkq -",
    ] {
        let mut s = searcher(Rules::Crazyhouse, fen, 2);
        let (m, _) = s.search_root(48);
        assert!(!m.is_bad(), "no move found in {fen}");
        assert!(s.board.is_legal(m));
    }
}

#[test]
fn bughouse_distinguishes_mate_from_having_to_wait() {
    // Distant back-rank check, nothing in hand, no legal replies: a piece
    // from the partner would block, so this is a wait, not a mate.
    let mut s = searcher(Rules::Bughouse, "R6k/6pp/8/8/8/8/8/6K1 b - -", 2);
    let value = s.search(-INFINITY, INFINITY, 2 * ONE_PLY, 1, false);
    assert_eq!(value, -ALMOST_MATE);

    // A supported contact check cannot be blocked by any future drop.
    let mut s = searcher(Rules::Bughouse, "5KQk/6pp/8/8/8/8/8/8 b - -", 2);
    let value = s.search(-INFINITY, INFINITY, 2 * ONE_PLY, 1, false);
    assert!(value <= -MATE, "real mate scored {value}");
    assert_ne!(value, -ALMOST_MATE);
}

#[test]
fn crazyhouse_mate_score_prefers_longer_survival() {
    let mut s = searcher(Rules::Crazyhouse, "5KQk/6pp/8/8/8/8/8/8 b - -", 2);
    let shallow = s.search(-INFINITY, INFINITY, 2 * ONE_PLY, 1, false);
    let mut s = searcher(Rules::Crazyhouse, "5KQk/6pp/8/8/8/8/8/8 b - -", 2);
    let deep = s.search(-INFINITY, INFINITY, 2 * ONE_PLY, 5, false);
    assert!(shallow <= -MATE && deep <= -MATE);
    assert!(deep > shallow, "being mated later should hurt less");
}

#[test]
fn interrupted_search_returns_the_sentinel() {
    let mut s = searcher(Rules::Crazyhouse, "6k1/5ppp/8/8/8/8/8/R6K w - -", 3);
    s.controls.stop_thinking = true;
    let value = s.search(-INFINITY, INFINITY, 4 * ONE_PLY, 1, false);
    assert_eq!(value, -INFINITY);
}

#[test]
fn quiescence_stands_pat_or_takes_the_best_capture() {
    // White to move, a loose black queen on e4: quiescence should not
    // settle below the capture's value.
    let mut s = searcher(Rules::Crazyhouse, "7k/8/8/3p4/4n3/5P2/8/3QK3 w - -", 2);
    let stand = s.board.eval(false);
    let q = s.quiesce(-INFINITY, INFINITY, 1);
    assert!(q >= stand, "quiesce {q} below stand pat {stand}");
}

#[test]
fn single_reply_is_played_immediately_in_crazyhouse() {
    // The f1 queen checks; h2 and g2 are covered; Rxf1 is the one reply.
    let mut s = searcher(Rules::Crazyhouse, "k6r/8/8/8/8/8/8/R4q1K w - -", 3);
    let mut legal = moonrise::board::MoveList::new();
    s.board.legal_moves(&mut legal);
    assert_eq!(legal.len(), 1);
    let only: Move = legal[0];
    let (m, _) = s.search_root(48);
    assert_eq!(m, only);
}
