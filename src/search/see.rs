//! Static exchange evaluation and capture ordering.
//!
//! `capture_gain` simulates the whole exchange on the target square without
//! moving anything: each side recaptures with its least valuable attacker,
//! x-ray attackers slide in as front pieces leave the line, and a min-max
//! fold from the tail decides where the capturing stops.

use crate::bitboard::BitboardExt;
use crate::board::tables::tables;
use crate::board::{Board, Color, MoveList, Piece};
use crate::moves::types::Move;

/// Captures gaining at least this much count as "winning"; capturing a minor
/// with a minor does not clear the bar.
pub const WINNING_CAPTURE_MARGIN: i32 = 20;

const LVA_ORDER: [Piece; 5] =
    [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

impl Board {
    /// Material outcome of the exchange started by `m`, for the side `c`
    /// that begins it. Positive is good for `c`.
    pub(crate) fn capture_gain(&self, mut c: Color, m: Move) -> i32 {
        let t = tables();
        let to = m.to();
        let mut from = m.from();
        let (tn, mut fnn) = (to.index() as usize, from.index() as usize);

        let mut gain = [0i32; 32];
        let mut count = 1usize;
        gain[0] = self.position[tn].value();
        let mut attacked_value = self.position[fnn].value();
        let mut sign = -1;

        let mut attackers = self.attacks_to(to);
        attackers.unset(from);
        let dir = t.direction_piece[fnn][tn];
        if dir != Piece::None {
            attackers |= self.attacks_from(dir, from)
                & t.squares_past[tn][fnn]
                & (self.pieces[dir.idx()] | self.pieces[Piece::Queen.idx()]);
        }

        while attackers != 0 && count < 32 {
            c = c.other();

            let mut found = false;
            for p in LVA_ORDER {
                let subset = attackers & self.pieces[p.idx()] & self.occupied[c.idx()];
                if subset != 0 {
                    from = subset.first_square();
                    found = true;
                    break;
                }
            }
            if !found {
                break;
            }
            fnn = from.index() as usize;

            gain[count] = gain[count - 1] + sign * attacked_value;
            count += 1;

            attacked_value = self.position[fnn].value();
            attackers.unset(from);
            sign = -sign;
            let dir = t.direction_piece[fnn][tn];
            if dir != Piece::None {
                attackers |= self.attacks_from(dir, from)
                    & t.squares_past[tn][fnn]
                    & (self.pieces[dir.idx()] | self.pieces[Piece::Queen.idx()]);
            }
        }

        while count > 1 {
            count -= 1;
            if count & 1 == 1 {
                // The defender is to choose at odd depths.
                if gain[count] < gain[count - 1] {
                    gain[count - 1] = gain[count];
                }
            } else if gain[count] > gain[count - 1] {
                gain[count - 1] = gain[count];
            }
        }
        gain[0]
    }

    /// Sort a capture list by descending exchange gain; promotions and
    /// en-passant captures get a flat minor-piece estimate. Records the best
    /// gain for this node (the razoring tests read it) and returns how many
    /// leading captures are winning.
    pub fn order_captures(&mut self, m: &mut MoveList) -> usize {
        let n = m.len();
        let mut values = [0i32; crate::moves::types::MAX_MOVES];
        for i in 0..n {
            values[i] = if self.position[m[i].to().index() as usize] != Piece::None {
                self.capture_gain(self.on_move, m[i])
            } else {
                Piece::Knight.value()
            };
        }

        if n < 2 {
            self.best_capture_gain[self.move_num] = values[0].max(0);
            return if n == 1 && values[0] >= WINNING_CAPTURE_MARGIN { 1 } else { 0 };
        }

        loop {
            let mut done = true;
            for i in 0..n - 1 {
                if values[i] < values[i + 1] {
                    values.swap(i, i + 1);
                    m.swap(i, i + 1);
                    done = false;
                }
            }
            if done {
                break;
            }
        }

        self.best_capture_gain[self.move_num] = values[0].max(0);

        if values[0] < WINNING_CAPTURE_MARGIN {
            return 0;
        }
        let mut winning = n;
        while winning > 0 && values[winning - 1] < WINNING_CAPTURE_MARGIN {
            winning -= 1;
        }
        winning
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn capture(b: &Board, from: &str, to: &str) -> Move {
        let from = crate::square::Square::from_str(from).unwrap();
        let to = crate::square::Square::from_str(to).unwrap();
        Move::new(from, to, b.piece_on(from))
    }

    #[test]
    fn defended_pawn_costs_the_rook() {
        let b = Board::from_str("3r3k/8/8/8/3p4/8/8/3RK3 w - -").unwrap();
        let m = capture(&b, "d1", "d4");
        // RxP, then rxR: 100 - 200.
        assert_eq!(b.capture_gain(Color::White, m), -100);
    }

    #[test]
    fn undefended_piece_is_clean_gain() {
        let b = Board::from_str("3r3k/8/8/8/3p4/8/8/3QK3 b - -").unwrap();
        let m = capture(&b, "d8", "d4");
        // rxP, QxR, nothing recaptures: 100 - 200 vs stopping at 100.
        // Black stops after winning the pawn only if continuing is worse;
        // the fold settles on the pawn minus the rook loss being avoidable.
        assert_eq!(b.capture_gain(Color::Black, m), -100);
    }

    #[test]
    fn xray_battery_carries_the_exchange() {
        let b = Board::from_str("3r3k/3r4/8/8/8/8/3P4/3R3K b - -").unwrap();
        // rxP(d2): RxR, rxR -- black wins a pawn and a rook for a rook.
        let m = capture(&b, "d7", "d2");
        assert_eq!(b.capture_gain(Color::Black, m), 100);
    }

    #[test]
    fn ordering_is_non_increasing_and_counts_winners() {
        // Qxd5 wins a clean pawn; fxe4 wins knight for pawn.
        let mut b = Board::from_str("7k/8/8/3p4/4n3/5P2/8/3QK3 w - -").unwrap();
        let mut caps = MoveList::new();
        b.capture_moves(&mut caps);
        assert_eq!(caps.len(), 2);
        let winning = b.order_captures(&mut caps);
        assert_eq!(winning, 2);
        let gains: Vec<i32> =
            caps.iter().map(|&m| b.capture_gain(Color::White, m)).collect();
        assert_eq!(gains, vec![100, 92]);
        for w in gains.windows(2) {
            assert!(w[0] >= w[1], "capture order not descending: {gains:?}");
        }
    }
}
