//! Static evaluation: material, development piece-square bonuses, board
//! control, mutual king safety scaled by droppable material, in-hand
//! bonuses, and the Bughouse "someone will have to sit for a piece" terms.
//! The returned value is from the side to move's point of view.
//!
//! The move-interest predicates the razoring and extension logic uses also
//! live here; they read the same attack table the evaluation does.

use once_cell::sync::Lazy;

use crate::bitboard::BitboardExt;
use crate::board::tables::tables;
use crate::board::{Board, Color, HAND_PIECES, Piece, Rules};
use crate::square::Square;

/// Board-control weight per attack-count difference.
pub const BC_FACTOR: i32 = 5;
/// Development table scale.
pub const DE_FACTOR: i32 = 3;

/// Escape-square credit by how many own pieces defend the square.
const ESCAPE_VALUES: [i32; 32] = [
    2, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4,
    4,
];

// Piece-square bases, from White's side with the eighth rank printed first.
// Centipawns before the DE_FACTOR scale.
#[rustfmt::skip]
const PAWN_DEVELOPMENT: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5,  6,  5,  5,  5,  5,  6,  5,
     0,  0,  0,  3,  3,  0,  0,  0,
     0,  0,  0,  3,  3,  0,  0,  0,
    -2, -1,  0,  2,  2,  0, -1, -2,
    -2, -1,  0,  0,  0,  0, -1, -2,
     4,  6,  2, -4, -6,  4,  8,  4,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const ROOK_DEVELOPMENT: [i32; 64] = [
     5,  5,  5,  5,  5,  5,  5,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     1,  0,  0,  0,  0,  0,  0,  1,
];

const KNIGHT_DEVELOPMENT: [i32; 64] = [0; 64];
const BISHOP_DEVELOPMENT: [i32; 64] = [0; 64];

#[rustfmt::skip]
const QUEEN_DEVELOPMENT: [i32; 64] = [
    -10,-10,-10,-10,-10,-10,-10,-10,
    -10,-10,-10,-10,-10,-10,-10,-10,
    -20,-20,-20,-20,-20,-20,-20,-20,
    -20,-20,-20,-20,-20,-20,-20,-20,
    -20,-20,-20,-20,-20,-20,-20,-20,
    -20,-20,-20,-20,-20,-20,-20,-20,
    -12,-12,-10, -8, -8,-10,-12,-12,
    -16,-14,-10, -4, -8,-10,-14,-16,
];

#[rustfmt::skip]
const KING_DEVELOPMENT: [i32; 64] = [
    -10,-18,-25,-25,-25,-25,-18,-10,
    -18,-25,-25,-25,-25,-25,-25,-18,
    -25,-35,-35,-35,-35,-35,-35,-25,
    -25,-35,-35,-35,-35,-35,-35,-25,
    -18,-25,-35,-35,-35,-35,-25,-18,
    -10,-18,-25,-25,-25,-25,-25,-10,
     -2, -6,-11,-11,-11,-11, -6, -2,
      1,  2,  1,  0,  1,  0,  2,  1,
];

static DEVELOPMENT: Lazy<Box<[[[i32; 64]; 7]; 2]>> = Lazy::new(|| {
    let mut t = Box::new([[[0; 64]; 7]; 2]);
    let bases: [(Piece, &[i32; 64]); 6] = [
        (Piece::Pawn, &PAWN_DEVELOPMENT),
        (Piece::Rook, &ROOK_DEVELOPMENT),
        (Piece::Knight, &KNIGHT_DEVELOPMENT),
        (Piece::Bishop, &BISHOP_DEVELOPMENT),
        (Piece::Queen, &QUEEN_DEVELOPMENT),
        (Piece::King, &KING_DEVELOPMENT),
    ];
    for (p, base) in bases {
        for i in 0..64 {
            let (row, col) = (i / 8, i % 8);
            let black_sq = Square::new(col as u8, row as u8);
            let white_sq = Square::new(col as u8, 7 - row as u8);
            t[Color::Black.idx()][p.idx()][black_sq.index() as usize] = base[i] * DE_FACTOR;
            t[Color::White.idx()][p.idx()][white_sq.index() as usize] = base[i] * DE_FACTOR;
        }
    }
    t
});

#[inline(always)]
pub fn development_table() -> &'static [[[i32; 64]; 7]; 2] {
    &DEVELOPMENT
}

impl Board {
    /// Attack-count difference over the board's interior (the a- and h-file
    /// edges excluded).
    pub(crate) fn board_control_eval(&self) -> i32 {
        let mut control = 0i32;
        for sq in 8..56usize {
            control += (self.attacks[0][sq] - self.attacks[1][sq]) as i32;
        }
        control * BC_FACTOR
    }

    /// King danger for color `c`. Counts squares near the king the opponent
    /// controls against escape squares the opponent does not reach; positive
    /// is bad for `c`.
    pub(crate) fn king_safety_eval(&self, c: Color) -> i32 {
        let mut take_squares = 0i32;
        let mut escape_squares = 0i32;
        let (us, them) = (c.idx(), c.other().idx());

        let near = tables().near_squares[self.king_square[us].index() as usize];
        for sq in near.squares() {
            let n = sq.index() as usize;
            let control = (self.attacks[them][n] - self.attacks[us][n]) as i32;
            if control > -1 {
                take_squares += control + control + 5;
            }
            if self.attacks[them][n] == 0 {
                escape_squares += ESCAPE_VALUES[(self.attacks[us][n] as usize).min(31)];
            }
        }

        // Attacking near the king must keep paying off even against a wall
        // of escape squares.
        if escape_squares > take_squares / 2 {
            escape_squares = take_squares / 2;
        }
        (take_squares - escape_squares).max(0)
    }

    /// Nonlinear bucket count of the material in `c`'s hand; multiplies the
    /// opposing king-safety term.
    pub(crate) fn material_in_hand_scale(&self, c: Color) -> i32 {
        let mut in_hand = 0i32;
        for p in HAND_PIECES {
            in_hand += p.value() * self.hand[c.idx()][p.idx()] as i32;
        }
        let mut scale = 2;
        for threshold in [80, 160, 260, 380, 530, 720, 960, 1260, 1630] {
            if in_hand > threshold {
                scale += 1;
            }
        }
        scale
    }

    /// Per-piece bonuses for held material, white minus black.
    pub(crate) fn adjust_in_hand(&self) -> i32 {
        let one = |c: usize| -> i32 {
            let hand = &self.hand[c];
            let mut v = 0;
            if hand[Piece::Pawn.idx()] > 0 {
                v += 15 + hand[Piece::Pawn.idx()] as i32 * 7;
            }
            if hand[Piece::Queen.idx()] > 0 {
                v += 40 + hand[Piece::Queen.idx()] as i32 * 20;
            }
            for p in [Piece::Rook, Piece::Knight, Piece::Bishop] {
                if hand[p.idx()] > 0 {
                    v += 20 + hand[p.idx()] as i32 * 10;
                }
            }
            v
        };
        one(0) - one(1)
    }

    /// In Bughouse a side whose opponent holds no pawn/knight/rook would
    /// have to sit and wait before dropping one; that is worth something.
    /// White minus black. Gated off while the partner handshake says help
    /// is coming.
    pub(crate) fn bughouse_sit_for_eval(&self, sit_terms: bool) -> i32 {
        if self.rules == Rules::Crazyhouse || !sit_terms {
            return 0;
        }
        let mut v = 0;
        for p in [Piece::Rook, Piece::Knight, Piece::Pawn] {
            if self.hand[1][p.idx()] < 1 {
                v += p.value();
            }
            if self.hand[0][p.idx()] < 1 {
                v -= p.value();
            }
        }
        v
    }

    /// Bonus on a mate score for the pieces the opponent is missing: a mate
    /// they cannot even sit against is the better mate.
    pub(crate) fn bughouse_mate_eval(&self, sit_terms: bool) -> i32 {
        if self.rules == Rules::Crazyhouse || !sit_terms {
            return 0;
        }
        let them = self.off_move().idx();
        let mut v = 0;
        for p in [Piece::Rook, Piece::Knight, Piece::Pawn] {
            if self.hand[them][p.idx()] < 1 {
                v += p.value();
            }
        }
        v
    }

    /// The static evaluation, side-to-move relative.
    pub fn eval(&self, sit_terms: bool) -> i32 {
        let white_view = self.adjust_in_hand()
            + self.material
            + self.development
            + self.board_control_eval()
            - self.king_safety_eval(Color::White) * self.material_in_hand_scale(Color::Black)
            + self.king_safety_eval(Color::Black) * self.material_in_hand_scale(Color::White)
            + self.bughouse_sit_for_eval(sit_terms);
        match self.on_move {
            Color::White => white_view,
            Color::Black => -white_view,
        }
    }

    // ------------------------------------------------------------------
    // Move-interest predicates, all asked right after the candidate move
    // was made (so the mover is the side now off move).

    /// Did the move just made attack something worth attacking? True for
    /// captures, for new attacks on underdefended pieces worth more than
    /// what the skipped best capture would have brought, and false for a
    /// piece that merely put itself en prise.
    pub(crate) fn highest_attacked(&self, move_to: Square) -> bool {
        let (mover, opp) = (self.off_move().idx(), self.on_move.idx());
        let tn = move_to.index() as usize;

        if self.undo_history_captured(self.move_num - 1) != Piece::None {
            return true;
        }
        if self.attacks[opp][tn] > self.attacks[mover][tn]
            || (self.position[tn] == Piece::Queen && self.attacks[opp][tn] != 0)
        {
            // The moved piece is probably en prise where it landed.
            return false;
        }

        let skipped = self.best_capture_gain[self.move_num - 1];
        let newly = self.move_attacked[self.move_num] & self.occupied[opp];
        for sq in newly.squares() {
            let n = sq.index() as usize;
            if self.attacks[opp][n] == 0
                && self.attacks[mover][n] == 1
                && self.position[n].value() > skipped + 20
            {
                // First attack on an undefended piece.
                return true;
            }
            if self.position[n].value() > self.position[tn].value() + skipped + 20 {
                return true;
            }
        }
        false
    }

    /// Was the moved piece itself under attack before it moved (and is it
    /// not walking into worse), or does the move defend a hanging friend
    /// both recent moves touch?
    pub(crate) fn escaping_attack(&self, moved_from: Square, move_to: Square) -> bool {
        let (mover, opp) = (self.off_move().idx(), self.on_move.idx());
        let (fnn, tn) = (moved_from.index() as usize, move_to.index() as usize);

        if self.move_attacked[self.move_num - 1].has(moved_from)
            && self.attacks[opp][fnn] - self.attacks[mover][fnn]
                >= self.attacks[opp][tn] - self.attacks[mover][tn]
        {
            return true;
        }

        let both = self.move_attacked[self.move_num - 1]
            & self.move_attacked[self.move_num]
            & self.occupied[mover];
        if both != 0 && self.attacks[opp][tn] == 0 {
            let moved_value = self.move_history[self.move_num - 1].moved().value();
            for sq in both.squares() {
                let n = sq.index() as usize;
                if self.attacks[mover][n] == 1
                    && self.attacks[opp][n] == 1
                    && self.position[n].value() + 20 < moved_value
                {
                    return true;
                }
            }
        }
        false
    }

    /// Extend when the last two plies traded on one square and the
    /// recapturer now stands loose (or the trade ran through a check).
    pub(crate) fn capture_extension_condition(&self) -> bool {
        if self.move_num < 2 {
            return false;
        }
        let last = self.move_history[self.move_num - 1];
        let before = self.move_history[self.move_num - 2];

        self.undo_history_captured(self.move_num - 1) != Piece::None
            && before.to() == last.to()
            && (self.attacks[self.off_move().idx()][last.to().index() as usize] == 0
                || (self.check_at[self.move_num - 1]
                    && self.undo_history_captured(self.move_num - 2) != Piece::None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn development_tables_mirror_between_colors() {
        let t = development_table();
        // g2 is a good pawn home for White; g7 the same for Black.
        let g2 = Square::from_str("g2").unwrap();
        let g7 = Square::from_str("g7").unwrap();
        assert_eq!(t[0][Piece::Pawn.idx()][g2.index() as usize], 8 * DE_FACTOR);
        assert_eq!(t[1][Piece::Pawn.idx()][g7.index() as usize], 8 * DE_FACTOR);
        // A centralized king is a liability for both.
        let e4 = Square::from_str("e4").unwrap();
        assert!(t[0][Piece::King.idx()][e4.index() as usize] < -50);
        assert!(t[1][Piece::King.idx()][e4.index() as usize] < -50);
    }

    #[test]
    fn start_position_is_level() {
        let b = Board::new(Rules::Crazyhouse);
        assert_eq!(b.eval(false), 0);
    }

    #[test]
    fn held_material_counts() {
        let with_queen = Board::from_str("4k3/8/8/8/8/8/8/4K3[Q] w - -").unwrap();
        let without = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert!(with_queen.eval(false) > without.eval(false) + Piece::Queen.value());
    }

    #[test]
    fn sit_for_terms_only_apply_in_bughouse() {
        let mut b = Board::from_str("4k3/8/8/8/8/8/8/4K3[R] w - -").unwrap();
        assert_eq!(b.bughouse_sit_for_eval(true), 0);
        b.set_rules(Rules::Bughouse);
        // Black holds nothing: all three kinds missing. White misses
        // knight and pawn but holds a rook.
        let v = b.bughouse_sit_for_eval(true);
        assert_eq!(v, Piece::Rook.value());
        assert_eq!(b.bughouse_sit_for_eval(false), 0);
    }
}
