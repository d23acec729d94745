//! Plausible-move generation.
//!
//! Four tiers feed the search: captures (SEE-ordered by the caller), mate
//! tries, the full non-capture pass split by the history top squares, and a
//! fifth "skipped" pass of rook/bishop underpromotions that only the strict
//! legal-move enumeration wants. When the side to move is in check the tiers
//! are replaced by the two evasion generators.
//!
//! None of this filters out moves that leave the own king in check (the
//! evasion branch excepted); the search verifies legality by making the move
//! and pruning an illegal reply.

use crate::bitboard::{A_FILE, BitboardExt, Bitboard, EIGHTH_RANK, FIFTH_RANK, FIRST_RANK, FOURTH_RANK, H_FILE, bit};
use crate::board::tables::tables;
use crate::board::{Board, Color, MoveList, Piece};
use crate::search::history::History;
use crate::square::{B1, B8, C1, C8, D1, D8, E1, E8, F1, F8, G1, G8, ONE_RANK, Square, TWO_RANKS};

use super::types::Move;

#[inline(always)]
fn fill(out: &mut MoveList, from: Square, p: Piece, dest: Bitboard) {
    for to in dest.squares() {
        out.push(Move::new(from, to, p));
    }
}

impl Board {
    // ------------------------------------------------------------------
    // Pawn helpers. These take a destination mask and emit every pawn move
    // landing in it, so one routine serves blocking, capturing and
    // promoting alike.

    pub(crate) fn white_pawn_moves_to(&self, out: &mut MoveList, possible: Bitboard, promote: Piece) {
        let pawns = self.pieces[Piece::Pawn.idx()] & self.occupied[0];
        let empty = !self.occupied_all();

        let push = |out: &mut MoveList, to_bb: Bitboard, back: i8| {
            for to in to_bb.squares() {
                let m = if promote == Piece::None {
                    Move::new(to.offset(back), to, Piece::Pawn)
                } else {
                    Move::promoting(to.offset(back), to, Piece::Pawn, promote)
                };
                out.push(m);
            }
        };

        let single = possible & (pawns << 1) & empty;
        push(out, single, -ONE_RANK);
        let double = possible & (((pawns << 1) & empty) << 1) & FOURTH_RANK & empty;
        push(out, double, -TWO_RANKS);

        let left = possible & ((pawns & !A_FILE) >> 7) & self.occupied[1];
        push(out, left, 7);
        let right = possible & ((pawns & !H_FILE) << 9) & self.occupied[1];
        push(out, right, -9);
    }

    pub(crate) fn black_pawn_moves_to(&self, out: &mut MoveList, possible: Bitboard, promote: Piece) {
        let pawns = self.pieces[Piece::Pawn.idx()] & self.occupied[1];
        let empty = !self.occupied_all();

        let push = |out: &mut MoveList, to_bb: Bitboard, back: i8| {
            for to in to_bb.squares() {
                let m = if promote == Piece::None {
                    Move::new(to.offset(back), to, Piece::Pawn)
                } else {
                    Move::promoting(to.offset(back), to, Piece::Pawn, promote)
                };
                out.push(m);
            }
        };

        let single = possible & (pawns >> 1) & empty;
        push(out, single, ONE_RANK);
        let double = possible & (((pawns >> 1) & empty) >> 1) & FIFTH_RANK & empty;
        push(out, double, TWO_RANKS);

        let left = possible & ((pawns & !A_FILE) >> 9) & self.occupied[0];
        push(out, left, 9);
        let right = possible & ((pawns & !H_FILE) << 7) & self.occupied[0];
        push(out, right, -7);
    }

    /// Capture-only pawn emission; the mask decides what counts as a target,
    /// which is how en-passant squares get in. Not for promotions.
    pub(crate) fn white_pawn_captures_to(&self, out: &mut MoveList, possible: Bitboard) {
        let pawns = self.pieces[Piece::Pawn.idx()] & self.occupied[0];
        for to in (possible & ((pawns & !A_FILE) >> 7)).squares() {
            out.push(Move::new(to.offset(7), to, Piece::Pawn));
        }
        for to in (possible & ((pawns & !H_FILE) << 9)).squares() {
            out.push(Move::new(to.offset(-9), to, Piece::Pawn));
        }
    }

    pub(crate) fn black_pawn_captures_to(&self, out: &mut MoveList, possible: Bitboard) {
        let pawns = self.pieces[Piece::Pawn.idx()] & self.occupied[1];
        for to in (possible & ((pawns & !A_FILE) >> 9)).squares() {
            out.push(Move::new(to.offset(9), to, Piece::Pawn));
        }
        for to in (possible & ((pawns & !H_FILE) << 7)).squares() {
            out.push(Move::new(to.offset(-7), to, Piece::Pawn));
        }
    }

    // ------------------------------------------------------------------
    // Tier: captures

    /// Every capture plus pawn promotions to queen and knight. Rook and
    /// bishop promotions live in `skipped_moves`.
    pub fn capture_moves(&self, out: &mut MoveList) {
        let us = self.on_move;
        let opp = self.occupied[us.other().idx()];

        for p in [Piece::Bishop, Piece::Rook, Piece::Queen] {
            for from in (self.pieces[p.idx()] & self.occupied[us.idx()]).squares() {
                fill(out, from, p, self.attacks_from(p, from) & opp);
            }
        }
        for from in (self.pieces[Piece::Knight.idx()] & self.occupied[us.idx()]).squares() {
            fill(
                out,
                from,
                Piece::Knight,
                tables().knight_attacks[from.index() as usize] & opp,
            );
        }

        match us {
            Color::White => {
                self.white_pawn_moves_to(out, EIGHTH_RANK, Piece::Queen);
                let mut targets = self.occupied[1] & !EIGHTH_RANK;
                if self.en_passant.on_board() {
                    targets |= bit(self.en_passant);
                    targets &= !EIGHTH_RANK;
                }
                self.white_pawn_captures_to(out, targets);
                self.white_pawn_moves_to(out, EIGHTH_RANK, Piece::Knight);
            }
            Color::Black => {
                self.black_pawn_moves_to(out, FIRST_RANK, Piece::Queen);
                let mut targets = self.occupied[0] & !FIRST_RANK;
                if self.en_passant.on_board() {
                    targets |= bit(self.en_passant);
                    targets &= !FIRST_RANK;
                }
                self.black_pawn_captures_to(out, targets);
                self.black_pawn_moves_to(out, FIRST_RANK, Piece::Knight);
            }
        }

        let king = self.king_square[us.idx()];
        fill(out, king, Piece::King, tables().king_attacks[king.index() as usize] & opp);
    }

    // ------------------------------------------------------------------
    // Tier: mate tries

    fn fill_mate_tries(&self, out: &mut MoveList, from: Square, p: Piece, dest: Bitboard) {
        let us = self.on_move.idx();
        let them = self.on_move.other().idx();
        for to in dest.squares() {
            let n = to.index() as usize;
            let ok = if p == Piece::Knight {
                // A knight contact check only matters where nothing can
                // recapture at all.
                self.attacks[them][n] == 0
            } else {
                self.attacks[us][n] != 0 && self.attacks[them][n] == 1
            };
            if ok {
                out.push(Move::new(from, to, p));
            }
        }
    }

    /// Contact checks the opponent cannot simply take, from the board and
    /// from the hand. In the drop variants these find the short mates.
    pub fn mate_tries(&self, out: &mut MoveList) {
        let us = self.on_move;
        let their_king = self.king_square[us.other().idx()];
        let empty = !self.occupied_all();

        for p in [Piece::Queen, Piece::Rook, Piece::Knight, Piece::Bishop] {
            let contact = empty & self.contact_attacks_from(p, their_king);
            for from in (self.pieces[p.idx()] & self.occupied[us.idx()]).squares() {
                let dest = if p == Piece::Knight {
                    tables().knight_attacks[from.index() as usize] & contact
                } else {
                    self.attacks_from(p, from) & contact
                };
                self.fill_mate_tries(out, from, p, dest);
            }
        }

        for p in [Piece::Queen, Piece::Rook, Piece::Knight, Piece::Bishop] {
            if self.in_hand(us, p) > 0 {
                let contact = empty & self.contact_attacks_from(p, their_king);
                self.fill_mate_tries(out, crate::square::IN_HAND, p, contact);
            }
        }
        if self.in_hand(us, Piece::Pawn) > 0 {
            // Squares from which a pawn of ours gives check: where an
            // opposite-colored pawn on the king square would attack.
            let contact = empty
                & self.pawn_attacks_from(us.other(), their_king)
                & !(FIRST_RANK | EIGHTH_RANK);
            self.fill_mate_tries(out, crate::square::IN_HAND, Piece::Pawn, contact);
        }
    }

    // ------------------------------------------------------------------
    // Tier: full non-captures

    /// Quiet moves and drops. With a history table, destinations in its
    /// top-squares set are emitted first, per piece; the second pass covers
    /// the rest. Castling and king moves close the list.
    pub fn ai_moves(&self, hist: Option<&History>, out: &mut MoveList) {
        let us = self.on_move;
        let unoccupied = !self.occupied_all();

        let passes: &[bool] = if hist.is_some() { &[true, false] } else { &[true] };
        for &first in passes {
            let mask = |p: Piece, is_drop: bool| -> Bitboard {
                match hist {
                    Some(h) => {
                        let top = h.top(p, us, is_drop);
                        if first { top & unoccupied } else { !top & unoccupied }
                    }
                    None => unoccupied,
                }
            };

            for p in [Piece::Bishop, Piece::Rook, Piece::Queen] {
                let try_those = mask(p, false);
                for from in (self.pieces[p.idx()] & self.occupied[us.idx()]).squares() {
                    fill(out, from, p, self.attacks_from(p, from) & try_those);
                }
            }
            let try_those = mask(Piece::Knight, false);
            for from in (self.pieces[Piece::Knight.idx()] & self.occupied[us.idx()]).squares() {
                fill(
                    out,
                    from,
                    Piece::Knight,
                    tables().knight_attacks[from.index() as usize] & try_those,
                );
            }

            // Pawn pushes; promotions come from the capture tier.
            let try_those = mask(Piece::Pawn, false);
            let pawns = self.pieces[Piece::Pawn.idx()] & self.occupied[us.idx()];
            match us {
                Color::White => {
                    let single = (pawns << 1) & !EIGHTH_RANK & try_those & unoccupied;
                    for to in single.squares() {
                        out.push(Move::new(to.offset(-ONE_RANK), to, Piece::Pawn));
                    }
                    let double =
                        (((pawns << 1) & !EIGHTH_RANK & unoccupied) << 1) & FOURTH_RANK & try_those;
                    for to in double.squares() {
                        out.push(Move::new(to.offset(-TWO_RANKS), to, Piece::Pawn));
                    }
                }
                Color::Black => {
                    let single = (pawns >> 1) & !FIRST_RANK & try_those & unoccupied;
                    for to in single.squares() {
                        out.push(Move::new(to.offset(ONE_RANK), to, Piece::Pawn));
                    }
                    let double =
                        (((pawns >> 1) & !FIRST_RANK & unoccupied) >> 1) & FIFTH_RANK & try_those;
                    for to in double.squares() {
                        out.push(Move::new(to.offset(TWO_RANKS), to, Piece::Pawn));
                    }
                }
            }

            if self.in_hand(us, Piece::Pawn) > 0 {
                let dest = mask(Piece::Pawn, true) & !(FIRST_RANK | EIGHTH_RANK);
                for to in dest.squares() {
                    out.push(Move::drop(Piece::Pawn, to));
                }
            }
            for p in [Piece::Rook, Piece::Knight, Piece::Bishop, Piece::Queen] {
                if self.in_hand(us, p) > 0 {
                    for to in mask(p, true).squares() {
                        out.push(Move::drop(p, to));
                    }
                }
            }
        }

        let king = self.king_square[us.idx()];
        fill(out, king, Piece::King, tables().king_attacks[king.index() as usize] & unoccupied);

        // Castling: rights intact, path empty, path unattacked, not in check.
        if self.in_check(us) == 0 {
            let a = &self.attacks[us.other().idx()];
            match us {
                Color::White => {
                    if self.can_castle[0][crate::board::KING_SIDE]
                        && self.piece_on(F1) == Piece::None
                        && self.piece_on(G1) == Piece::None
                        && a[F1.index() as usize] == 0
                        && a[G1.index() as usize] == 0
                    {
                        out.push(Move::new(E1, G1, Piece::King));
                    }
                    if self.can_castle[0][crate::board::QUEEN_SIDE]
                        && self.piece_on(D1) == Piece::None
                        && self.piece_on(C1) == Piece::None
                        && self.piece_on(B1) == Piece::None
                        && a[D1.index() as usize] == 0
                        && a[C1.index() as usize] == 0
                    {
                        out.push(Move::new(E1, C1, Piece::King));
                    }
                }
                Color::Black => {
                    if self.can_castle[1][crate::board::KING_SIDE]
                        && self.piece_on(F8) == Piece::None
                        && self.piece_on(G8) == Piece::None
                        && a[F8.index() as usize] == 0
                        && a[G8.index() as usize] == 0
                    {
                        out.push(Move::new(E8, G8, Piece::King));
                    }
                    if self.can_castle[1][crate::board::QUEEN_SIDE]
                        && self.piece_on(D8) == Piece::None
                        && self.piece_on(C8) == Piece::None
                        && self.piece_on(B8) == Piece::None
                        && a[D8.index() as usize] == 0
                        && a[C8.index() as usize] == 0
                    {
                        out.push(Move::new(E8, C8, Piece::King));
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Tier: skipped underpromotions

    /// Rook and bishop promotions. Rarely best, so the search skips them;
    /// the legal-move enumeration appends them for completeness.
    pub fn skipped_moves(&self, out: &mut MoveList) {
        match self.on_move {
            Color::White => {
                self.white_pawn_moves_to(out, EIGHTH_RANK, Piece::Rook);
                self.white_pawn_moves_to(out, EIGHTH_RANK, Piece::Bishop);
            }
            Color::Black => {
                self.black_pawn_moves_to(out, FIRST_RANK, Piece::Rook);
                self.black_pawn_moves_to(out, FIRST_RANK, Piece::Bishop);
            }
        }
    }

    // ------------------------------------------------------------------
    // Check evasions

    /// Would removing our piece on `sq` expose our king to a slider? The
    /// candidate is lifted off the bitboards for the probe and put back.
    fn capture_is_pinned(&mut self, sq: Square) -> bool {
        let us = self.on_move;
        let p = self.piece_on(sq);
        self.remove_from_bitboards(us, p, sq);
        let uncovered = self.blocked_attacks(us.other(), sq);
        self.add_to_bitboards(us, p, sq);
        uncovered.has(self.king_square[us.idx()])
    }

    /// Captures that (probably) resolve a check: takes of a lone checker by
    /// non-king pieces, en-passant captures, and king takes onto undefended
    /// squares.
    pub fn check_evasion_captures(&mut self, out: &mut MoveList) {
        let us = self.on_move;
        let them = us.other();
        let king = self.king_square[us.idx()];
        let checks = self.attacks_to(king) & self.occupied[them.idx()];

        if !checks.more_than_one() && checks != 0 {
            let check_sq = checks.first_square();

            if check_sq.rank() != 0 && check_sq.rank() != 7 {
                let takers = self.attacks_to(check_sq) & self.occupied[us.idx()];
                for sq in takers.squares() {
                    if !self.capture_is_pinned(sq) {
                        out.push(Move::new(sq, check_sq, self.piece_on(sq)));
                    }
                }
            } else {
                // Back-rank checker: pawn captures of it promote.
                let takers = self.attacks_to(check_sq)
                    & !self.pieces[Piece::Pawn.idx()]
                    & self.occupied[us.idx()];
                for sq in takers.squares() {
                    if !self.capture_is_pinned(sq) {
                        out.push(Move::new(sq, check_sq, self.piece_on(sq)));
                    }
                }
                let pawns = self.attacks_to(check_sq)
                    & self.pieces[Piece::Pawn.idx()]
                    & self.occupied[us.idx()];
                for sq in pawns.squares() {
                    if !self.capture_is_pinned(sq) {
                        out.push(Move::promoting(sq, check_sq, Piece::Pawn, Piece::Queen));
                        out.push(Move::promoting(sq, check_sq, Piece::Pawn, Piece::Knight));
                    }
                }
            }
        }

        // En-passant captures can resolve a check too (the capture square is
        // not the checker's square, so the loop above never finds them).
        if self.en_passant.on_board() {
            match us {
                Color::White => self.white_pawn_captures_to(out, bit(self.en_passant)),
                Color::Black => self.black_pawn_captures_to(out, bit(self.en_passant)),
            }
        }

        let king_caps =
            self.attacks_from(Piece::King, king) & self.occupied[them.idx()];
        for sq in king_caps.squares() {
            if self.attacks[them.idx()][sq.index() as usize] == 0 {
                out.push(Move::new(king, sq, Piece::King));
            }
        }
    }

    /// The rest of the evasions: interpositions (moved or dropped) against a
    /// lone checker, and king flights to empty, unattacked squares.
    pub fn check_evasion_others(&mut self, out: &mut MoveList) {
        let us = self.on_move;
        let them = us.other();
        let king = self.king_square[us.idx()];
        let checks = self.attacks_to(king) & self.occupied[them.idx()];

        if !checks.more_than_one() && checks != 0 {
            let check_sq = checks.first_square();
            let mut possible =
                tables().squares_to[king.index() as usize][check_sq.index() as usize];
            possible.unset(check_sq);

            for p in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
                for sq in (self.pieces[p.idx()] & self.occupied[us.idx()]).squares() {
                    let dest = if p == Piece::Knight {
                        tables().knight_attacks[sq.index() as usize] & possible
                    } else {
                        self.attacks_from(p, sq) & possible
                    };
                    fill(out, sq, p, dest);
                }
            }

            match us {
                Color::White => {
                    self.white_pawn_moves_to(out, possible & !EIGHTH_RANK, Piece::None);
                    self.white_pawn_moves_to(out, possible & EIGHTH_RANK, Piece::Queen);
                    self.white_pawn_moves_to(out, possible & EIGHTH_RANK, Piece::Knight);
                }
                Color::Black => {
                    self.black_pawn_moves_to(out, possible & !FIRST_RANK, Piece::None);
                    self.black_pawn_moves_to(out, possible & FIRST_RANK, Piece::Queen);
                    self.black_pawn_moves_to(out, possible & FIRST_RANK, Piece::Knight);
                }
            }

            if self.in_hand(us, Piece::Pawn) > 0 {
                for to in (possible & !(FIRST_RANK | EIGHTH_RANK)).squares() {
                    out.push(Move::drop(Piece::Pawn, to));
                }
            }
            for p in [Piece::Rook, Piece::Knight, Piece::Bishop, Piece::Queen] {
                if self.in_hand(us, p) > 0 {
                    for to in possible.squares() {
                        out.push(Move::drop(p, to));
                    }
                }
            }
        }

        let flights = self.attacks_from(Piece::King, king) & !self.occupied_all();
        for sq in flights.squares() {
            if self.attacks[them.idx()][sq.index() as usize] == 0 {
                out.push(Move::new(king, sq, Piece::King));
            }
        }
    }
}
