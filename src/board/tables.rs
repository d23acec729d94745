//! Precomputed attack and geometry tables.
//!
//! Everything here is built once, on first use, from loop-defined invariants;
//! nothing depends on runtime state. The sliding-piece tables are indexed by
//! an 8-bit occupancy slice of the relevant line, taken from one of the three
//! auxiliary occupancy encodings the board maintains (file-major as-is for
//! lines that vary the rank, rank/file-mirrored for lines that vary the file,
//! and two diagonal permutations).
//!
//! Naming convention: `rank_attacks` varies the *rank* coordinate, i.e. it
//! runs up and down the square's file; `file_attacks` varies the file and
//! runs along the square's rank.

use once_cell::sync::Lazy;

use crate::bitboard::{Bitboard, BitboardExt, bit};
use crate::square::Square;

use super::Piece;

/// The order in which the fifteen up-left diagonals (keyed by `rank + file`)
/// are packed into bit positions. The single constraint is that the first
/// eight entries sum to exactly 32 squares so that no diagonal straddles the
/// 32-bit half-word boundary; pulling the length-4 diagonal 11 forward next
/// to diagonal 2 is what makes the sums come out.
const DIAG_ORDER: [usize; 15] = [0, 1, 2, 11, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14];

pub struct Tables {
    /// Squares a pawn of the given color attacks from a square.
    pub pawn_attacks: [[Bitboard; 64]; 2],
    pub knight_attacks: [Bitboard; 64],
    pub king_attacks: [Bitboard; 64],
    /// Immediate-neighbor attack sets, used by mate-try generation: a check
    /// delivered from one of these squares cannot be interposed.
    pub contact_rook_attacks: [Bitboard; 64],
    pub contact_bishop_attacks: [Bitboard; 64],
    /// Squares at distance two or less, king included; king-safety scan set.
    pub near_squares: [Bitboard; 64],

    /// Bit position of each square inside the two diagonal occupancy words.
    pub ul_shift: [u8; 64],
    pub ur_shift: [u8; 64],
    /// Right-shift that brings a square's whole diagonal to the low bits.
    pub ul_diag_shift: [u8; 64],
    pub ur_diag_shift: [u8; 64],

    /// `[sq][occ8]` sliding lookups; see the module doc for the naming.
    pub rank_attacks: Vec<[Bitboard; 256]>,
    pub file_attacks: Vec<[Bitboard; 256]>,
    pub diag_ul_attacks: Vec<[Bitboard; 256]>,
    pub diag_ur_attacks: Vec<[Bitboard; 256]>,

    /// Squares strictly after `a` up to and including `b`, for aligned pairs;
    /// for a knight-leap pair just `{b}`; empty otherwise.
    pub squares_to: Vec<[Bitboard; 64]>,
    /// Squares on the same line beyond `b`, out to and including the edge.
    pub squares_past: Vec<[Bitboard; 64]>,
    /// Which slider kind moves along the `a`→`b` line (else `Piece::None`).
    pub direction_piece: Vec<[Piece; 64]>,
}

static TABLES: Lazy<Tables> = Lazy::new(build);

#[inline(always)]
pub fn tables() -> &'static Tables {
    &TABLES
}

fn sq_at(file: i16, rank: i16) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::new(file as u8, rank as u8))
    } else {
        None
    }
}

/// Walk from `from` in direction `(df, dr)` under the occupancy byte `occ`,
/// reading each square's bit through `line_bit`. Sets every square up to and
/// including the first blocker or the board edge.
fn slide(from: Square, df: i16, dr: i16, occ: u16, line_bit: &dyn Fn(Square) -> u8) -> Bitboard {
    let mut bb: Bitboard = 0;
    let (mut f, mut r) = (from.file() as i16, from.rank() as i16);
    loop {
        f += df;
        r += dr;
        let Some(t) = sq_at(f, r) else { break };
        bb.set(t);
        if occ >> line_bit(t) & 1 != 0 {
            break;
        }
    }
    bb
}

fn build() -> Tables {
    let mut t = Tables {
        pawn_attacks: [[0; 64]; 2],
        knight_attacks: [0; 64],
        king_attacks: [0; 64],
        contact_rook_attacks: [0; 64],
        contact_bishop_attacks: [0; 64],
        near_squares: [0; 64],
        ul_shift: [0; 64],
        ur_shift: [0; 64],
        ul_diag_shift: [0; 64],
        ur_diag_shift: [0; 64],
        rank_attacks: vec![[0; 256]; 64],
        file_attacks: vec![[0; 256]; 64],
        diag_ul_attacks: vec![[0; 256]; 64],
        diag_ur_attacks: vec![[0; 256]; 64],
        squares_to: vec![[0; 64]; 64],
        squares_past: vec![[0; 64]; 64],
        direction_piece: vec![[Piece::None; 64]; 64],
    };

    build_diag_shifts(&mut t);
    build_leapers(&mut t);
    build_sliders(&mut t);
    build_lines(&mut t);
    build_near_squares(&mut t);
    t
}

/// Derive all four diagonal permutation tables from `DIAG_ORDER`.
fn build_diag_shifts(t: &mut Tables) {
    // Base bit offset of every up-left diagonal (keyed by rank + file).
    let mut base = [0u8; 15];
    let mut next = 0u8;
    for &d in &DIAG_ORDER {
        base[d] = next;
        let len = if d <= 7 { d + 1 } else { 15 - d } as u8;
        next += len;
    }
    debug_assert_eq!(next, 64);

    for i in 0..64u8 {
        let sq = Square::from_index(i);
        let (f, r) = (sq.file() as usize, sq.rank() as usize);
        let d = f + r;
        t.ul_diag_shift[i as usize] = base[d];
        t.ul_shift[i as usize] = base[d] + (d.min(7) - f) as u8;
    }
    // Up-right diagonals are the up-left layout under a file flip.
    for i in 0..64u8 {
        let sq = Square::from_index(i);
        let m = Square::new(7 - sq.file(), sq.rank()).index() as usize;
        t.ur_diag_shift[i as usize] = t.ul_diag_shift[m];
        t.ur_shift[i as usize] = t.ul_shift[m];
    }
}

fn build_leapers(t: &mut Tables) {
    for i in 0..64u8 {
        let sq = Square::from_index(i);
        let (f, r) = (sq.file() as i16, sq.rank() as i16);
        let n = i as usize;

        for df in -1i16..=1 {
            for dr in -1i16..=1 {
                if df == 0 && dr == 0 {
                    continue;
                }
                if let Some(to) = sq_at(f + df, r + dr) {
                    t.king_attacks[n].set(to);
                    if df == 0 || dr == 0 {
                        t.contact_rook_attacks[n].set(to);
                    } else {
                        t.contact_bishop_attacks[n].set(to);
                    }
                }
            }
        }

        for (df, dr) in [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)] {
            if let Some(to) = sq_at(f + df, r + dr) {
                t.knight_attacks[n].set(to);
            }
        }

        for df in [-1i16, 1] {
            if let Some(to) = sq_at(f + df, r + 1) {
                t.pawn_attacks[0][n].set(to);
            }
            if let Some(to) = sq_at(f + df, r - 1) {
                t.pawn_attacks[1][n].set(to);
            }
        }
    }
}

fn build_sliders(t: &mut Tables) {
    let (ul_shift, ul_diag) = (t.ul_shift, t.ul_diag_shift);
    let (ur_shift, ur_diag) = (t.ur_shift, t.ur_diag_shift);
    let ul = move |q: Square| ul_shift[q.index() as usize] - ul_diag[q.index() as usize];
    let ur = move |q: Square| ur_shift[q.index() as usize] - ur_diag[q.index() as usize];

    for i in 0..64u8 {
        let sq = Square::from_index(i);
        let n = i as usize;
        for o in 0..256u16 {
            t.rank_attacks[n][o as usize] =
                slide(sq, 0, 1, o, &|q| q.rank()) | slide(sq, 0, -1, o, &|q| q.rank());
            t.file_attacks[n][o as usize] =
                slide(sq, 1, 0, o, &|q| q.file()) | slide(sq, -1, 0, o, &|q| q.file());
            t.diag_ul_attacks[n][o as usize] =
                slide(sq, -1, 1, o, &ul) | slide(sq, 1, -1, o, &ul);
            t.diag_ur_attacks[n][o as usize] =
                slide(sq, 1, 1, o, &ur) | slide(sq, -1, -1, o, &ur);
        }
    }
}

fn build_lines(t: &mut Tables) {
    for a in 0..64u8 {
        for b in 0..64u8 {
            if a == b {
                continue;
            }
            let (sa, sb) = (Square::from_index(a), Square::from_index(b));
            let (fa, ra) = (sa.file() as i16, sa.rank() as i16);
            let (fb, rb) = (sb.file() as i16, sb.rank() as i16);
            let (df, dr) = (fb - fa, rb - ra);

            let dir = if df == 0 || dr == 0 {
                Some((df.signum(), dr.signum(), Piece::Rook))
            } else if df.abs() == dr.abs() {
                Some((df.signum(), dr.signum(), Piece::Bishop))
            } else {
                None
            };

            let (an, bn) = (a as usize, b as usize);
            match dir {
                Some((sf, sr, kind)) => {
                    t.direction_piece[an][bn] = kind;

                    let mut to: Bitboard = 0;
                    let (mut f, mut r) = (fa, ra);
                    loop {
                        f += sf;
                        r += sr;
                        let q = sq_at(f, r).unwrap();
                        to.set(q);
                        if q == sb {
                            break;
                        }
                    }
                    t.squares_to[an][bn] = to;

                    let mut past: Bitboard = 0;
                    let (mut f, mut r) = (fb, rb);
                    while let Some(q) = sq_at(f + sf, r + sr) {
                        f += sf;
                        r += sr;
                        past.set(q);
                    }
                    t.squares_past[an][bn] = past;
                }
                None => {
                    if t.knight_attacks[an].has(sb) {
                        t.squares_to[an][bn] = bit(sb);
                    }
                }
            }
        }
    }
}

fn build_near_squares(t: &mut Tables) {
    for n in 0..64 {
        let mut near: Bitboard = 0;
        for q in t.king_attacks[n].squares() {
            near |= t.king_attacks[q.index() as usize];
        }
        t.near_squares[n] = near;
    }
}
