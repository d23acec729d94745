//! Zobrist keys for the incremental position hash.
//!
//! The keys cover piece placements, in-hand counts, castling rights, side to
//! move and the en-passant file. They are generated once per process from a
//! fixed seed: the learn file stores raw hashes on disk, so the keys must be
//! identical from one run to the next.

use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Most pieces one side can ever hold of a single kind (all sixteen pawns).
pub const MAX_HAND: usize = 20;

const ZOBRIST_SEED: u64 = 0x6D6F_6F6E_7269_7365;

pub struct ZobristKeys {
    /// `[color][piece][square]`, piece indexed 1..=6.
    pub piece: [[[u64; 64]; 7]; 2],
    /// `[color][piece][count]`: holding `n` pieces XORs keys 1..=n.
    pub hand: [[[u64; MAX_HAND + 1]; 7]; 2],
    /// `[color][side]` with side 0 = queenside, 1 = kingside.
    pub castling: [[u64; 2]; 2],
    /// En-passant file a..h => 0..7.
    pub ep_file: [u64; 8],
    /// XORed in whenever Black is to move.
    pub side_to_move: u64,
}

pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(generate)
}

fn generate() -> ZobristKeys {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);

    // Zero keys would make distinct states collide trivially; skip them.
    let mut non_zero = move || loop {
        let v = rng.next_u64();
        if v != 0 {
            return v;
        }
    };

    let mut keys = ZobristKeys {
        piece: [[[0; 64]; 7]; 2],
        hand: [[[0; MAX_HAND + 1]; 7]; 2],
        castling: [[0; 2]; 2],
        ep_file: [0; 8],
        side_to_move: 0,
    };

    for c in 0..2 {
        for p in 1..7 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero();
            }
            for n in 1..=MAX_HAND {
                keys.hand[c][p][n] = non_zero();
            }
        }
        for side in 0..2 {
            keys.castling[c][side] = non_zero();
        }
    }
    for f in 0..8 {
        keys.ep_file[f] = non_zero();
    }
    keys.side_to_move = non_zero();

    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_within_a_process() {
        let a = zobrist_keys();
        let b = zobrist_keys();
        assert_eq!(a.side_to_move, b.side_to_move);
        assert_eq!(a.piece[0][1][0], b.piece[0][1][0]);
    }
}
