//! The transposition table: a power-of-two array indexed by the low bits of
//! the position hash, one entry per slot, tagged with the upper hash bits.
//!
//! Mate scores are normalized to be node-relative on store and re-anchored
//! to the probing node's ply on load, so a mate found through one path keeps
//! its distance when reached through another.

use tracing::info;

use crate::moves::types::Move;

use super::{MATE, ONE_PLY};

pub const EXACT: u8 = 0;
pub const FAIL_HIGH: u8 = 1;
pub const FAIL_LOW: u8 = 2;
pub const WORTHLESS: u8 = 3;

/// 16 MiB floor, the smallest table the engine will run with.
pub const MIN_HASH_MIB: usize = 16;

#[derive(Clone, Copy)]
pub struct Entry {
    key: u32,
    move_raw: u32,
    pub value: i16,
    pub depth: u8,
    pub kind: u8,
    /// Which game move the entry was written on (mod 8); older entries are
    /// overwritten freely.
    pub age: u8,
}

const EMPTY: Entry = Entry {
    key: 0,
    move_raw: Move::BAD.raw(),
    value: 0,
    depth: 0,
    kind: WORTHLESS,
    age: 0,
};

impl Entry {
    #[inline(always)]
    pub fn hash_move(&self) -> Move {
        Move::from_raw(self.move_raw)
    }

    /// Stored value re-anchored to `ply` plies from the root.
    #[inline(always)]
    pub fn value_at(&self, ply: i32) -> i32 {
        let v = self.value as i32;
        if v >= MATE {
            v - ply
        } else if v <= -MATE {
            v + ply
        } else {
            v
        }
    }
}

pub struct TranspositionTable {
    entries: Vec<Entry>,
    mask: usize,
    /// Advances with each real-game move, wrapping at 16.
    pub age: u8,
    pub filled: usize,
    pub hits: u64,
}

impl TranspositionTable {
    /// Size the table to at most `mib` mebibytes, clamped up to the minimum
    /// viable size and down to a power-of-two entry count.
    pub fn new(mib: usize) -> TranspositionTable {
        let mib = mib.max(MIN_HASH_MIB);
        let want = mib * 1024 * 1024 / std::mem::size_of::<Entry>();
        let mut capacity = 1usize;
        while capacity * 2 <= want {
            capacity *= 2;
        }
        info!(entries = capacity, mib, "transposition table sized");
        TranspositionTable {
            entries: vec![EMPTY; capacity],
            mask: capacity - 1,
            age: 0,
            filled: 0,
            hits: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything (the entries stay allocated). Used when the outside
    /// world changes the position under us.
    pub fn zap(&mut self) {
        for e in self.entries.iter_mut() {
            *e = EMPTY;
        }
        self.filled = 0;
    }

    pub fn advance_age(&mut self) {
        self.age = (self.age + 1) & 0x0F;
    }

    pub fn retreat_age(&mut self) {
        self.age = self.age.wrapping_sub(1) & 0x0F;
    }

    pub fn lookup(&mut self, hash: u64) -> Option<Entry> {
        let e = self.entries[(hash as usize) & self.mask];
        if e.kind != WORTHLESS && e.key == (hash >> 32) as u32 {
            self.hits += 1;
            Some(e)
        } else {
            None
        }
    }

    /// Store a search result. The bound kind falls out of comparing the
    /// value with the window the node was searched on.
    pub fn store(
        &mut self,
        hash: u64,
        depth_searched: i32,
        best_move: Move,
        value: i32,
        org_alpha: i32,
        org_beta: i32,
        ply: i32,
    ) {
        let kind = if value >= org_beta {
            FAIL_HIGH
        } else if value > org_alpha {
            EXACT
        } else {
            FAIL_LOW
        };

        let stored_value = if value >= MATE {
            value + ply
        } else if value <= -MATE {
            value - ply
        } else {
            value
        };

        let slot = (hash as usize) & self.mask;
        let e = &mut self.entries[slot];
        let depth = depth_searched.clamp(0, (MAX_STORED_DEPTH * ONE_PLY as usize) as i32) as u8;

        if e.kind == WORTHLESS || e.age != self.age || depth >= e.depth {
            if e.kind == WORTHLESS {
                self.filled += 1;
            }
            // Keep a known-good move if the new result cannot offer one.
            let move_raw = if best_move.is_bad() && e.key == (hash >> 32) as u32 {
                e.move_raw
            } else {
                best_move.raw()
            };
            *e = Entry {
                key: (hash >> 32) as u32,
                move_raw,
                value: stored_value.clamp(i16::MIN as i32, i16::MAX as i32) as i16,
                depth,
                kind,
                age: self.age,
            };
        }
    }

    pub fn fill_permille(&self) -> usize {
        if self.entries.is_empty() {
            0
        } else {
            self.filled * 1000 / self.entries.len()
        }
    }
}

/// Depths are stored in quarter-ply in a byte.
const MAX_STORED_DEPTH: usize = 63;
