//! The learn table: a small hash-indexed table of per-position scores that
//! survives across games and processes. The root search reads it as an
//! opening bias (a learned score stretches or shrinks the time budget and
//! nudges the window), and game results write it.
//!
//! On disk it is `learn.dat`, found through the `DB_DIRECTORY`, current
//! directory, `HOME` search order.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::board::Board;

/// How many plies of a finished game feed back into the table.
const LEARN_PLIES: usize = 16;

/// Entry count; at eight bytes apiece this is the classic 4 MiB table...
/// halved, since the entries here carry no move.
const LEARN_ENTRIES: usize = 1 << 18;

pub const LEARN_FILE: &str = "learn.dat";

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct LearnEntry {
    key: u64,
    score: i16,
}

const EMPTY: LearnEntry = LearnEntry { key: 0, score: 0 };

#[derive(Serialize, Deserialize)]
pub struct LearnTable {
    entries: Vec<LearnEntry>,
}

impl Default for LearnTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LearnTable {
    pub fn new() -> LearnTable {
        LearnTable { entries: vec![EMPTY; LEARN_ENTRIES] }
    }

    /// The learned score for a position, zero when unknown.
    pub fn probe(&self, hash: u64) -> i32 {
        let e = &self.entries[hash as usize & (LEARN_ENTRIES - 1)];
        if e.key == hash { e.score as i32 } else { 0 }
    }

    fn bump(&mut self, hash: u64, points: i32) {
        let e = &mut self.entries[hash as usize & (LEARN_ENTRIES - 1)];
        if e.key == hash {
            e.score = (e.score as i32 + points).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        } else {
            e.key = hash;
            e.score = points.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
    }

    /// Feed a finished game back: every opening position the game went
    /// through gets the result-scaled score. Custom (set up) games carry no
    /// opening information worth keeping.
    pub fn absorb_game(&mut self, game: &Board, points: i32) {
        if game.is_custom() {
            return;
        }
        let mut replay = Board::new(game.rules());
        let plies = (game.move_num() - 1).min(LEARN_PLIES);
        for i in 1..=plies {
            replay.make(game.move_history[i]);
            self.bump(replay.hash(), points);
        }
        info!(plies, points, "learn table updated from game");
    }

    fn file_path() -> PathBuf {
        if let Ok(dir) = std::env::var("DB_DIRECTORY") {
            return PathBuf::from(dir).join(LEARN_FILE);
        }
        let cwd = PathBuf::from(".").join(LEARN_FILE);
        if cwd.exists() {
            return cwd;
        }
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home).join(LEARN_FILE);
            if home.exists() {
                return home;
            }
        }
        cwd
    }

    pub fn load_from_disk() -> LearnTable {
        let path = Self::file_path();
        match std::fs::read(&path) {
            Ok(bytes) => match bincode::deserialize::<LearnTable>(&bytes) {
                Ok(table) if table.entries.len() == LEARN_ENTRIES => {
                    info!(?path, "learn table loaded");
                    table
                }
                Ok(_) => {
                    warn!(?path, "learn table has a stale layout, starting fresh");
                    LearnTable::new()
                }
                Err(err) => {
                    warn!(?path, %err, "learn table unreadable, starting fresh");
                    LearnTable::new()
                }
            },
            Err(_) => LearnTable::new(),
        }
    }

    pub fn save_to_disk(&self) {
        let path = Self::file_path();
        match bincode::serialize(self) {
            Ok(bytes) => {
                if let Err(err) = std::fs::write(&path, bytes) {
                    warn!(?path, %err, "could not save learn table");
                } else {
                    info!(?path, "learn table saved");
                }
            }
            Err(err) => warn!(%err, "could not serialize learn table"),
        }
    }
}

impl Board {
    /// True when the game did not start from the initial position.
    pub fn is_custom(&self) -> bool {
        self.custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Rules;
    use crate::moves::types::Move;
    use crate::board::MoveList;

    #[test]
    fn probe_miss_is_zero_and_bump_sticks() {
        let mut t = LearnTable::new();
        assert_eq!(t.probe(0x1234_5678_9ABC_DEF0), 0);
        t.bump(0x1234_5678_9ABC_DEF0, 120);
        assert_eq!(t.probe(0x1234_5678_9ABC_DEF0), 120);
        t.bump(0x1234_5678_9ABC_DEF0, -20);
        assert_eq!(t.probe(0x1234_5678_9ABC_DEF0), 100);
    }

    #[test]
    fn absorbing_a_game_scores_its_opening_positions() {
        let mut game = Board::new(Rules::Crazyhouse);
        let mut legal = MoveList::new();
        for _ in 0..4 {
            game.legal_moves(&mut legal);
            let m: Move = legal[0];
            game.make(m);
        }
        let mut t = LearnTable::new();
        t.absorb_game(&game, 50);
        assert_eq!(t.probe(game.hash()), 50);
    }
}
