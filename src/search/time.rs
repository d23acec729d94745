//! The move-time budget.
//!
//! Clocks arrive from the protocol in centiseconds and are only as fresh as
//! the last `time`/`otim` line; the budget is recomputed before every root
//! iteration and both the poller and the root check it. Learned opening
//! scores and desperate positions stretch or shrink it after the fact.

use std::time::Instant;

use crate::board::{Color, Rules};

#[derive(Clone)]
pub struct Clock {
    /// Milliseconds left, per color, per the last protocol update.
    remaining_ms: [i64; 2],
    /// Black's clock when the game began; the Bughouse budget leans on it.
    pub initial_ms: i64,
    /// When our current think started.
    last_move: Instant,
    /// The current budget.
    pub ms_per_move: f64,
    /// `sd` and `snodes` limits; zero means unlimited.
    pub fixed_depth: usize,
    pub fixed_nodes: u64,
}

impl Default for Clock {
    fn default() -> Self {
        Clock {
            remaining_ms: [60_000; 2],
            initial_ms: 60_000,
            last_move: Instant::now(),
            ms_per_move: 1_000.0,
            fixed_depth: 0,
            fixed_nodes: 0,
        }
    }
}

impl Clock {
    pub fn set_time_cs(&mut self, c: Color, centiseconds: i64) {
        self.remaining_ms[c.idx()] = centiseconds * 10;
    }

    pub fn time_ms(&self, c: Color) -> i64 {
        self.remaining_ms[c.idx()]
    }

    pub fn note_initial_time(&mut self) {
        self.initial_ms = self.remaining_ms[Color::Black.idx()];
    }

    pub fn set_last_move_now(&mut self) {
        self.last_move = Instant::now();
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.last_move.elapsed().as_millis() as i64
    }

    /// Has the budget for this move run out?
    pub fn time_to_move(&self) -> bool {
        self.elapsed_ms() as f64 >= self.ms_per_move
    }

    /// Set the budget for the move about to be searched. Crazyhouse plays on
    /// its own clock; Bughouse also hurries when the opponent (and therefore
    /// possibly the partner) is short.
    pub fn calc_time_to_spend(&mut self, rules: Rules, my_color: Color, unbounded: bool) {
        if unbounded {
            self.ms_per_move = 100_000_000.0;
            return;
        }

        let mut mine = self.remaining_ms[my_color.idx()];
        let theirs = self.remaining_ms[my_color.other().idx()];

        self.ms_per_move = match rules {
            Rules::Bughouse => {
                if theirs < mine {
                    mine = theirs;
                }
                let mut ms = (self.initial_ms / 360 + mine / 360) as f64;
                if mine <= 20_000 {
                    ms = (mine / 180) as f64;
                }
                if mine <= 4_000 {
                    ms = 40.0;
                }
                if mine <= 800 {
                    ms = 5.0;
                }
                ms
            }
            Rules::Crazyhouse => {
                let mut ms = (mine / 25) as f64;
                if mine <= 20_000 {
                    ms = (mine / 40) as f64;
                }
                if mine <= 4_000 {
                    ms = 100.0;
                }
                if mine <= 800 {
                    ms = 20.0;
                }
                ms
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crazyhouse_budget_scales_with_the_clock() {
        let mut clock = Clock::default();
        clock.set_time_cs(Color::White, 25_000); // 250 s
        clock.calc_time_to_spend(Rules::Crazyhouse, Color::White, false);
        assert_eq!(clock.ms_per_move, 10_000.0);

        clock.set_time_cs(Color::White, 1_000); // 10 s
        clock.calc_time_to_spend(Rules::Crazyhouse, Color::White, false);
        assert_eq!(clock.ms_per_move, 250.0);

        clock.set_time_cs(Color::White, 50); // 0.5 s
        clock.calc_time_to_spend(Rules::Crazyhouse, Color::White, false);
        assert_eq!(clock.ms_per_move, 20.0);
    }

    #[test]
    fn bughouse_budget_is_clamped_by_the_other_clock() {
        let mut clock = Clock::default();
        clock.set_time_cs(Color::White, 30_000);
        clock.set_time_cs(Color::Black, 1_000); // opponent at 10 s
        clock.calc_time_to_spend(Rules::Bughouse, Color::White, false);
        assert_eq!(clock.ms_per_move, (10_000 / 180) as f64);
    }

    #[test]
    fn unbounded_mode_never_times_out() {
        let mut clock = Clock::default();
        clock.calc_time_to_spend(Rules::Crazyhouse, Color::White, true);
        assert!(!clock.time_to_move());
    }
}
