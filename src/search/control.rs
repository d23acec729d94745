//! Cooperative interruption.
//!
//! The search owns the CPU between polls. A reader thread feeds stdin lines
//! into a channel; every ~20 000 node expansions the searcher drains it,
//! handles the few commands that only flip flags, and defers the rest to the
//! game loop, raising `stop_thinking` so the search unwinds promptly.
//! There is exactly one polling path, so plain flags are enough.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};

/// How many node expansions between input polls.
pub const POLL_INTERVAL: u32 = 20_000;

#[derive(Default)]
pub struct Controls {
    rx: Option<Receiver<String>>,
    /// Lines the searcher saw but the game loop must handle.
    pub pending: VecDeque<String>,
    /// Unwind the search and play what we have.
    pub stop_thinking: bool,
    /// Additionally, discard the result and search again.
    pub re_search: bool,
    /// Skip the sit-for-mate loop and move no matter what.
    pub force_move: bool,
    tick: u32,
}

impl Controls {
    pub fn attach(&mut self, rx: Receiver<String>) {
        self.rx = Some(rx);
    }

    pub fn new_search(&mut self) {
        self.stop_thinking = false;
        self.re_search = false;
        self.force_move = false;
    }

    /// Counted down by the searcher; true once per poll interval.
    #[inline(always)]
    pub fn tick(&mut self) -> bool {
        self.tick += 1;
        if self.tick > POLL_INTERVAL {
            self.tick = 0;
            true
        } else {
            false
        }
    }

    /// Pull everything the reader thread has; the caller interprets.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(rx) = &self.rx {
            loop {
                match rx.try_recv() {
                    Ok(line) => lines.push(line),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        lines.push("quit".to_string());
                        self.rx = None;
                        break;
                    }
                }
            }
        }
        lines
    }

    /// One blocking-ish wait step for "sit and listen" situations.
    pub fn wait_a_moment(&self) {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn tick_fires_once_per_interval() {
        let mut c = Controls::default();
        let mut fires = 0;
        for _ in 0..(POLL_INTERVAL * 2 + 2) {
            if c.tick() {
                fires += 1;
            }
        }
        assert_eq!(fires, 2);
    }

    #[test]
    fn disconnected_reader_turns_into_quit() {
        let mut c = Controls::default();
        let (tx, rx) = channel();
        c.attach(rx);
        tx.send("time 100".to_string()).unwrap();
        drop(tx);
        let lines = c.drain_lines();
        assert_eq!(lines, vec!["time 100".to_string(), "quit".to_string()]);
    }
}
