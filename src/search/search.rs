//! The searcher: iterative deepening over a principal-variation root, a
//! negamax recursion with null-move pruning, razoring and selective
//! extensions, and a winning-captures quiescence.
//!
//! Depth is counted in quarter-ply (`ONE_PLY = 4`) so extensions can be
//! fractional. Values are negamax, side-to-move relative; ±INFINITY is the
//! interrupted/illegal sentinel the root discards.

use std::time::Instant;

use tracing::{debug, info};

use crate::board::{Board, Color, MoveList, Piece, Rules};
use crate::bughouse::PartnerState;
use crate::moves::types::Move;
use crate::output::engine_println;

use super::control::Controls;
use super::history::History;
use super::learn::LearnTable;
use super::time::Clock;
use super::tt::{EXACT, FAIL_HIGH, FAIL_LOW, TranspositionTable, WORTHLESS};
use super::{
    ALMOST_MATE, DEPTH_LIMIT, EXTREME_EVAL, INFINITY, MATE, MATE_IN_ONE,
    MAX_QUIESCE_SEARCH_DEPTH, MAX_SEARCH_DEPTH, ONE_PLY, PrincipalVariation, fractional_deep,
};

/// Below this many quarter-ply to the horizon the node runs stand-pat plus
/// forcing moves only.
const CC_DEPTH: i32 = 3;
/// Null-move searches run `NULL_REDUCTION + 1` plies shallower.
const NULL_REDUCTION: i32 = 2;
const CAPTURE_EXTENSION: i32 = ONE_PLY / 2;
const FORCING_EXTENSION: i32 = ONE_PLY / 2;

/// Window/best tracking one node hands its helper passes.
struct Node {
    alpha: i32,
    beta: i32,
    best_value: i32,
    best_move: Move,
}

#[derive(Default)]
pub struct Stats {
    pub positions: u64,
    pub quiesce_positions: u64,
}

pub struct Searcher {
    pub board: Board,
    pub tt: TranspositionTable,
    pub learn: LearnTable,
    pub learning: bool,
    pub history: History,
    pub pv: PrincipalVariation,
    pub clock: Clock,
    pub controls: Controls,
    pub partner: PartnerState,
    /// The color the engine is playing.
    pub playing: Color,
    pub analyze_mode: bool,
    pub force_mode: bool,
    pub xboard: bool,
    pub pondering: bool,
    pub stats: Stats,

    current_depth: usize,
    pub(crate) moves_searched: usize,
    root_moves: Vec<Move>,
    start_time: Instant,
    last_analyze_update: Instant,
}

impl Searcher {
    pub fn new(rules: Rules, hash_mib: usize) -> Searcher {
        Searcher {
            board: Board::new(rules),
            tt: TranspositionTable::new(hash_mib),
            learn: LearnTable::new(),
            learning: false,
            history: History::new(),
            pv: PrincipalVariation::default(),
            clock: Clock::default(),
            controls: Controls::default(),
            partner: PartnerState::default(),
            playing: Color::Black,
            analyze_mode: false,
            force_mode: false,
            xboard: false,
            pondering: false,
            stats: Stats::default(),
            current_depth: 0,
            moves_searched: 0,
            root_moves: Vec::new(),
            start_time: Instant::now(),
            last_analyze_update: Instant::now(),
        }
    }

    #[inline(always)]
    fn eval_gate(&self) -> bool {
        self.partner.eval_gate(self.board.rules())
    }

    // ------------------------------------------------------------------
    // Interrupt handling

    /// Stop unless we are sitting (a sit outlasts the budget); pondering
    /// always stops.
    pub fn stop_thought(&mut self) {
        if !self.partner.sitting || self.pondering {
            self.controls.stop_thinking = true;
        }
    }

    pub fn sit(&mut self) {
        self.partner.sitting = true;
        engine_println!("tellics ptell sitting");
    }

    pub fn unsit(&mut self) {
        self.partner.sitting = false;
        self.partner.told_part_i_sit = false;
    }

    /// The every-20k-nodes poll point.
    #[inline(always)]
    fn poll_input(&mut self) {
        if self.controls.tick() {
            self.check_search_input();
        }
    }

    /// Non-blocking look at the clock and at pending input. Flag-only
    /// commands are handled here; anything that needs the game board is
    /// queued for the game loop and the search told to unwind.
    pub fn check_search_input(&mut self) {
        // The depth-1 iteration always runs to completion, whatever the
        // clock says: there must be a move to play.
        if self.clock.time_to_move() && self.current_depth >= 2 {
            self.stop_thought();
        }
        if self.analyze_mode && !self.xboard {
            self.maybe_analyze_update();
        }
        for line in self.controls.drain_lines() {
            self.handle_search_line(line);
        }
    }

    fn handle_search_line(&mut self, line: String) {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("time") => {
                if let Some(cs) = parts.next().and_then(|v| v.parse::<i64>().ok()) {
                    self.clock.set_time_cs(self.playing, cs);
                }
            }
            Some("otim") => {
                if let Some(cs) = parts.next().and_then(|v| v.parse::<i64>().ok()) {
                    self.clock.set_time_cs(self.playing.other(), cs);
                }
            }
            Some("?") => {
                self.unsit();
                self.controls.force_move = true;
                self.controls.stop_thinking = true;
            }
            Some(".") => self.analyze_status_line(),
            Some("ptell") => match parts.next() {
                Some("sit") => self.sit(),
                Some("go") => {
                    self.partner.part_told_go = true;
                    self.unsit();
                    self.stop_thought();
                }
                Some("sitting") | Some("frozen") => {
                    self.partner.part_sitting = true;
                    self.unsit();
                }
                Some("cancel") => {
                    self.partner.part_sitting = false;
                    self.partner.sitting = false;
                    self.partner.told_part_i_sit = false;
                }
                _ => {
                    // Partner said something that needs the game state
                    // (a move, help, chatter): the game loop's problem.
                    self.controls.pending.push_back(line);
                    self.controls.stop_thinking = true;
                }
            },
            Some(_) => {
                self.controls.pending.push_back(line);
                self.controls.stop_thinking = true;
            }
            None => {}
        }
    }

    /// The xboard `.` reply.
    fn analyze_status_line(&self) {
        if self.moves_searched < self.root_moves.len() {
            let m = self.root_moves[self.moves_searched];
            engine_println!(
                "stat01: {} {} {} {} 100 {}",
                self.start_time.elapsed().as_millis() / 10,
                self.stats.positions,
                self.current_depth,
                self.moves_searched,
                m
            );
        }
    }

    /// Console analyze mode gets a progress line every few seconds.
    fn maybe_analyze_update(&mut self) {
        if self.last_analyze_update.elapsed().as_secs() >= 4 {
            self.last_analyze_update = Instant::now();
            if self.moves_searched < self.root_moves.len() {
                engine_println!(
                    "{:8} nodes, searching {} ..  (hash {} permille)",
                    self.stats.positions,
                    self.root_moves[self.moves_searched],
                    self.tt.fill_permille()
                );
            }
        }
    }

    // ------------------------------------------------------------------
    // TT plumbing

    fn tt_store(
        &mut self,
        depth: i32,
        best_move: Move,
        value: i32,
        org_alpha: i32,
        org_beta: i32,
        ply: usize,
    ) {
        self.tt.store(
            self.board.hash(),
            depth.max(0),
            best_move,
            value,
            org_alpha,
            org_beta,
            ply as i32,
        );
    }

    // ------------------------------------------------------------------
    // Quiescence

    /// Stand pat or keep capturing: only winning captures (SEE at or above
    /// the margin) are searched.
    pub fn quiesce(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.controls.stop_thinking {
            return self.board.eval(self.eval_gate());
        }
        if self.board.in_check(self.board.off_move()) != 0 {
            // The previous mover left the king hanging; prune as illegal.
            return INFINITY;
        }

        let mut moves = MoveList::new();
        self.board.capture_moves(&mut moves);
        if ply >= MAX_QUIESCE_SEARCH_DEPTH || moves.is_empty() {
            return self.board.eval(self.eval_gate());
        }
        self.stats.quiesce_positions += 1;

        let mut best = self.board.eval(self.eval_gate());
        let winning = self.board.order_captures(&mut moves);

        for i in 0..winning {
            if best >= beta {
                break;
            }
            if best > alpha {
                alpha = best;
            }
            let m = moves[i];
            self.board.make(m);
            let value = -self.quiesce(-beta, -alpha, ply + 1);
            self.board.unmake();
            if value > best {
                best = value;
            }
        }
        best
    }

    // ------------------------------------------------------------------
    // The recursion

    fn child(&mut self, n: &mut Node, m: Move, depth: i32, ply: usize) -> bool {
        self.board.make(m);
        let value = -self.search(-n.beta, -n.alpha, depth, ply + 1, false);
        self.board.unmake();

        if value > n.best_value {
            n.best_value = value;
            n.best_move = m;
            self.pv.save(m, ply + 1);
        }
        if n.best_value > n.alpha {
            n.alpha = n.best_value;
        }
        n.best_value >= n.beta
    }

    fn rec_hash(&mut self, n: &mut Node, depth: i32, ply: usize, hash_move: Move) -> bool {
        if !hash_move.is_bad() && self.board.plausible_move(hash_move) {
            self.child(n, hash_move, depth, ply);
        }
        n.best_value >= n.beta
    }

    fn rec_captures(
        &mut self,
        n: &mut Node,
        depth: i32,
        ply: usize,
        hash_move: Move,
        winning_only: bool,
    ) -> bool {
        let mut moves = MoveList::new();
        self.board.capture_moves(&mut moves);
        let winning = self.board.order_captures(&mut moves);
        let count = if winning_only { winning } else { moves.len() };

        for i in 0..count {
            let m = moves[i];
            if m == hash_move && !hash_move.is_bad() {
                continue;
            }
            if self.child(n, m, depth, ply) {
                return true;
            }
        }
        false
    }

    fn rec_mate_tries(&mut self, n: &mut Node, depth: i32, ply: usize, hash_move: Move) -> bool {
        let mut moves = MoveList::new();
        self.board.mate_tries(&mut moves);
        for i in 0..moves.len() {
            let m = moves[i];
            if m == hash_move && !hash_move.is_bad() {
                continue;
            }
            if self.child(n, m, depth, ply) {
                return true;
            }
        }
        false
    }

    /// The full-width pass. Moves that neither give check, attack something
    /// worthwhile, nor flee an attacked piece get searched shallower.
    fn rec_full(&mut self, n: &mut Node, depth: i32, ply: usize, hash_move: Move) -> bool {
        let mut moves = MoveList::new();
        self.board.ai_moves(Some(&self.history), &mut moves);

        for i in 0..moves.len() {
            let m = moves[i];
            if m == hash_move && !hash_move.is_bad() {
                continue;
            }

            self.board.make(m);
            let interesting = self.board.in_check(self.board.to_move()) != 0
                || self.board.highest_attacked(m.to())
                || (!m.is_drop() && self.board.escaping_attack(m.from(), m.to()));
            let child_depth = if interesting {
                depth
            } else if depth < 6 * ONE_PLY {
                depth - 4
            } else if depth < 8 * ONE_PLY {
                depth - 3
            } else {
                depth - 2
            };
            let value = -self.search(-n.beta, -n.alpha, child_depth, ply + 1, false);
            self.board.unmake();

            if value > n.best_value {
                n.best_value = value;
                n.best_move = m;
                self.pv.save(m, ply + 1);
            }
            if n.best_value > n.alpha {
                n.alpha = n.best_value;
            }
            if n.best_value >= n.beta {
                return true;
            }
        }
        false
    }

    /// In check: hash move first, then checker captures, then blocks and
    /// flights. A forced reply extends, a crowded one shrinks a notch.
    fn rec_check_evasion(&mut self, n: &mut Node, depth: i32, ply: usize, hash_move: Move) {
        let mut moves = MoveList::new();
        let have_hash = !hash_move.is_bad() && self.board.plausible_move(hash_move);
        if have_hash {
            moves.push(hash_move);
        }
        let pre = moves.len();
        self.board.check_evasion_captures(&mut moves);
        self.board.check_evasion_others(&mut moves);
        let real_count = moves.len() - pre;

        let depth = match real_count {
            1 => depth + FORCING_EXTENSION,
            2..=3 => depth + 1,
            9.. => depth - 1,
            _ => depth,
        };

        for i in 0..moves.len() {
            let m = moves[i];
            if i != 0 && have_hash && m == hash_move {
                continue;
            }
            if self.child(n, m, depth, ply) {
                return;
            }
        }
    }

    /// One interior node. Returns a side-to-move-relative value; ±INFINITY
    /// marks interrupted or illegal lines for the caller to discard.
    pub fn search(
        &mut self,
        mut alpha: i32,
        mut beta: i32,
        depth: i32,
        ply: usize,
        was_null: bool,
    ) -> i32 {
        self.poll_input();
        self.stats.positions += 1;
        if self.clock.fixed_nodes != 0
            && self.stats.positions + self.stats.quiesce_positions > self.clock.fixed_nodes
        {
            self.stop_thought();
        }

        self.pv.clear_ply(ply);

        if self.controls.stop_thinking {
            return -INFINITY;
        }
        if self.board.in_check(self.board.off_move()) != 0 {
            // The reply that got us here was illegal.
            return INFINITY;
        }
        if ply >= DEPTH_LIMIT {
            return self.board.eval(self.eval_gate());
        }

        let (org_alpha, org_beta) = (alpha, beta);
        let mut best_from_tt = -INFINITY;
        let mut extensions = -ONE_PLY;

        let mut hash_move = Move::BAD;
        if let Some(te) = self.tt.lookup(self.board.hash()) {
            if te.depth as i32 >= depth && te.kind != WORTHLESS {
                let hv = te.value_at(ply as i32);
                match te.kind {
                    EXACT => return hv,
                    FAIL_HIGH => {
                        if beta <= hv {
                            return hv;
                        }
                        if hv > alpha {
                            best_from_tt = hv;
                            alpha = hv;
                        }
                    }
                    FAIL_LOW => {
                        if hv <= alpha {
                            return hv;
                        }
                        if beta > hv {
                            beta = hv;
                        }
                    }
                    _ => {}
                }
            }
            hash_move = te.hash_move();
        }

        let mut n = Node { alpha, beta, best_value: best_from_tt, best_move: Move::BAD };

        if !was_null && self.board.capture_extension_condition() {
            extensions += CAPTURE_EXTENSION;
        }

        if self.board.in_check(self.board.to_move()) != 0 {
            self.board.set_check_history(true);

            extensions += if depth > 5 * ONE_PLY {
                3
            } else if depth > 3 * ONE_PLY {
                2
            } else {
                1
            };
            self.rec_check_evasion(&mut n, depth + extensions, ply, hash_move);
        } else {
            self.board.set_check_history(false);
            self.board.set_best_capture();

            if depth < ONE_PLY || ply > MAX_SEARCH_DEPTH {
                let best_value = self.quiesce(alpha, beta, ply);
                self.tt_store(ONE_PLY - 1, Move::BAD, best_value, org_alpha, org_beta, ply);
                return best_value;
            }

            if depth > CC_DEPTH * ONE_PLY {
                // Null move: passing should be worse than any real move. Two
                // passes in a row make no sense, so `was_null` gates it.
                if !was_null {
                    self.board.make_null();
                    let null_value = -self.search(
                        -beta,
                        -beta + 1,
                        depth - (NULL_REDUCTION + 1) * ONE_PLY,
                        ply + 1,
                        true,
                    );
                    self.board.unmake_null();

                    if null_value >= beta {
                        if !self.controls.stop_thinking {
                            self.tt_store(depth, Move::BAD, null_value, org_alpha, org_beta, ply);
                        }
                        return null_value;
                    }
                }

                if !self.rec_hash(&mut n, depth + extensions, ply, hash_move)
                    && !self.rec_captures(&mut n, depth + extensions, ply, hash_move, false)
                {
                    self.rec_full(&mut n, depth + extensions, ply, hash_move);
                }
            } else {
                // Shallow: stand pat, then only forcing tries.
                let current_eval = self.board.eval(self.eval_gate());
                n.best_value = current_eval;
                if n.best_value > n.alpha {
                    n.alpha = n.best_value;
                }
                if current_eval >= beta {
                    self.tt_store(depth, n.best_move, n.best_value, org_alpha, org_beta, ply);
                    return n.best_value;
                }

                if !self.rec_hash(&mut n, depth + extensions, ply, hash_move)
                    && !self.rec_captures(&mut n, depth + extensions, ply, hash_move, true)
                {
                    self.rec_mate_tries(&mut n, depth + extensions, ply, hash_move);
                }
            }
        }

        if n.best_value == -INFINITY {
            // No legal continuation was found.
            n.best_value = match self.board.rules() {
                Rules::Crazyhouse => -MATE_IN_ONE + ply as i32 / 2 + 1,
                Rules::Bughouse => {
                    if self.board.cant_block() {
                        -MATE_IN_ONE + self.board.bughouse_mate_eval(self.eval_gate())
                    } else {
                        // Checked, but a drop could block: just a very bad
                        // wait, not a mate.
                        -ALMOST_MATE
                    }
                }
            };
        }

        if !self.controls.stop_thinking {
            self.tt_store(depth, n.best_move, n.best_value, org_alpha, org_beta, ply);
            if !n.best_move.is_bad()
                && self.board.piece_on(n.best_move.to()) == Piece::None
            {
                self.history.update(n.best_move, self.board.to_move(), depth.max(0));
            }
        }

        n.best_value
    }

    // ------------------------------------------------------------------
    // Root

    /// First root move: null-window probe at the previous value, then widen
    /// on the failing side until the value is exact.
    fn search_first_move(&mut self, m: Move, depth: i32, guess: i32) -> i32 {
        let alpha = guess;
        let beta = guess + 1;

        self.board.make(m);
        let learn_value = if self.learning { self.learn.probe(self.board.hash()) } else { 0 };
        self.clock.ms_per_move -= (learn_value * 4) as f64;
        let value =
            learn_value - self.search(-beta + learn_value, -alpha + learn_value, depth - ONE_PLY, 1, false);
        self.board.unmake();
        if self.controls.stop_thinking {
            return -INFINITY;
        }

        if value >= beta {
            // Fail high: the true value is at least `value`.
            let alpha = value;
            self.board.make(m);
            let value =
                learn_value - self.search(-INFINITY, -alpha + learn_value, depth - ONE_PLY, 1, false);
            self.board.unmake();
            if self.controls.stop_thinking { -INFINITY } else { value }
        } else {
            // Fail low: the true value is at most `value`.
            let beta = value;
            self.board.make(m);
            let value =
                learn_value - self.search(-beta + learn_value, INFINITY, depth - ONE_PLY, 1, false);
            self.board.unmake();
            if self.controls.stop_thinking { -INFINITY } else { value }
        }
    }

    /// Any later root move: scout against the best value; re-search wide on
    /// a fail-high. Uninteresting moves are razored even here.
    fn search_move(&mut self, m: Move, depth: i32, alpha: i32) -> i32 {
        let beta = alpha + 1;

        self.board.make(m);
        let learn_value = if self.learning { self.learn.probe(self.board.hash()) } else { 0 };
        self.clock.ms_per_move -= (learn_value * 4) as f64;

        let razor = if self.board.in_check(self.board.to_move()) != 0
            || self.board.highest_attacked(m.to())
            || (!m.is_drop() && self.board.escaping_attack(m.from(), m.to()))
        {
            0
        } else if depth - ONE_PLY < 6 * ONE_PLY {
            -4
        } else if depth - ONE_PLY < 8 * ONE_PLY {
            -3
        } else {
            -2
        };

        let value = learn_value
            - self.search(
                -beta + learn_value,
                -alpha + learn_value,
                depth - ONE_PLY + razor,
                1,
                false,
            );
        self.board.unmake();
        if self.controls.stop_thinking {
            return -INFINITY;
        }
        if value < beta {
            return value;
        }

        // Better than the best so far; find out by how much.
        let alpha = value;
        self.board.make(m);
        let value = learn_value
            - self.search(-INFINITY, -alpha + learn_value, depth - ONE_PLY + razor, 1, false);
        self.board.unmake();
        if self.controls.stop_thinking {
            return alpha;
        }
        value
    }

    fn print_pv(&mut self, mut value: i32) {
        let cs = self.start_time.elapsed().as_millis() as i64 / 10;
        if cs < 2 && !self.analyze_mode {
            return;
        }
        if self.board.to_move() == Color::Black && self.analyze_mode {
            value = -value;
        }

        let line = self
            .pv
            .line()
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        if self.xboard {
            if cs > 15 || self.current_depth > 6 {
                engine_println!(
                    "{} {} {} {} {}",
                    self.current_depth, value, cs, self.stats.positions, line
                );
            }
        } else {
            engine_println!(
                "{:3}  {:6}  {:5} {:8}  {}",
                self.current_depth, value, cs, self.stats.positions, line
            );
        }
    }

    /// Iterative deepening. Returns the chosen move (bad when interrupted
    /// before any move was explored) and its value.
    pub fn search_root(&mut self, max_depth: usize) -> (Move, i32) {
        self.start_time = Instant::now();
        self.last_analyze_update = Instant::now();
        self.stats = Stats::default();
        self.tt.hits = 0;

        let mut right_move = Move::BAD;
        let mut best_value = -INFINITY;
        let mut best_value_ever = -INFINITY;
        let mut best_move_last_ply = Move::BAD;
        let mut searched_first_move = false;
        let mut start_depth = 1usize;
        let mut doubled_for_despair = false;

        self.board.set_check_history(self.board.in_check(self.board.to_move()) != 0);
        self.board.set_best_capture();

        let mut legal = MoveList::new();
        self.board.legal_moves(&mut legal);
        self.root_moves = legal.iter().copied().collect();
        let count = self.root_moves.len();
        let mut values = vec![-INFINITY; count.max(2)];

        // Only one legal move: in Crazyhouse just play it.
        if count == 1 && self.board.rules() == Rules::Crazyhouse && !self.analyze_mode {
            return (self.root_moves[0], -INFINITY);
        }
        if count == 0 {
            self.moves_searched = 0;
            engine_println!("  0 -32000       0        0  #-0");
            return (Move::BAD, -INFINITY);
        }

        // A prior exact entry seeds the move ordering, the value, and the
        // starting depth.
        if let Some(te) = self.tt.lookup(self.board.hash()) {
            let hm = te.hash_move();
            if te.kind == EXACT && !hm.is_bad() {
                if let Some(pos) = self.root_moves.iter().position(|&m| m == hm) {
                    self.root_moves.swap(0, pos);
                    right_move = hm;
                    best_value = te.value_at(0);
                    searched_first_move = true;
                    start_depth = (te.depth as usize / ONE_PLY as usize) + 1;
                    self.pv.depth[0] = 0;
                    self.pv.depth[1] = 0;
                    engine_println!(
                        "{:3}  {:6}      0       0  {} <already searched>",
                        start_depth, best_value, hm
                    );
                }
            } else if te.kind != WORTHLESS {
                best_value = te.value_at(0);
            }
        }

        self.clock.calc_time_to_spend(
            self.board.rules(),
            self.playing,
            self.clock.fixed_depth != 0 || self.analyze_mode,
        );

        self.current_depth = start_depth;
        while self.current_depth < max_depth || self.partner.sitting {
            self.moves_searched = 0;

            // Desperation: about to be mated, spend double the time once.
            if self.board.rules() == Rules::Crazyhouse
                && best_value <= -EXTREME_EVAL
                && self.current_depth > 5
                && !doubled_for_despair
            {
                self.clock.ms_per_move *= 2.0;
                doubled_for_despair = true;
            }

            if ((self.clock.time_to_move() && self.current_depth >= 2)
                || (self.clock.fixed_depth != 0 && self.current_depth >= self.clock.fixed_depth))
                && !self.partner.sitting
            {
                self.stop_thought();
                break;
            }

            if !searched_first_move {
                let value = self.search_first_move(
                    self.root_moves[0],
                    fractional_deep(self.current_depth),
                    best_value,
                );
                if self.controls.stop_thinking {
                    break;
                }
                best_value = value;
                values[0] = value;
                right_move = self.root_moves[0];
                if value > best_value_ever {
                    best_move_last_ply = right_move;
                    best_value_ever = value;
                }
                self.pv.save(right_move, 1);
                self.print_pv(best_value);
            } else {
                searched_first_move = false;
            }

            // The previous iteration's runner-up fell away badly: give this
            // move more thought while there is clock for it.
            if self.board.rules() == Rules::Crazyhouse
                && count > 1
                && best_value + 40 < values[1]
                && self.current_depth > 7
                && self.clock.ms_per_move * 8.0
                    < self.clock.time_ms(self.board.to_move()) as f64
            {
                self.clock.ms_per_move = self.clock.ms_per_move / 2.0 * 3.0;
            }

            while self.moves_searched < count - 1 {
                self.moves_searched += 1;
                let m = self.root_moves[self.moves_searched];
                let value =
                    self.search_move(m, fractional_deep(self.current_depth), best_value);
                values[self.moves_searched] = value;

                // Out of time and not failing high: discard this move.
                if self.controls.stop_thinking && value == -INFINITY {
                    break;
                }
                if value > best_value {
                    right_move = m;
                    best_value = value;
                    self.pv.save(right_move, 1);
                    self.print_pv(best_value);
                }
                // Out of time but the move was already failing high: play it
                // even though its exact worth is unknown.
                if self.controls.stop_thinking {
                    break;
                }
            }

            // Re-sort the root moves by this iteration's values.
            loop {
                let mut done = true;
                for i in 0..count - 1 {
                    if values[i + 1] > values[i] {
                        values.swap(i, i + 1);
                        self.root_moves.swap(i, i + 1);
                        done = false;
                    }
                }
                if done {
                    break;
                }
            }

            // Mate found, getting mated, or one forced escape: move now.
            if (best_value > MATE
                || best_value < -MATE
                || values[1] < -MATE_IN_ONE + 3)
                && !self.analyze_mode
            {
                self.stop_thought();
            }
            if self.controls.stop_thinking {
                break;
            }

            self.current_depth += 1;
        }

        // Swindle mode: if the exact line loses huge, fall back to the last
        // iteration's most survivable move.
        if best_value <= -EXTREME_EVAL && !best_move_last_ply.is_bad() && !self.analyze_mode {
            right_move = best_move_last_ply;
        }

        if !self.controls.re_search && !self.analyze_mode && !self.force_mode {
            self.print_pv(best_value);
            info!(
                best = %right_move,
                value = best_value,
                depth = self.current_depth.saturating_sub(1),
                searches = self.stats.positions,
                quiesces = self.stats.quiesce_positions,
                tt_hits = self.tt.hits,
                fill_permille = self.tt.fill_permille(),
                alloc_ms = self.clock.ms_per_move,
                "search finished"
            );
            if !self.xboard {
                engine_println!();
                engine_println!(
                    "Found move: {} {:+} fply: {}  searches: {} quiesces: {}",
                    right_move,
                    best_value,
                    self.current_depth.saturating_sub(1),
                    self.stats.positions,
                    self.stats.quiesce_positions
                );
                engine_println!(
                    "            T-hits: {} T-full: {} (permille)",
                    self.tt.hits,
                    self.tt.fill_permille()
                );
                engine_println!();
            }
        }

        debug!(move_num = self.board.move_num(), "root search done");
        (right_move, best_value)
    }

    /// Think on the opponent's time (Crazyhouse only). Produces no move;
    /// the point is a warm transposition table. Moves that trailed badly in
    /// earlier passes get searched a ply or two shallower.
    pub fn ponder(&mut self) {
        self.pondering = true;
        self.board.set_check_history(self.board.in_check(self.board.to_move()) != 0);
        self.board.set_best_capture();

        self.controls.new_search();
        self.current_depth = 1;
        self.stats = Stats::default();
        self.clock.ms_per_move = 100_000_000.0;

        let mut legal = MoveList::new();
        self.board.legal_moves(&mut legal);
        let mut moves: Vec<Move> = legal.iter().copied().collect();
        let count = moves.len();
        let mut values = vec![0i32; count.max(1)];
        self.start_time = Instant::now();

        'deepen: while !self.controls.stop_thinking && self.current_depth < MAX_SEARCH_DEPTH {
            if self.current_depth > 4 && !self.xboard && count > 0 {
                engine_println!(
                    "pondering {} {:6} [{:2}]",
                    moves[0], -values[0], self.current_depth
                );
            }

            for n in 0..count {
                let mut extension = 0;
                if n > 0 && self.current_depth > 3 {
                    if values[0] > values[n] + 150 {
                        extension = -ONE_PLY * 2;
                    } else if values[0] > values[n] + 80 {
                        extension = -ONE_PLY;
                    }
                }

                self.board.make(moves[n]);
                values[n] = -self.search(
                    -INFINITY,
                    INFINITY,
                    fractional_deep(self.current_depth.saturating_sub(1)) + extension,
                    1,
                    true,
                );
                self.board.unmake();

                if self.controls.stop_thinking {
                    break 'deepen;
                }
            }

            // Keep the most promising replies in front.
            loop {
                let mut done = true;
                for i in 0..count.saturating_sub(1) {
                    if values[i + 1] > values[i] {
                        values.swap(i, i + 1);
                        moves.swap(i, i + 1);
                        done = false;
                    }
                }
                if done {
                    break;
                }
            }
            self.current_depth += 1;
        }

        self.pondering = false;
    }
}
