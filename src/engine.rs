//! The game loop and the XBoard-style command dispatch.
//!
//! One thread reads stdin into a channel; this loop drains it between moves
//! and the searcher drains it between node batches. Commands that reached
//! the searcher mid-think but need the game board land in a pending queue
//! and are replayed here once the search unwinds.

use tracing::{debug, warn};

use crate::board::{Board, Color, Piece, Rules};
use crate::bughouse::{looks_like_apology, partner_help};
use crate::moves::types::Move;
use crate::notation;
use crate::output::engine_println;
use crate::search::search::Searcher;
use crate::search::tt::{MIN_HASH_MIB, TranspositionTable};
use crate::search::{MATE, MATE_IN_ONE, MAX_SEARCH_DEPTH};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Copy)]
pub enum GameResult {
    WhiteMates,
    BlackMates,
    WhiteResigns,
    BlackResigns,
}

pub struct Engine {
    pub game: Board,
    pub search: Searcher,
    pub game_in_progress: bool,
    pub try_to_ponder: bool,
    sought_game: bool,
    pub rating_diff: i32,
    partner_name: String,
    override_move: Move,
    pub quit: bool,
}

impl Engine {
    pub fn new() -> Engine {
        let mut search = Searcher::new(Rules::Crazyhouse, MIN_HASH_MIB);
        // Until `go` or `analyze` says otherwise, we only observe.
        search.force_mode = true;
        Engine {
            game: Board::new(Rules::Crazyhouse),
            search,
            game_in_progress: false,
            try_to_ponder: true,
            sought_game: false,
            rating_diff: 0,
            partner_name: String::new(),
            override_move: Move::BAD,
            quit: false,
        }
    }

    fn rules(&self) -> Rules {
        self.game.rules()
    }

    // ------------------------------------------------------------------
    // Main loop

    pub fn run(&mut self) {
        while !self.quit {
            if self.search.xboard
                && !self.game_in_progress
                && !self.search.partner.partner
                && !self.search.analyze_mode
            {
                self.seek_game();
            }

            if self.game_in_progress && !self.search.force_mode {
                if self.game.to_move() == self.search.playing {
                    if let Some(m) = self.find_move() {
                        if self.game_in_progress
                            && !self.search.force_mode
                            && !self.search.analyze_mode
                        {
                            self.play_own_move(m);
                        }
                    }
                } else if self.rules() == Rules::Bughouse {
                    // Opponent stalling: maybe they wait for a piece; ask
                    // the partner to hold theirs back too.
                    if self.search.clock.elapsed_ms() > 10_000
                        && !self.search.partner.told_part_to_sit
                        && !self.search.partner.part_sitting
                    {
                        self.search.partner.told_part_to_sit = true;
                        engine_println!(
                            "tellics ptell sit (my opponent is waiting for something)"
                        );
                    }
                } else if self.game.move_num() > 1
                    && self.try_to_ponder
                    && !self.search.analyze_mode
                {
                    self.ponder();
                }
            }

            std::thread::sleep(std::time::Duration::from_millis(10));
            self.check_input();
        }
    }

    /// Drain and handle everything waiting; true if anything arrived.
    pub fn check_input(&mut self) -> bool {
        if self.search.clock.time_to_move() {
            self.search.stop_thought();
        }
        let mut lines: Vec<String> = self.search.controls.pending.drain(..).collect();
        lines.extend(self.search.controls.drain_lines());
        let was_input = !lines.is_empty();
        for line in lines {
            self.handle_command(&line);
            if self.quit {
                break;
            }
        }
        was_input
    }

    fn wait_for_input(&mut self) {
        while !self.quit && !self.check_input() {
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn process_pending(&mut self) {
        let lines: Vec<String> = self.search.controls.pending.drain(..).collect();
        for line in lines {
            self.handle_command(&line);
            if self.quit {
                break;
            }
        }
    }

    // ------------------------------------------------------------------
    // Thinking

    /// Find (and sit over, in Bughouse) the move to play.
    pub fn find_move(&mut self) -> Option<Move> {
        self.search.pondering = false;
        if self.game.move_num() < 3 {
            self.search.clock.note_initial_time();
        }

        let mut right_move;
        loop {
            self.search.board.clone_from(&self.game);
            self.override_move = Move::BAD;

            // Bughouse searches with ghost pieces: a rook, knight and pawn
            // in both hands stand for whatever the partner sends next.
            if self.search.partner.expect_ghost_pieces(self.rules()) {
                for c in [Color::White, Color::Black] {
                    for p in [Piece::Rook, Piece::Knight, Piece::Pawn] {
                        self.search.board.add_piece_to_hand(c, p, true);
                    }
                }
            }

            self.search.controls.new_search();
            self.search.partner.part_told_go = false; // one move at a time

            let (found, best_value) = self.search.search_root(MAX_SEARCH_DEPTH);
            right_move = found;

            if self.rules() == Rules::Bughouse {
                self.bughouse_sit_protocol(right_move, best_value);
            }

            self.process_pending();
            if self.quit {
                return None;
            }

            let keep_searching = self.search.controls.re_search
                && !self.game.is_legal(self.override_move)
                && !self.search.controls.force_move;
            if !keep_searching {
                break;
            }
        }

        if self.rules() == Rules::Bughouse {
            // A partner sitting unprompted for many moves is losing time.
            if self.search.partner.part_sitting && !self.search.partner.told_part_to_sit {
                self.search.partner.psitting_long += 1;
                if self.search.partner.psitting_long > 5 {
                    engine_println!("tellics ptell go (watch our time)");
                    self.search.partner.psitting_long = 0;
                }
            } else {
                self.search.partner.psitting_long = 0;
            }
            // Got the piece, or got released: stop sitting.
            if self.search.partner.told_part_i_sit {
                self.search.unsit();
            }
            // A sit request buys one move, no more.
            if self.search.partner.told_part_to_sit {
                self.search.partner.part_sitting = false;
            }
        }

        self.check_input();
        self.search.history.age();

        // An analysis that ran out of depth has nothing to do but listen.
        if self.search.analyze_mode && !self.search.controls.re_search {
            self.wait_for_input();
        }

        if self.game.is_legal(self.override_move) {
            return Some(self.override_move);
        }
        if right_move.is_bad() {
            // Interrupted before anything was searched: wait, don't move.
            None
        } else {
            Some(right_move)
        }
    }

    /// What the search verdict means for the two-board handshake.
    fn bughouse_sit_protocol(&mut self, right_move: Move, best_value: i32) {
        // The best move drops a ghost piece (or the position needs one):
        // tell the partner and sit until something arrives.
        if !self.game.is_legal(right_move)
            || (best_value > MATE && best_value < MATE_IN_ONE - 90)
        {
            if !self.search.partner.told_part_i_sit {
                let mate_note = if best_value > MATE { " with mate" } else { "" };
                engine_println!(
                    "tellics ptell sitting ({right_move}{mate_note}). Tell me \"sitting\" if no stuff comes for me or \"go\" to make one move ."
                );
                self.search.partner.told_part_i_sit = true;
            }
            self.wait_for_input();
            self.search.controls.re_search = true;
            self.search.clock.set_last_move_now();
        }

        // Recovered: release the partner.
        if best_value > -MATE && self.search.partner.told_part_to_sit {
            engine_println!("tellics ptell go (I am ok)");
            self.search.partner.told_part_to_sit = false;
        }

        if best_value <= -MATE_IN_ONE + 90 {
            // Mated on the spot: sit rather than play into it.
            if !self.search.partner.sitting {
                engine_println!("tellics ptell sitting (I am mated)");
                engine_println!("tellics ptell go");
                self.search.partner.sitting = true;
                while self.search.partner.sitting
                    && !self.search.controls.re_search
                    && !self.quit
                {
                    if !self.check_input() {
                        self.search.controls.wait_a_moment();
                    }
                }
            }
        } else if best_value <= -MATE && !self.search.partner.part_sitting {
            // Mated soon: ask the partner to sit and look again.
            self.search.controls.re_search = true;
            self.search.clock.set_last_move_now();
            engine_println!("tellics ptell sit (I am in trouble)");
            self.search.partner.part_sitting = true;
            self.search.partner.told_part_to_sit = true;
        }
    }

    fn ponder(&mut self) {
        self.search.board.clone_from(&self.game);
        self.search.ponder();
        // Pondered as deep as allowed: hold here until the world moves.
        if !self.search.controls.stop_thinking {
            self.wait_for_input();
        }
    }

    fn play_own_move(&mut self, m: Move) {
        if !self.game.play_checked(m) {
            warn!(%m, "search produced an illegal move");
            return;
        }
        engine_println!("move {m}");
        self.after_played_move(m);
    }

    fn after_played_move(&mut self, _m: Move) {
        self.search.clock.set_last_move_now();
        self.search.tt.advance_age();
        if self.game.is_checkmate() && !self.search.analyze_mode {
            self.search.force_mode = true;
            let result = if self.game.to_move() == Color::White {
                GameResult::BlackMates
            } else {
                GameResult::WhiteMates
            };
            self.report_result(result);
            self.game_in_progress = false;
        }
    }

    fn report_result(&self, res: GameResult) {
        match res {
            GameResult::WhiteMates => engine_println!("1-0 {{White Mates}}"),
            GameResult::BlackMates => engine_println!("0-1 {{Black Mates}}"),
            GameResult::WhiteResigns => engine_println!("0-1 {{White Resigns}}"),
            GameResult::BlackResigns => engine_println!("1-0 {{Black Resigns}}"),
        }
    }

    fn seek_game(&mut self) {
        if !self.sought_game {
            self.sought_game = true;
            for alias in ["gameend1", "gameend2", "gameend3", "gameend4"] {
                engine_println!("tellics {alias}");
            }
        }
    }

    fn reset_ai(&mut self) {
        self.search.partner.sitting = false;
        self.search.partner.told_part_i_sit = false;
        self.search.stop_thought();
        self.search.controls.force_move = true;
        self.search.controls.re_search = false;
    }

    fn start_search_over(&mut self) {
        self.search.controls.stop_thinking = true;
        self.search.controls.re_search = true;
        self.search.tt.zap();
    }

    // ------------------------------------------------------------------
    // Command dispatch

    pub fn handle_command(&mut self, line: &str) {
        let args: Vec<&str> = line.split_whitespace().collect();
        let cmd = match args.first() {
            Some(c) => *c,
            None => return,
        };
        let arg = |i: usize| args.get(i).copied().unwrap_or("");

        match cmd {
            // Options that mean nothing to us.
            "beep" | "random" | "bogus" | "draw" | "level" | "zchall" | "name" | "set"
            | "iset" | "accepted" | "rejected" | "post" | "computer" | "accept" => {}

            "xboard" => self.search.xboard = true,

            "protover" => {
                engine_println!(
                    "feature ping=0 draw=0 sigint=0 setboard=1 analyze=1 memory=1 myname=\"Moonrise {VERSION}\" variants=\"crazyhouse,bughouse\" done=1"
                );
            }

            "learn" => {
                self.search.learning = true;
                self.search.learn = crate::search::learn::LearnTable::load_from_disk();
                engine_println!("Learning is on.");
            }

            "memory" => {
                let total: usize = arg(1).parse().unwrap_or(MIN_HASH_MIB);
                // Leave some megabytes for everything that is not the table.
                let goal = total.saturating_sub(6).max(MIN_HASH_MIB);
                self.search.tt = TranspositionTable::new(goal);
            }

            "hash" => {
                let mib: usize = arg(1).parse().unwrap_or(MIN_HASH_MIB);
                self.search.tt = TranspositionTable::new(mib.max(MIN_HASH_MIB));
            }

            "analyze" => {
                self.search.analyze_mode = true;
                self.search.force_mode = false;
                self.search.playing = self.game.to_move();
                self.search.clock.set_last_move_now();
                self.start_search_over();
            }

            "exit" => {
                self.search.analyze_mode = false;
                self.search.force_mode = true;
                self.reset_ai();
            }

            "hard" => self.try_to_ponder = true,
            "easy" => self.try_to_ponder = false,

            "result" => {
                debug!(result = arg(1), "game over");
                if self.rules() == Rules::Crazyhouse && self.search.learning {
                    let diff = self.rating_diff.clamp(-500, 500);
                    let base = -diff / 5;
                    let we_won = (arg(1) == "1-0" && self.search.playing == Color::White)
                        || (arg(1) == "0-1" && self.search.playing == Color::Black);
                    let points = if we_won { base + 120 } else { base - 120 };
                    if arg(1) == "1-0" || arg(1) == "0-1" {
                        let mut learn = std::mem::take(&mut self.search.learn);
                        learn.absorb_game(&self.game, points);
                        self.search.learn = learn;
                    }
                }
                self.reset_ai();
                self.game_in_progress = false;
            }

            "new" | "variant" | "reset" => {
                if cmd != "new" && self.search.xboard && !self.search.analyze_mode {
                    engine_println!("tellics kibitz Hello from Moonrise {VERSION}");
                }
                self.search.stop_thought();
                let rules = if cmd == "variant" && arg(1) == "bughouse" {
                    Rules::Bughouse
                } else if cmd == "variant" {
                    Rules::Crazyhouse
                } else {
                    self.rules()
                };
                self.game.set_rules(rules);
                self.game.reset();
                self.search.board.set_rules(rules);
                self.search.partner.reset();
                self.search.history.reseed();
                self.search.tt.zap();
                self.reset_ai();
                self.game_in_progress = true;
                self.sought_game = false;
                if self.search.analyze_mode {
                    self.search.playing = self.game.to_move();
                }
            }

            "partner" => {
                if arg(1).is_empty() {
                    self.partner_name.clear();
                    self.search.partner.partner = false;
                    engine_println!("tellics set formula f4 && f2");
                } else if self.partner_name != arg(1) {
                    self.partner_name = arg(1).trim_start_matches('\u{7}').to_string();
                    self.search.partner.partner = true;
                    engine_println!("{}", partner_help("intro"));
                    engine_println!("tellics set formula f4 && f1");
                    engine_println!("tellics unseek");
                }
            }

            "?" => {
                self.search.unsit();
                self.search.stop_thought();
                self.search.controls.force_move = true;
            }

            "resign" => {
                let result = if self.search.playing == Color::White {
                    GameResult::BlackResigns
                } else {
                    GameResult::WhiteResigns
                };
                self.report_result(result);
                self.game_in_progress = false;
            }

            "tellics" => engine_println!("tellics {}", args[1..].join(" ")),

            "rating" => {
                let mine: i32 = arg(1).parse().unwrap_or(0);
                let theirs: i32 = arg(2).parse().unwrap_or(0);
                self.rating_diff = mine - theirs;
            }

            "sd" => self.search.clock.fixed_depth = arg(1).parse().unwrap_or(0),
            "snodes" => self.search.clock.fixed_nodes = arg(1).parse().unwrap_or(0),

            "time" => {
                if let Ok(cs) = arg(1).parse::<i64>() {
                    self.search.clock.set_time_cs(self.search.playing, cs);
                }
            }
            "otim" => {
                if let Ok(cs) = arg(1).parse::<i64>() {
                    self.search.clock.set_time_cs(self.search.playing.other(), cs);
                }
            }

            "white" => {
                self.game.set_side_to_move(Color::White);
                self.search.playing = Color::Black;
            }
            "black" => {
                self.game.set_side_to_move(Color::Black);
                self.search.playing = Color::White;
            }

            "go" => {
                if self.game_in_progress {
                    self.search.force_mode = false;
                    self.search.analyze_mode = false;
                    self.search.playing = self.game.to_move();
                    self.search.clock.set_last_move_now();
                    self.start_search_over();
                }
            }

            "quit" => {
                if self.search.learning {
                    self.search.learn.save_to_disk();
                }
                self.quit = true;
            }

            "undo" => {
                if !self.game.unplay() {
                    engine_println!("Cannot undo move");
                } else {
                    self.search.tt.retreat_age();
                }
                self.search.stop_thought();
                if self.search.analyze_mode {
                    self.search.playing = self.game.to_move();
                }
            }

            "remove" => {
                if self.game.move_num() < 3 {
                    engine_println!("Cannot remove last move");
                } else {
                    self.game.unplay();
                    self.game.unplay();
                    self.search.tt.retreat_age();
                    self.search.tt.retreat_age();
                    self.search.stop_thought();
                }
            }

            "force" => {
                if self.game_in_progress {
                    if !self.search.analyze_mode {
                        self.start_search_over();
                    } else {
                        self.search.stop_thought();
                    }
                }
                self.search.force_mode = true;
                self.search.analyze_mode = false;
            }

            "setboard" => {
                self.search.stop_thought();
                self.game.set_rules(Rules::Crazyhouse);
                self.search.board.set_rules(Rules::Crazyhouse);
                let fen = args[1..].join(" ");
                match self.game.set_position(&fen) {
                    Ok(()) => {
                        self.search.tt.zap();
                        self.reset_ai();
                        self.game_in_progress = true;
                        self.sought_game = false;
                        if self.search.analyze_mode {
                            self.search.playing = self.game.to_move();
                        }
                    }
                    Err(err) => engine_println!("Illegal position: {err}"),
                }
            }

            "holding" => {
                if self.rules() != Rules::Crazyhouse {
                    self.parse_holding(&args[1..].join(""));
                }
            }

            "." => {
                // Analyze status is the searcher's to answer; between
                // searches there is nothing to report.
            }

            "ptell" => {
                self.search.partner.partner = true;
                self.handle_ptell(arg(1), arg(2));
            }

            _ => self.handle_move_text(line, cmd),
        }
    }

    fn handle_ptell(&mut self, arg1: &str, arg2: &str) {
        if arg1.eq_ignore_ascii_case("help") {
            engine_println!("{}", partner_help(arg2));
            return;
        }
        if self.rules() == Rules::Crazyhouse && self.game_in_progress {
            return;
        }

        if let Some(m) = notation::parse_move(&mut self.game, arg1) {
            // The partner suggested a move: play it over our own judgment.
            self.override_move = m;
            self.search.controls.force_move = true;
            self.search.unsit();
            self.search.stop_thought();
            return;
        }

        match arg1.to_ascii_lowercase().as_str() {
            "sitting" | "frozen" => {
                self.search.partner.part_sitting = true;
                self.search.unsit();
            }
            "sit" => self.search.sit(),
            "go" | "move" => {
                self.search.partner.part_told_go = true;
                self.search.unsit();
                self.search.stop_thought();
            }
            "flag" => engine_println!("tellics flag"),
            "cancel" => {
                self.search.partner.part_sitting = false;
                self.search.partner.sitting = false;
                self.search.partner.told_part_i_sit = false;
            }
            "abort" => engine_println!("tellics abort"),
            "hi" | "hello" | "hiya" | "hi!" => engine_println!("tellics ptell hi!"),
            other => {
                if !looks_like_apology(other) && !looks_like_apology(arg2) {
                    engine_println!("tellics ptell Sorry , I didn't understand {arg1} {arg2}");
                }
            }
        }
    }

    fn handle_move_text(&mut self, line: &str, text: &str) {
        if !self.game_in_progress {
            engine_println!("Illegal move: {line}");
            return;
        }
        let m = match notation::parse_move(&mut self.game, text) {
            Some(m) => m,
            None => {
                engine_println!("Illegal move: {line}");
                return;
            }
        };
        if self.game.to_move() == self.search.playing
            && !self.search.force_mode
            && !self.search.analyze_mode
        {
            engine_println!("It is not your move");
        }
        if !self.game.play_checked(m) {
            engine_println!("Tried to play illegal move: {line}");
            return;
        }
        self.search.stop_thought();
        self.after_played_move(m);
        if self.search.analyze_mode {
            self.search.playing = self.game.to_move();
            self.search.clock.set_last_move_now();
            self.start_search_over();
        }
    }

    /// `holding [PNq][...]`: replace both hands.
    fn parse_holding(&mut self, text: &str) {
        let mut hands = [[0u8; 7]; 2];
        let mut side = 0usize;
        let mut in_bracket = false;
        for ch in text.chars() {
            match ch {
                '[' => in_bracket = true,
                ']' => {
                    if in_bracket {
                        side += 1;
                        in_bracket = false;
                        if side == 2 {
                            break;
                        }
                    }
                }
                _ if in_bracket => {
                    if let Some(p) = Piece::from_letter(ch) {
                        if p != Piece::King
                            && (hands[side][p.idx()] as usize)
                                < crate::board::zobrist::MAX_HAND
                        {
                            hands[side][p.idx()] += 1;
                        }
                    } else {
                        return;
                    }
                }
                _ => {}
            }
        }
        for (c, hand) in [(Color::White, hands[0]), (Color::Black, hands[1])] {
            for p in crate::board::HAND_PIECES {
                self.game.set_piece_in_hand(c, p, hand[p.idx()]);
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_resets_and_starts_a_game() {
        let mut e = Engine::new();
        e.handle_command("variant crazyhouse");
        assert!(e.game_in_progress);
        assert_eq!(e.rules(), Rules::Crazyhouse);
        e.handle_command("variant bughouse");
        assert_eq!(e.rules(), Rules::Bughouse);
    }

    #[test]
    fn moves_flow_into_the_game_board() {
        let mut e = Engine::new();
        e.handle_command("variant crazyhouse");
        e.handle_command("force");
        e.handle_command("e2e4");
        e.handle_command("e7e5");
        assert_eq!(e.game.move_num(), 3);
        e.handle_command("undo");
        assert_eq!(e.game.move_num(), 2);
        e.handle_command("nonsense");
        assert_eq!(e.game.move_num(), 2);
    }

    #[test]
    fn holding_updates_hands_in_bughouse() {
        let mut e = Engine::new();
        e.handle_command("variant bughouse");
        e.handle_command("holding [PPN] [q]");
        assert_eq!(e.game.in_hand(Color::White, Piece::Pawn), 2);
        assert_eq!(e.game.in_hand(Color::White, Piece::Knight), 1);
        assert_eq!(e.game.in_hand(Color::Black, Piece::Queen), 1);
        e.handle_command("holding [] []");
        assert_eq!(e.game.in_hand(Color::White, Piece::Pawn), 0);
    }

    #[test]
    fn setboard_loads_crazyhouse_positions() {
        let mut e = Engine::new();
        e.handle_command("setboard r3k3/8/8/8/8/8/8/4K2R[Qq] w K -");
        assert_eq!(e.game.in_hand(Color::White, Piece::Queen), 1);
        assert_eq!(e.game.in_hand(Color::Black, Piece::Queen), 1);
        assert!(e.game_in_progress);
    }

    #[test]
    fn partner_tells_drive_the_sit_flags() {
        let mut e = Engine::new();
        e.handle_command("variant bughouse");
        e.handle_command("ptell sitting");
        assert!(e.search.partner.part_sitting);
        e.handle_command("ptell go");
        assert!(e.search.partner.part_told_go);
        assert!(!e.search.partner.sitting);
        e.handle_command("ptell cancel");
        assert!(!e.search.partner.part_sitting);
    }

    #[test]
    fn partner_move_suggestions_become_the_override() {
        let mut e = Engine::new();
        e.handle_command("variant bughouse");
        e.handle_command("ptell e2e4");
        assert!(e.game.is_legal(e.override_move));
        assert!(e.search.controls.force_move);
    }

    #[test]
    fn time_commands_set_the_right_clocks() {
        let mut e = Engine::new();
        e.search.playing = Color::White;
        e.handle_command("time 1234");
        e.handle_command("otim 555");
        assert_eq!(e.search.clock.time_ms(Color::White), 12_340);
        assert_eq!(e.search.clock.time_ms(Color::Black), 5_550);
    }
}
