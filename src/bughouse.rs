//! Bughouse partner coordination.
//!
//! Sitting is not a move; it is a state. These flags track who asked whom to
//! sit and why, the search consults them for time, evaluation gating and the
//! sit-for-mate loop, and partner `ptell`s drive the transitions.

use crate::board::Rules;

#[derive(Default, Clone)]
pub struct PartnerState {
    /// We have a partner at all (bughouse).
    pub partner: bool,
    /// We are sitting, waiting for a piece.
    pub sitting: bool,
    /// We told the partner we are sitting on our own.
    pub told_part_i_sit: bool,
    /// We asked the partner to sit.
    pub told_part_to_sit: bool,
    /// The partner says they are sitting.
    pub part_sitting: bool,
    /// The partner released us for one move.
    pub part_told_go: bool,
    /// Moves in a row the partner has been sitting unprompted.
    pub psitting_long: i32,
}

impl PartnerState {
    pub fn reset(&mut self) {
        let partner = self.partner;
        *self = PartnerState::default();
        self.partner = partner;
    }

    /// Are the sit-material eval terms live? Only when nobody has promised
    /// us material is "the opponent has nothing to drop" worth points.
    pub fn eval_gate(&self, rules: Rules) -> bool {
        rules == Rules::Bughouse && !self.part_sitting && !self.part_told_go
    }

    /// Search with ghost pieces in hand? Same circumstances: material may
    /// arrive from the other board at any time.
    pub fn expect_ghost_pieces(&self, rules: Rules) -> bool {
        rules == Rules::Bughouse && !self.part_sitting && !self.part_told_go
    }
}

/// Canned `ptell` help texts, one per topic the partner may ask about.
pub fn partner_help(topic: &str) -> String {
    match topic.to_ascii_lowercase().as_str() {
        "intro" => "tellics ptell Hi. Thanks for being my partner. Tell me \"help\" for the commands I understand.".to_string(),
        "sitting" | "frozen" => "tellics ptell if you tell me that you are sitting I know that no stuff comes for me or my opponent.".to_string(),
        "sit" | "go" => "tellics ptell sit means to sit, go means to stop sitting.".to_string(),
        "flag" => "tellics ptell Use flag to tell me to flag my opponent (I usually have autoflag on, but sometimes I forget).".to_string(),
        "abort" => "tellics ptell Use abort to make me offer or accept an abort request".to_string(),
        "" => "tellics ptell I understand the following commands: sitting/frozen, sit, go/move, flag and abort. Also if you tell me a move then I'll play it. Tell me help <the command> for help on that command.".to_string(),
        other => format!("tellics ptell Sorry I don't have help on {other}"),
    }
}

/// The peer-loop guard: never reply "Sorry, ..." to a line that itself
/// apologizes, or two engines will chat forever.
pub fn looks_like_apology(text: &str) -> bool {
    text.contains("Sorry") || text.contains("OK,")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_opens_only_in_bughouse_without_promises() {
        let mut p = PartnerState::default();
        assert!(!p.eval_gate(Rules::Crazyhouse));
        assert!(p.eval_gate(Rules::Bughouse));
        p.part_sitting = true;
        assert!(!p.eval_gate(Rules::Bughouse));
        p.part_sitting = false;
        p.part_told_go = true;
        assert!(!p.eval_gate(Rules::Bughouse));
    }

    #[test]
    fn apology_guard_catches_both_phrasings() {
        assert!(looks_like_apology("Sorry I didn't understand that"));
        assert!(looks_like_apology("OK, going"));
        assert!(!looks_like_apology("sit"));
    }
}
