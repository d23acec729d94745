//! Move text. Raw algebraic (`e2e4`, `e7e8q`, `N@f6`, castling as `O-O` or
//! the king's two-square move) and standard algebraic (`Nf3`, `exd5`,
//! `Qh4+`) are both accepted; everything parsed is checked against the legal
//! move list, so what comes back is playable or `None`.

use crate::board::{Board, MoveList, Piece};
use crate::moves::types::Move;
use crate::square::Square;
use std::str::FromStr;

/// Raw algebraic text for a move; drops print as `P@e4`.
pub fn to_raw_algebraic(m: Move) -> String {
    m.to_string()
}

pub fn parse_move(board: &mut Board, text: &str) -> Option<Move> {
    let text = text.trim().trim_end_matches(['+', '#', '!', '?']);
    if text.is_empty() {
        return None;
    }

    let mut legal = MoveList::new();
    board.legal_moves(&mut legal);

    if let Some(m) = parse_castle(&legal, text) {
        return Some(m);
    }
    if let Some(m) = parse_drop(&legal, text) {
        return Some(m);
    }
    if let Some(m) = parse_raw(&legal, text) {
        return Some(m);
    }
    parse_san(board, &legal, text)
}

fn parse_castle(legal: &MoveList, text: &str) -> Option<Move> {
    let long = matches!(text, "O-O-O" | "0-0-0" | "o-o-o");
    let short = matches!(text, "O-O" | "0-0" | "o-o");
    if !long && !short {
        return None;
    }
    legal.iter().copied().find(|m| {
        m.moved() == Piece::King
            && !m.is_drop()
            && if short {
                m.to().index() == m.from().index() + 16
            } else {
                m.from().index() >= 16 && m.to().index() == m.from().index() - 16
            }
    })
}

fn parse_drop(legal: &MoveList, text: &str) -> Option<Move> {
    let (piece_part, square_part) = text.split_once('@')?;
    let piece = if piece_part.is_empty() {
        Piece::Pawn
    } else {
        Piece::from_letter(piece_part.chars().next()?)?
    };
    let to = Square::from_str(square_part).ok()?;
    legal
        .iter()
        .copied()
        .find(|m| m.is_drop() && m.moved() == piece && m.to() == to)
}

fn parse_raw(legal: &MoveList, text: &str) -> Option<Move> {
    let b = text.as_bytes();
    if b.len() < 4 || b.len() > 5 {
        return None;
    }
    let from = Square::from_str(std::str::from_utf8(&b[0..2]).ok()?).ok()?;
    let to = Square::from_str(std::str::from_utf8(&b[2..4]).ok()?).ok()?;
    let promotion = if b.len() == 5 { Piece::from_letter(b[4] as char) } else { None };

    legal.iter().copied().find(|m| {
        !m.is_drop()
            && m.from() == from
            && m.to() == to
            && match promotion {
                Some(p) => m.promotion() == p,
                None => m.promotion() == Piece::None,
            }
    })
}

fn parse_san(board: &Board, legal: &MoveList, text: &str) -> Option<Move> {
    let clean: String = text.chars().filter(|c| !matches!(c, 'x' | '=' | ':')).collect();
    if clean.len() < 2 {
        return None;
    }

    // A trailing uppercase letter is the promotion piece.
    let (clean, promotion) = match clean.chars().last() {
        Some(ch) if ch.is_ascii_uppercase() && clean.len() > 2 => {
            (&clean[..clean.len() - 1], Piece::from_letter(ch))
        }
        _ => (&clean[..], None),
    };

    let target = Square::from_str(clean.get(clean.len() - 2..)?).ok()?;
    let head = &clean[..clean.len() - 2];
    let mut head_chars = head.chars();

    let (piece, disambig) = match head_chars.next() {
        None => (Piece::Pawn, None),
        Some(first) if first.is_ascii_uppercase() => {
            (Piece::from_letter(first)?, head_chars.next())
        }
        Some(first) => (Piece::Pawn, Some(first)),
    };

    let candidates: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|m| {
            if m.is_drop() || m.to() != target {
                return false;
            }
            if board.piece_on(m.from()) != piece {
                return false;
            }
            match promotion {
                Some(p) => {
                    if m.promotion() != p {
                        return false;
                    }
                }
                None => {
                    if m.promotion() != Piece::None {
                        return false;
                    }
                }
            }
            match disambig {
                Some(d @ 'a'..='h') => m.from().file() == d as u8 - b'a',
                Some(d @ '1'..='8') => m.from().rank() == d as u8 - b'1',
                _ => true,
            }
        })
        .collect();

    if candidates.len() == 1 { Some(candidates[0]) } else { candidates.first().copied() }
}
