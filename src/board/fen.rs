//! Position setup from and to FEN, with the drop-variant extensions: a
//! bracketed holdings list after the board field (`[QRp]`, uppercase for
//! White) and a `~` suffix marking a piece that began life as a pawn.

use crate::bitboard::BitboardExt;
use crate::square::{A1, A8, E1, E8, H1, H8, OFF_BOARD, Square};

use super::{Board, Color, HAND_PIECES, KING_SIDE, Piece, QUEEN_SIDE};

impl Board {
    /// Load a position. `s` is `board [side [castling [ep]]]`; missing
    /// trailing fields default to White to move, no castling, no en passant.
    pub fn set_position(&mut self, s: &str) -> Result<(), String> {
        let mut fields = s.split_whitespace();
        let board_field = fields.next().ok_or("empty position string")?;
        let side_field = fields.next().unwrap_or("w");
        let castle_field = fields.next().unwrap_or("-");
        let ep_field = fields.next().unwrap_or("-");

        self.position = [Piece::None; 64];
        self.occupied = [0; 2];
        self.pieces = [0; 7];
        self.occupied_mirror = 0;
        self.occupied_ul = 0;
        self.occupied_ur = 0;
        self.hand = [[0; 7]; 2];
        self.promoted_pawns = 0;
        self.material = 0;
        self.development = 0;
        self.can_castle = [[false; 2]; 2];
        self.en_passant = OFF_BOARD;
        self.move_num = 1;

        let mut kings = [None::<Square>; 2];
        let mut rank: i16 = 7;
        let mut file: i16 = 0;
        let mut last_placed = None::<Square>;
        let mut chars = board_field.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '1'..='8' => file += ch as i16 - '0' as i16,
                '/' => {
                    rank -= 1;
                    file = 0;
                    if rank < 0 {
                        return Err(format!("too many ranks in {board_field}"));
                    }
                }
                '~' => {
                    let sq = last_placed.ok_or("dangling ~")?;
                    self.promoted_pawns.set(sq);
                }
                '[' => break,
                _ => {
                    let piece = Piece::from_letter(ch).ok_or(format!("bad piece: {ch}"))?;
                    let color =
                        if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
                    if file > 7 {
                        return Err(format!("rank overflow in {board_field}"));
                    }
                    let sq = Square::new(file as u8, rank as u8);
                    self.add_piece(color, piece, sq, false, false);
                    if piece == Piece::King {
                        kings[color.idx()] = Some(sq);
                    }
                    last_placed = Some(sq);
                    file += 1;
                }
            }
        }

        // Holdings, if the board field carried a bracket.
        for ch in chars {
            if ch == ']' || ch == '-' {
                break;
            }
            let piece = Piece::from_letter(ch).ok_or(format!("bad holding: {ch}"))?;
            let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
            if (self.in_hand(color, piece) as usize) < super::zobrist::MAX_HAND {
                self.add_piece_to_hand(color, piece, false);
            }
        }

        self.king_square[0] = kings[0].ok_or("white king missing")?;
        self.king_square[1] = kings[1].ok_or("black king missing")?;

        self.on_move = match side_field {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("bad side field: {other}")),
        };

        // Castling rights only where king and rook actually stand at home.
        for ch in castle_field.chars() {
            match ch {
                'K' if self.home(E1, Piece::King, Color::White)
                    && self.home(H1, Piece::Rook, Color::White) =>
                {
                    self.can_castle[Color::White.idx()][KING_SIDE] = true;
                }
                'Q' if self.home(E1, Piece::King, Color::White)
                    && self.home(A1, Piece::Rook, Color::White) =>
                {
                    self.can_castle[Color::White.idx()][QUEEN_SIDE] = true;
                }
                'k' if self.home(E8, Piece::King, Color::Black)
                    && self.home(H8, Piece::Rook, Color::Black) =>
                {
                    self.can_castle[Color::Black.idx()][KING_SIDE] = true;
                }
                'q' if self.home(E8, Piece::King, Color::Black)
                    && self.home(A8, Piece::Rook, Color::Black) =>
                {
                    self.can_castle[Color::Black.idx()][QUEEN_SIDE] = true;
                }
                _ => {}
            }
        }

        if ep_field != "-" {
            let b = ep_field.as_bytes();
            if b.len() == 2
                && (b'a'..=b'h').contains(&b[0])
                && (b[1] == b'3' || b[1] == b'6')
            {
                self.en_passant = Square::new(b[0] - b'a', b[1] - b'1');
            }
        }

        self.attacks = self.recompute_attacks();
        self.hash = self.compute_hash_full();
        self.custom = true;
        Ok(())
    }

    fn home(&self, sq: Square, p: Piece, c: Color) -> bool {
        self.position[sq.index() as usize] == p && self.occupied[c.idx()].has(sq)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                let p = self.piece_on(sq);
                if p == Piece::None {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    out.push((b'0' + empty) as char);
                    empty = 0;
                }
                let ch = match self.color_on(sq) {
                    Some(Color::White) => p.letter(),
                    _ => p.letter().to_ascii_lowercase(),
                };
                out.push(ch);
                if self.promoted_pawns.has(sq) {
                    out.push('~');
                }
            }
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
            if rank > 0 {
                out.push('/');
            }
        }

        let any_held = (0..2).any(|c| HAND_PIECES.iter().any(|p| self.hand[c][p.idx()] > 0));
        if any_held {
            out.push('[');
            for c in [Color::White, Color::Black] {
                for p in HAND_PIECES {
                    for _ in 0..self.hand[c.idx()][p.idx()] {
                        let ch = match c {
                            Color::White => p.letter(),
                            Color::Black => p.letter().to_ascii_lowercase(),
                        };
                        out.push(ch);
                    }
                }
            }
            out.push(']');
        }

        out.push(' ');
        out.push(if self.on_move == Color::White { 'w' } else { 'b' });

        out.push(' ');
        let mut rights = String::new();
        if self.can_castle[0][KING_SIDE] {
            rights.push('K');
        }
        if self.can_castle[0][QUEEN_SIDE] {
            rights.push('Q');
        }
        if self.can_castle[1][KING_SIDE] {
            rights.push('k');
        }
        if self.can_castle[1][QUEEN_SIDE] {
            rights.push('q');
        }
        out.push_str(if rights.is_empty() { "-" } else { &rights });

        out.push(' ');
        if self.en_passant.on_board() {
            out.push_str(&self.en_passant.to_string());
        } else {
            out.push('-');
        }
        out
    }
}
