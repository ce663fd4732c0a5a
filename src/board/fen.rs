//! FEN parsing and serialization.
//!
//! Accepts the full six-field FEN; the halfmove/fullmove fields are
//! optional and default to 0 and 1 respectively when missing.

use super::castle_bits::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, Color};
use crate::square::Square;

impl Board {
    /// Overwrite `self` from a FEN string. Resets all state first, so this
    /// can be called on a fresh `Board::new_empty()` or reused on an
    /// existing board.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let fen = fen.trim();
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(format!(
                "FEN must have at least 4 fields (placement, side, castling, ep): {fen:?}"
            ));
        }

        let placement = fields[0];
        let side = fields[1];
        let castling = fields[2];
        let ep = fields[3];
        let halfmove = fields.get(4);
        let fullmove = fields.get(5);

        let mut board = Board::new_empty();

        // 1. Piece placement
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN placement must have 8 ranks, got {}: {fen:?}",
                ranks.len()
            ));
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file: u8 = 0;
            for ch in rank_str.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(format!("invalid empty-square count '{ch}' in {fen:?}"));
                    }
                    file += skip as u8;
                } else {
                    if file >= 8 {
                        return Err(format!("rank overflow in FEN placement: {fen:?}"));
                    }
                    let (piece, color) = CHAR_TO_PC[ch as usize]
                        .ok_or_else(|| format!("invalid piece glyph '{ch}' in {fen:?}"))?;
                    let sq = Square::from_index(rank * 8 + file);
                    let bb = board.bb(color, piece) | (1u64 << sq.index());
                    board.set_bb(color, piece, bb);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(format!(
                    "rank {} does not cover 8 files: {fen:?}",
                    8 - rank_from_top
                ));
            }
        }

        if board.bb(Color::White, super::Piece::King).count_ones() != 1
            || board.bb(Color::Black, super::Piece::King).count_ones() != 1
        {
            return Err(format!("FEN must have exactly one king per side: {fen:?}"));
        }

        // 2. Side to move
        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side-to-move field '{other}' in {fen:?}")),
        };

        // 3. Castling rights
        board.castling_rights = 0;
        if castling != "-" {
            for ch in castling.chars() {
                board.castling_rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => {
                        return Err(format!(
                            "invalid castling-rights glyph '{other}' in {fen:?}"
                        ));
                    }
                };
            }
        }

        // 4. En passant square
        board.en_passant = if ep == "-" {
            None
        } else {
            Some(
                ep.parse::<Square>()
                    .map_err(|e| format!("invalid en-passant square '{ep}': {e}"))?,
            )
        };

        // 5. Halfmove clock / fullmove number (optional, default 0 / 1)
        board.halfmove_clock = match halfmove {
            Some(s) => s
                .parse()
                .map_err(|_| format!("invalid halfmove clock '{s}' in {fen:?}"))?,
            None => 0,
        };
        board.fullmove_number = match fullmove {
            Some(s) => s
                .parse()
                .map_err(|_| format!("invalid fullmove number '{s}' in {fen:?}"))?,
            None => 1,
        };

        board.history.clear();
        board.refresh_zobrist();
        board
            .validate()
            .map_err(|e| format!("FEN describes an invalid board: {e}"))?;

        *self = board;
        Ok(())
    }

    /// Serialize to the canonical six-field FEN. `-` is used for empty
    /// castling rights and for an absent en-passant square.
    pub fn to_fen(&self) -> String {
        let mut placement = String::with_capacity(64);
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::from_index(rank * 8 + file);
                match self.piece_at(sq) {
                    None => empty_run += 1,
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.has_castling(CASTLE_WK) {
            castling.push('K');
        }
        if self.has_castling(CASTLE_WQ) {
            castling.push('Q');
        }
        if self.has_castling(CASTLE_BK) {
            castling.push('k');
        }
        if self.has_castling(CASTLE_BQ) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}
