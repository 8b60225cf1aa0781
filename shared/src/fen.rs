//! Forsyth-Edwards Notation for [`Board`]
//!
//! FEN is the board representation sent to clients in every board update.

use crate::board::{Board, CastlingRights, Color, Piece, PieceKind, Square};
use thiserror::Error;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 4 or 6 space separated fields, found {0}")]
    FieldCount(usize),
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: u8 },
    #[error("unknown piece symbol {0:?}")]
    PieceSymbol(char),
    #[error("side to move must be 'w' or 'b', got {0:?}")]
    SideToMove(String),
    #[error("invalid castling field {0:?}")]
    Castling(String),
    #[error("invalid en passant field {0:?}")]
    EnPassant(String),
    #[error("invalid move counter {0:?}")]
    Counter(String),
    #[error("{color} must have exactly one king, found {count}")]
    KingCount { color: Color, count: usize },
}

impl Board {
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::from_index(rank as usize * 8 + file as usize)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        for (allowed, letter) in [
            (self.castling.white_kingside, 'K'),
            (self.castling.white_queenside, 'Q'),
            (self.castling.black_kingside, 'k'),
            (self.castling.black_queenside, 'q'),
        ] {
            if allowed {
                castling.push(letter);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .en_passant
            .map(|square| square.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, en_passant, self.halfmove_clock, self.fullmove_number
        )
    }

    /// Parses a FEN string; the clock fields may be omitted
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for symbol in text.chars() {
                if let Some(skip) = symbol.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(FenError::RankWidth { rank: rank + 1 });
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_symbol(symbol).ok_or(FenError::PieceSymbol(symbol))?;
                    let square =
                        Square::new(file, rank).ok_or(FenError::RankWidth { rank: rank + 1 })?;
                    board.set_piece(square, Some(piece));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::RankWidth { rank: rank + 1 });
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth { rank: rank + 1 });
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        board.castling = parse_castling(fields[2])?;

        board.en_passant = match fields[3] {
            "-" => None,
            text => Some(
                text.parse::<Square>()
                    .map_err(|_| FenError::EnPassant(text.to_string()))?,
            ),
        };

        if fields.len() == 6 {
            board.halfmove_clock = fields[4]
                .parse()
                .map_err(|_| FenError::Counter(fields[4].to_string()))?;
            board.fullmove_number = fields[5]
                .parse()
                .map_err(|_| FenError::Counter(fields[5].to_string()))?;
        }

        for color in [Color::White, Color::Black] {
            let count = board
                .pieces(color)
                .filter(|(_, piece)| piece.kind == PieceKind::King)
                .count();
            if count != 1 {
                return Err(FenError::KingCount { color, count });
            }
        }

        Ok(board)
    }
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    for letter in field.chars() {
        let flag = match letter {
            'K' => &mut rights.white_kingside,
            'Q' => &mut rights.white_queenside,
            'k' => &mut rights.black_kingside,
            'q' => &mut rights.black_queenside,
            _ => return Err(FenError::Castling(field.to_string())),
        };
        if *flag {
            return Err(FenError::Castling(field.to_string()));
        }
        *flag = true;
    }
    Ok(rights)
}
