//! Board model: piece placement plus the per-game metadata needed by the rules
//!
//! The board is plain data. It knows how to apply a move that has already been
//! validated, but it never decides whether a move is legal; that lives in
//! [`crate::rules`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank index the pieces of this color start on
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Direction pawns of this color advance in (+1 or -1 rank)
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may promote to, strongest first
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase letter used in FEN and UCI notation
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(letter: char) -> Option<PieceKind> {
        match letter.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN letter: uppercase for white, lowercase for black
    pub fn symbol(self) -> char {
        let letter = self.kind.letter();
        match self.color {
            Color::White => letter.to_ascii_uppercase(),
            Color::Black => letter,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(symbol)?;
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquareParseError {
    #[error("square must be two characters, got {0:?}")]
    Length(String),
    #[error("file must be a-h, got {0:?}")]
    File(char),
    #[error("rank must be 1-8, got {0:?}")]
    Rank(char),
}

/// A board coordinate; file 0-7 maps to a-h and rank 0-7 maps to 1-8
///
/// Serialized as algebraic text such as `"e4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Returns None when either coordinate is off the board
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    pub fn from_index(index: usize) -> Square {
        debug_assert!(index < 64);
        Square {
            file: (index % 8) as u8,
            rank: (index / 8) as u8,
        }
    }

    /// Square reached by stepping `df` files and `dr` ranks, if still on the board
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// True for dark squares (a1 is dark)
    pub fn is_dark(self) -> bool {
        (self.file + self.rank) % 2 == 0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SquareParseError::Length(s.to_string()));
        };
        if !('a'..='h').contains(&file) {
            return Err(SquareParseError::File(file));
        }
        if !('1'..='8').contains(&rank) {
            return Err(SquareParseError::Rank(rank));
        }
        Ok(Square {
            file: file as u8 - b'a',
            rank: rank as u8 - b'1',
        })
    }
}

impl TryFrom<String> for Square {
    type Error = SquareParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn all() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn revoke_all(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Clears the right tied to a rook's home corner when that corner is touched
    fn revoke_corner(&mut self, square: Square) {
        match (square.file(), square.rank()) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }
}

/// A move request: source, destination and optional promotion choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Parses long algebraic (UCI) text such as `e2e4` or `e7e8q`
    pub fn from_uci(text: &str) -> Option<Move> {
        let text = text.trim();
        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return None;
        }
        let from = text[0..2].parse().ok()?;
        let to = text[2..4].parse().ok()?;
        let promotion = match text[4..].chars().next() {
            Some(letter) => Some(PieceKind::from_letter(letter)?),
            None => None,
        };
        Some(Move {
            from,
            to,
            promotion,
        })
    }

    pub fn uci(&self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.letter()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uci())
    }
}

/// Facts derived while validating a move; never supplied by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveFlags {
    pub capture: bool,
    pub en_passant: bool,
    pub castle_kingside: bool,
    pub castle_queenside: bool,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
}

/// A move that passed validation, with the context needed to describe it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMove {
    #[serde(flatten)]
    pub mv: Move,
    pub piece: PieceKind,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<PieceKind>,
    pub flags: MoveFlags,
}

/// Piece placement plus side to move, castling rights, en-passant target and clocks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    /// An empty board with white to move and no castling rights
    ///
    /// Only useful as a starting point for building positions; it violates the
    /// one-king-per-side invariant until kings are placed.
    pub fn empty() -> Self {
        Self {
            squares: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn initial_standard() -> Self {
        let mut board = Self::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            for color in [Color::White, Color::Black] {
                let back = color.back_rank();
                let pawns = (back as i8 + color.pawn_direction()) as u8;
                board.squares[Square { file, rank: back }.index()] = Some(Piece::new(*kind, color));
                board.squares[Square { file, rank: pawns }.index()] =
                    Some(Piece::new(PieceKind::Pawn, color));
            }
        }
        board.castling = CastlingRights::all();
        board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    pub fn set_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    /// All occupied squares holding a piece of `color`, in a1..h8 order
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(move |(index, piece)| match piece {
                Some(piece) if piece.color == color => Some((Square::from_index(index), *piece)),
                _ => None,
            })
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(square, _)| square)
    }

    /// Independent copy the rules engine can mutate while simulating a move
    pub fn clone_for_lookahead(&self) -> Board {
        self.clone()
    }

    /// Applies a move that the rules engine already accepted
    ///
    /// No legality check is made. Castling is recognized as a king moving two
    /// files, en passant as a pawn moving diagonally onto the recorded target.
    /// A pawn reaching the last rank without a promotion choice becomes a queen.
    pub fn apply_move(&mut self, mv: &Move) {
        let Some(piece) = self.squares[mv.from.index()].take() else {
            panic!("apply_move from empty square {}", mv.from);
        };
        let mut captured = self.squares[mv.to.index()];

        if piece.kind == PieceKind::Pawn
            && Some(mv.to) == self.en_passant
            && mv.from.file() != mv.to.file()
            && captured.is_none()
        {
            let victim = Square {
                file: mv.to.file(),
                rank: mv.from.rank(),
            };
            captured = self.squares[victim.index()].take();
        }

        if piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2 {
            let (rook_from, rook_to) = if mv.to.file() > mv.from.file() {
                (7, 5)
            } else {
                (0, 3)
            };
            let rank = mv.from.rank();
            let rook = self.squares[Square { file: rook_from, rank }.index()].take();
            self.squares[Square { file: rook_to, rank }.index()] = rook;
        }

        let last_rank = piece.color.opposite().back_rank();
        let placed = if piece.kind == PieceKind::Pawn && mv.to.rank() == last_rank {
            Piece::new(mv.promotion.unwrap_or(PieceKind::Queen), piece.color)
        } else {
            piece
        };
        self.squares[mv.to.index()] = Some(placed);

        if piece.kind == PieceKind::King {
            self.castling.revoke_all(piece.color);
        }
        self.castling.revoke_corner(mv.from);
        self.castling.revoke_corner(mv.to);

        self.en_passant = if piece.kind == PieceKind::Pawn
            && mv.from.rank().abs_diff(mv.to.rank()) == 2
        {
            Some(Square {
                file: mv.from.file(),
                rank: (mv.from.rank() + mv.to.rank()) / 2,
            })
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.opposite();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial_standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(text: &str) -> Square {
        text.parse().unwrap()
    }

    #[test]
    fn test_square_parse_and_display() {
        let e4 = sq("e4");
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(Square::from_index(e4.index()), e4);

        assert!(matches!("i1".parse::<Square>(), Err(SquareParseError::File('i'))));
        assert!(matches!("a9".parse::<Square>(), Err(SquareParseError::Rank('9'))));
        assert!(matches!("e".parse::<Square>(), Err(SquareParseError::Length(_))));
        assert!(matches!("e44".parse::<Square>(), Err(SquareParseError::Length(_))));
    }

    #[test]
    fn test_square_offset_stays_on_board() {
        assert_eq!(sq("a1").offset(-1, 0), None);
        assert_eq!(sq("h8").offset(0, 1), None);
        assert_eq!(sq("b1").offset(1, 2), Some(sq("c3")));
    }

    #[test]
    fn test_square_serializes_as_text() {
        let json = serde_json::to_string(&sq("g7")).unwrap();
        assert_eq!(json, "\"g7\"");
        let parsed: Square = serde_json::from_str("\"c2\"").unwrap();
        assert_eq!(parsed, sq("c2"));
        assert!(serde_json::from_str::<Square>("\"z0\"").is_err());
    }

    #[test]
    fn test_move_uci_roundtrip() {
        let mv = Move::from_uci("e7e8q").unwrap();
        assert_eq!(mv.from, sq("e7"));
        assert_eq!(mv.to, sq("e8"));
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.uci(), "e7e8q");

        assert_eq!(Move::from_uci("e2e4").unwrap().promotion, None);
        assert!(Move::from_uci("e2").is_none());
        assert!(Move::from_uci("e7e8x").is_none());
        assert!(Move::from_uci("é2e4").is_none());
    }

    #[test]
    fn test_initial_position_layout() {
        let board = Board::initial_standard();
        assert_eq!(board.piece_at(sq("e1")), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(board.piece_at(sq("d8")), Some(Piece::new(PieceKind::Queen, Color::Black)));
        assert_eq!(board.piece_at(sq("c7")), Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert_eq!(board.piece_at(sq("e4")), None);
        assert_eq!(board.pieces(Color::White).count(), 16);
        assert_eq!(board.pieces(Color::Black).count(), 16);
        assert_eq!(board.king_square(Color::Black), Some(sq("e8")));
        assert_eq!(board.castling, CastlingRights::all());
        assert_eq!(board.side_to_move, Color::White);
    }

    #[test]
    fn test_double_push_sets_en_passant_target() {
        let mut board = Board::initial_standard();
        board.apply_move(&Move::new(sq("e2"), sq("e4")));

        assert_eq!(board.en_passant, Some(sq("e3")));
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.halfmove_clock, 0);
        assert_eq!(board.fullmove_number, 1);

        board.apply_move(&Move::new(sq("g8"), sq("f6")));
        assert_eq!(board.en_passant, None);
        assert_eq!(board.halfmove_clock, 1);
        assert_eq!(board.fullmove_number, 2);
    }

    #[test]
    fn test_en_passant_removes_captured_pawn() {
        let mut board = Board::initial_standard();
        for uci in ["e2e4", "a7a6", "e4e5", "d7d5"] {
            board.apply_move(&Move::from_uci(uci).unwrap());
        }
        assert_eq!(board.en_passant, Some(sq("d6")));

        board.apply_move(&Move::from_uci("e5d6").unwrap());
        assert_eq!(board.piece_at(sq("d5")), None);
        assert_eq!(board.piece_at(sq("d6")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(board.pieces(Color::Black).count(), 15);
    }

    #[test]
    fn test_castling_moves_rook_and_revokes_rights() {
        let mut board = Board::empty();
        board.set_piece(sq("e1"), Some(Piece::new(PieceKind::King, Color::White)));
        board.set_piece(sq("h1"), Some(Piece::new(PieceKind::Rook, Color::White)));
        board.set_piece(sq("a1"), Some(Piece::new(PieceKind::Rook, Color::White)));
        board.set_piece(sq("e8"), Some(Piece::new(PieceKind::King, Color::Black)));
        board.castling = CastlingRights::all();

        board.apply_move(&Move::new(sq("e1"), sq("g1")));

        assert_eq!(board.piece_at(sq("g1")).map(|p| p.kind), Some(PieceKind::King));
        assert_eq!(board.piece_at(sq("f1")).map(|p| p.kind), Some(PieceKind::Rook));
        assert_eq!(board.piece_at(sq("h1")), None);
        assert!(!board.castling.white_kingside);
        assert!(!board.castling.white_queenside);
        assert!(board.castling.black_kingside);
    }

    #[test]
    fn test_rook_capture_revokes_opponent_right() {
        let mut board = Board::empty();
        board.set_piece(sq("e1"), Some(Piece::new(PieceKind::King, Color::White)));
        board.set_piece(sq("h1"), Some(Piece::new(PieceKind::Rook, Color::White)));
        board.set_piece(sq("e8"), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set_piece(sq("h8"), Some(Piece::new(PieceKind::Rook, Color::Black)));
        board.castling = CastlingRights::all();

        board.apply_move(&Move::new(sq("h1"), sq("h8")));

        assert!(!board.castling.white_kingside);
        assert!(!board.castling.black_kingside);
        assert!(board.castling.black_queenside);
        assert_eq!(board.halfmove_clock, 0);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut board = Board::empty();
        board.set_piece(sq("a1"), Some(Piece::new(PieceKind::King, Color::White)));
        board.set_piece(sq("h8"), Some(Piece::new(PieceKind::King, Color::Black)));
        board.set_piece(sq("b7"), Some(Piece::new(PieceKind::Pawn, Color::White)));
        board.set_piece(sq("c2"), Some(Piece::new(PieceKind::Pawn, Color::White)));

        let mut under = board.clone_for_lookahead();
        under.apply_move(&Move::with_promotion(sq("b7"), sq("b8"), PieceKind::Knight));
        assert_eq!(under.piece_at(sq("b8")).map(|p| p.kind), Some(PieceKind::Knight));

        board.apply_move(&Move::new(sq("b7"), sq("b8")));
        assert_eq!(board.piece_at(sq("b8")).map(|p| p.kind), Some(PieceKind::Queen));
        // the lookahead copy never touched the original
        assert_ne!(board, under);
    }

    #[test]
    #[should_panic(expected = "empty square")]
    fn test_apply_from_empty_square_panics() {
        let mut board = Board::initial_standard();
        board.apply_move(&Move::new(sq("e4"), sq("e5")));
    }
}
