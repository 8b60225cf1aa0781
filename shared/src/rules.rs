//! Chess rules: move generation, validation and game status
//!
//! Legality is decided by simulation. Every pseudo-legal move is played on a
//! lookahead copy of the board and discarded if the mover's king is then
//! attacked. There is no incrementally maintained attack map.

use crate::board::{AppliedMove, Board, Color, Move, MoveFlags, Piece, PieceKind, Square};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a submitted move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMoveReason {
    #[error("it is not your turn")]
    WrongTurn,
    #[error("you have no piece on the source square")]
    NoPieceAtSource,
    #[error("that piece cannot move there")]
    NotPseudoLegal,
    #[error("that move would leave your king in check")]
    LeavesKingInCheck,
    #[error("a promotion piece must be chosen")]
    AmbiguousPromotion,
}

/// Condition of the position for the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
    DrawFiftyMove,
    DrawInsufficientMaterial,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Ongoing | GameStatus::Check)
    }
}

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn square(file: u8, rank: u8) -> Square {
    Square::from_index(rank as usize * 8 + file as usize)
}

/// True if any piece of `by` attacks `target`
///
/// Pawns attack diagonally whether or not the target is occupied. Castling
/// never attacks anything.
pub fn is_attacked(board: &Board, target: Square, by: Color) -> bool {
    let dir = by.pawn_direction();
    for df in [-1, 1] {
        if let Some(from) = target.offset(df, -dir) {
            if board.piece_at(from) == Some(Piece::new(PieceKind::Pawn, by)) {
                return true;
            }
        }
    }

    let hits = |steps: &[(i8, i8)], kind: PieceKind| {
        steps.iter().any(|&(df, dr)| {
            target
                .offset(df, dr)
                .map_or(false, |from| board.piece_at(from) == Some(Piece::new(kind, by)))
        })
    };
    if hits(&KNIGHT_STEPS, PieceKind::Knight) || hits(&KING_STEPS, PieceKind::King) {
        return true;
    }

    ray_hits(board, target, &ROOK_DIRECTIONS, by, PieceKind::Rook)
        || ray_hits(board, target, &BISHOP_DIRECTIONS, by, PieceKind::Bishop)
}

/// Walks each direction from `target` and reports whether the first piece met
/// is a `slider` or queen of color `by`
fn ray_hits(
    board: &Board,
    target: Square,
    directions: &[(i8, i8)],
    by: Color,
    slider: PieceKind,
) -> bool {
    for &(df, dr) in directions {
        let mut current = target;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = board.piece_at(next) {
                if piece.color == by && (piece.kind == slider || piece.kind == PieceKind::Queen) {
                    return true;
                }
                break;
            }
            current = next;
        }
    }
    false
}

pub fn is_in_check(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_square(color) else {
        panic!("{color} has no king on the board");
    };
    is_attacked(board, king, color.opposite())
}

/// Moves that follow each piece's movement pattern, ignoring king safety
pub fn pseudo_legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for (from, piece) in board.pieces(color) {
        piece_moves(board, from, piece, &mut moves);
    }
    moves
}

/// Legal moves for `color`, in a stable order
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    pseudo_legal_moves(board, color)
        .into_iter()
        .filter(|mv| !leaves_king_in_check(board, mv, color))
        .collect()
}

fn has_legal_move(board: &Board, color: Color) -> bool {
    pseudo_legal_moves(board, color)
        .iter()
        .any(|mv| !leaves_king_in_check(board, mv, color))
}

fn leaves_king_in_check(board: &Board, mv: &Move, color: Color) -> bool {
    let mut lookahead = board.clone_for_lookahead();
    lookahead.apply_move(mv);
    is_in_check(&lookahead, color)
}

fn piece_moves(board: &Board, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    match piece.kind {
        PieceKind::Pawn => pawn_moves(board, from, piece.color, moves),
        PieceKind::Knight => step_moves(board, from, piece.color, &KNIGHT_STEPS, moves),
        PieceKind::Bishop => slide_moves(board, from, piece.color, &BISHOP_DIRECTIONS, moves),
        PieceKind::Rook => slide_moves(board, from, piece.color, &ROOK_DIRECTIONS, moves),
        PieceKind::Queen => {
            slide_moves(board, from, piece.color, &ROOK_DIRECTIONS, moves);
            slide_moves(board, from, piece.color, &BISHOP_DIRECTIONS, moves);
        }
        PieceKind::King => {
            step_moves(board, from, piece.color, &KING_STEPS, moves);
            castling_moves(board, from, piece.color, moves);
        }
    }
}

fn pawn_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
    let dir = color.pawn_direction();
    let start_rank = (color.back_rank() as i8 + dir) as u8;

    if let Some(one) = from.offset(0, dir) {
        if board.piece_at(one).is_none() {
            push_pawn_move(from, one, color, moves);
            if from.rank() == start_rank {
                if let Some(two) = one.offset(0, dir) {
                    if board.piece_at(two).is_none() {
                        moves.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = from.offset(df, dir) else {
            continue;
        };
        match board.piece_at(to) {
            Some(target) if target.color != color => push_pawn_move(from, to, color, moves),
            // the target only belongs to the side whose turn it is
            None if board.en_passant == Some(to) && board.side_to_move == color => {
                moves.push(Move::new(from, to))
            }
            _ => {}
        }
    }
}

fn push_pawn_move(from: Square, to: Square, color: Color, moves: &mut Vec<Move>) {
    if to.rank() == color.opposite().back_rank() {
        for kind in PieceKind::PROMOTIONS {
            moves.push(Move::with_promotion(from, to, kind));
        }
    } else {
        moves.push(Move::new(from, to));
    }
}

fn step_moves(
    board: &Board,
    from: Square,
    color: Color,
    steps: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in steps {
        if let Some(to) = from.offset(df, dr) {
            match board.piece_at(to) {
                Some(target) if target.color == color => {}
                _ => moves.push(Move::new(from, to)),
            }
        }
    }
}

fn slide_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in directions {
        let mut current = from;
        while let Some(to) = current.offset(df, dr) {
            match board.piece_at(to) {
                None => moves.push(Move::new(from, to)),
                Some(target) => {
                    if target.color != color {
                        moves.push(Move::new(from, to));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}

fn castling_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<Move>) {
    let rank = color.back_rank();
    if from != square(4, rank) {
        return;
    }
    let enemy = color.opposite();
    let own_rook = Some(Piece::new(PieceKind::Rook, color));
    let empty = |files: &[u8]| files.iter().all(|&f| board.piece_at(square(f, rank)).is_none());
    let safe = |files: &[u8]| files.iter().all(|&f| !is_attacked(board, square(f, rank), enemy));

    if (board.castling.kingside(color) || board.castling.queenside(color))
        && is_attacked(board, from, enemy)
    {
        return;
    }

    if board.castling.kingside(color)
        && board.piece_at(square(7, rank)) == own_rook
        && empty(&[5, 6])
        && safe(&[5, 6])
    {
        moves.push(Move::new(from, square(6, rank)));
    }

    // b-file only needs to be empty; the king never crosses it
    if board.castling.queenside(color)
        && board.piece_at(square(0, rank)) == own_rook
        && empty(&[1, 2, 3])
        && safe(&[2, 3])
    {
        moves.push(Move::new(from, square(2, rank)));
    }
}

/// Checks a move submitted by `color` and describes it if it is legal
///
/// The board is not modified. Checks run in a fixed order, so a move from
/// the wrong side is always reported as [`IllegalMoveReason::WrongTurn`]
/// regardless of what else is wrong with it.
pub fn validate(board: &Board, mv: &Move, color: Color) -> Result<AppliedMove, IllegalMoveReason> {
    if color != board.side_to_move {
        return Err(IllegalMoveReason::WrongTurn);
    }

    let piece = match board.piece_at(mv.from) {
        Some(piece) if piece.color == color => piece,
        _ => return Err(IllegalMoveReason::NoPieceAtSource),
    };

    let mut candidates = Vec::new();
    piece_moves(board, mv.from, piece, &mut candidates);
    let Some(first) = candidates.iter().find(|candidate| candidate.to == mv.to) else {
        return Err(IllegalMoveReason::NotPseudoLegal);
    };

    let promotes = first.promotion.is_some();
    match (promotes, mv.promotion) {
        (true, Some(kind)) if !PieceKind::PROMOTIONS.contains(&kind) => {
            return Err(IllegalMoveReason::NotPseudoLegal)
        }
        (false, Some(_)) => return Err(IllegalMoveReason::NotPseudoLegal),
        _ => {}
    }

    // The promoted piece's kind never changes whether the own king is attacked
    if leaves_king_in_check(board, mv, color) {
        return Err(IllegalMoveReason::LeavesKingInCheck);
    }
    if promotes && mv.promotion.is_none() {
        return Err(IllegalMoveReason::AmbiguousPromotion);
    }

    Ok(describe(board, *mv, piece))
}

fn describe(board: &Board, mv: Move, piece: Piece) -> AppliedMove {
    let target = board.piece_at(mv.to);
    let en_passant = piece.kind == PieceKind::Pawn
        && target.is_none()
        && mv.from.file() != mv.to.file()
        && board.en_passant == Some(mv.to);
    let captured = if en_passant {
        Some(PieceKind::Pawn)
    } else {
        target.map(|p| p.kind)
    };
    let castles = piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2;

    let mut after = board.clone_for_lookahead();
    after.apply_move(&mv);
    let status = game_status(&after);

    AppliedMove {
        mv,
        piece: piece.kind,
        color: piece.color,
        captured,
        flags: MoveFlags {
            capture: captured.is_some(),
            en_passant,
            castle_kingside: castles && mv.to.file() > mv.from.file(),
            castle_queenside: castles && mv.to.file() < mv.from.file(),
            check: is_in_check(&after, piece.color.opposite()),
            checkmate: status == GameStatus::Checkmate,
            stalemate: status == GameStatus::Stalemate,
        },
    }
}

/// Status of the position for the side to move
///
/// Checkmate and stalemate take precedence over the draw rules.
pub fn game_status(board: &Board) -> GameStatus {
    let color = board.side_to_move;
    let in_check = is_in_check(board, color);

    if !has_legal_move(board, color) {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }
    if board.halfmove_clock >= 100 {
        return GameStatus::DrawFiftyMove;
    }
    if insufficient_material(board) {
        return GameStatus::DrawInsufficientMaterial;
    }
    if in_check {
        GameStatus::Check
    } else {
        GameStatus::Ongoing
    }
}

/// Neither side can possibly deliver mate: bare kings, a single minor piece,
/// or only bishops that all stand on squares of one color
fn insufficient_material(board: &Board) -> bool {
    let mut minors = Vec::new();
    for color in [Color::White, Color::Black] {
        for (square, piece) in board.pieces(color) {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((square, piece.kind)),
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            }
        }
    }

    match minors.as_slice() {
        [] | [_] => true,
        [(first, _), ..] => minors
            .iter()
            .all(|(square, kind)| *kind == PieceKind::Bishop && square.is_dark() == first.is_dark()),
    }
}

/// Counts leaf nodes of the legal move tree to `depth` plies
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(board, board.side_to_move);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| {
            let mut next = board.clone_for_lookahead();
            next.apply_move(mv);
            perft(&next, depth - 1)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    fn uci(text: &str) -> Move {
        Move::from_uci(text).unwrap()
    }

    fn play(board: &mut Board, moves: &[&str]) {
        for text in moves {
            let color = board.side_to_move;
            let applied = validate(board, &uci(text), color).unwrap();
            board.apply_move(&applied.mv);
        }
    }

    fn legal_uci(board: &Board) -> Vec<String> {
        legal_moves(board, board.side_to_move)
            .iter()
            .map(Move::uci)
            .collect()
    }

    #[test]
    fn test_initial_position_has_twenty_moves() {
        let board = Board::initial_standard();
        assert_eq!(legal_moves(&board, Color::White).len(), 20);
        assert_eq!(legal_moves(&board, Color::Black).len(), 20);
    }

    #[test]
    fn test_perft_initial_position() {
        let board = Board::initial_standard();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let board = board(KIWIPETE);
        assert_eq!(perft(&board, 1), 48);
        assert_eq!(perft(&board, 2), 2039);
    }

    #[test]
    fn test_perft_endgame_with_pins_and_en_passant() {
        let board = board("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(perft(&board, 1), 14);
        assert_eq!(perft(&board, 2), 191);
        assert_eq!(perft(&board, 3), 2812);
    }

    #[test]
    fn test_perft_promotions_and_castling() {
        let mirrored = board("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1");
        assert_eq!(perft(&mirrored, 1), 6);
        assert_eq!(perft(&mirrored, 2), 264);

        let talkchess = board("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
        assert_eq!(perft(&talkchess, 1), 44);
        assert_eq!(perft(&talkchess, 2), 1486);
    }

    #[test]
    fn test_regeneration_is_deterministic() {
        let mut first = Board::initial_standard();
        let mut second = Board::initial_standard();
        play(&mut first, &["e2e4", "e7e5", "g1f3"]);
        play(&mut second, &["e2e4", "e7e5", "g1f3"]);

        assert_eq!(first, second);
        assert_eq!(legal_uci(&first), legal_uci(&second));
        assert_eq!(legal_uci(&first), legal_uci(&first.clone_for_lookahead()));
    }

    #[test]
    fn test_attack_detection() {
        let board = Board::initial_standard();
        let f3: Square = "f3".parse().unwrap();
        let e4: Square = "e4".parse().unwrap();
        let f6: Square = "f6".parse().unwrap();
        assert!(is_attacked(&board, f3, Color::White));
        assert!(!is_attacked(&board, e4, Color::White));
        assert!(is_attacked(&board, f6, Color::Black));
        assert!(!is_attacked(&board, f3, Color::Black));

        let rook = self::board("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
        assert!(is_in_check(&rook, Color::White));
        assert!(!is_in_check(&rook, Color::Black));

        let blocked = self::board("4k3/8/8/8/8/8/8/r1N1K3 w - - 0 1");
        assert!(!is_in_check(&blocked, Color::White));
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let mut board = Board::initial_standard();
        play(&mut board, &["f2f3", "e7e5", "g2g4"]);

        let mate = validate(&board, &uci("d8h4"), Color::Black).unwrap();
        assert!(mate.flags.check);
        assert!(mate.flags.checkmate);
        assert!(!mate.flags.stalemate);

        board.apply_move(&mate.mv);
        assert_eq!(game_status(&board), GameStatus::Checkmate);
        assert!(legal_moves(&board, Color::White).is_empty());
    }

    #[test]
    fn test_stalemate_and_checkmate_classification() {
        let stalemate = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(!is_in_check(&stalemate, Color::Black));
        assert_eq!(game_status(&stalemate), GameStatus::Stalemate);

        let mate = board("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(game_status(&mate), GameStatus::Checkmate);

        let check = board("7k/8/6K1/8/8/8/8/7Q b - - 0 1");
        assert_eq!(game_status(&check), GameStatus::Check);
        assert!(!GameStatus::Check.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());
    }

    #[test]
    fn test_stalemate_flag_on_move() {
        let board = board("7k/4Q3/6K1/8/8/8/8/8 w - - 0 1");
        let applied = validate(&board, &uci("e7f7"), Color::White).unwrap();
        assert!(applied.flags.stalemate);
        assert!(!applied.flags.check);
        assert!(!applied.flags.checkmate);
    }

    #[test]
    fn test_draw_rules() {
        let fifty = board("4k3/8/8/8/8/8/8/R3K3 w - - 100 80");
        assert_eq!(game_status(&fifty), GameStatus::DrawFiftyMove);

        let bare = board("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(game_status(&bare), GameStatus::DrawInsufficientMaterial);

        let knight = board("4k3/8/8/8/8/8/8/4KN2 w - - 0 1");
        assert_eq!(game_status(&knight), GameStatus::DrawInsufficientMaterial);

        let same_bishops = board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert_eq!(game_status(&same_bishops), GameStatus::DrawInsufficientMaterial);

        let opposite_bishops = board("4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert_eq!(game_status(&opposite_bishops), GameStatus::Ongoing);

        let rook = board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert_eq!(game_status(&rook), GameStatus::Ongoing);
    }

    #[test]
    fn test_en_passant_only_immediately() {
        let mut board = Board::initial_standard();
        play(&mut board, &["e2e4", "a7a6", "e4e5", "d7d5"]);

        let capture = validate(&board, &uci("e5d6"), Color::White).unwrap();
        assert!(capture.flags.en_passant);
        assert!(capture.flags.capture);
        assert_eq!(capture.captured, Some(PieceKind::Pawn));

        play(&mut board, &["g1f3", "a6a5"]);
        assert_eq!(
            validate(&board, &uci("e5d6"), Color::White),
            Err(IllegalMoveReason::NotPseudoLegal)
        );
        assert!(!legal_uci(&board).contains(&"e5d6".to_string()));
    }

    #[test]
    fn test_castling_available_when_clear() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = legal_uci(&board);
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        let applied = validate(&board, &uci("e1c1"), Color::White).unwrap();
        assert!(applied.flags.castle_queenside);
        assert!(!applied.flags.castle_kingside);
    }

    #[test]
    fn test_castling_rejected_when_in_check() {
        let board = board("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = legal_uci(&board);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));
        assert_eq!(
            validate(&board, &uci("e1g1"), Color::White),
            Err(IllegalMoveReason::NotPseudoLegal)
        );
    }

    #[test]
    fn test_castling_rejected_through_or_into_attack() {
        let through = board("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let moves = legal_uci(&through);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        let into = board("6rk/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!legal_uci(&into).contains(&"e1g1".to_string()));

        // an attacked b1 does not stop queenside castling
        let b_file = board("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(legal_uci(&b_file).contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_castling_requires_rights_and_rook() {
        let no_rights = board("4k3/8/8/8/8/8/8/R3K2R w - - 0 1");
        assert!(!legal_uci(&no_rights).contains(&"e1g1".to_string()));

        let mut moved = board("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        play(&mut moved, &["h1h2", "e8d8", "h2h1", "d8e8"]);
        assert!(!legal_uci(&moved).contains(&"e1g1".to_string()));
        assert!(legal_uci(&moved).contains(&"e1c1".to_string()));
    }

    #[test]
    fn test_validate_rejection_reasons() {
        let board = Board::initial_standard();
        assert_eq!(
            validate(&board, &uci("e7e5"), Color::Black),
            Err(IllegalMoveReason::WrongTurn)
        );
        assert_eq!(
            validate(&board, &uci("e4e5"), Color::White),
            Err(IllegalMoveReason::NoPieceAtSource)
        );
        assert_eq!(
            validate(&board, &uci("e7e5"), Color::White),
            Err(IllegalMoveReason::NoPieceAtSource)
        );
        assert_eq!(
            validate(&board, &uci("e2e5"), Color::White),
            Err(IllegalMoveReason::NotPseudoLegal)
        );
        assert_eq!(
            validate(&board, &uci("e2e4q"), Color::White),
            Err(IllegalMoveReason::NotPseudoLegal)
        );
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let board = board("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert_eq!(
            validate(&board, &uci("e2c3"), Color::White),
            Err(IllegalMoveReason::LeavesKingInCheck)
        );
        assert!(legal_moves(&board, Color::White)
            .iter()
            .all(|mv| mv.from != "e2".parse().unwrap()));
    }

    #[test]
    fn test_promotion_requires_choice() {
        let board = board("7k/1P6/8/8/8/8/8/K7 w - - 0 1");
        assert_eq!(
            validate(&board, &uci("b7b8"), Color::White),
            Err(IllegalMoveReason::AmbiguousPromotion)
        );
        assert_eq!(
            validate(&board, &uci("b7b8k"), Color::White),
            Err(IllegalMoveReason::NotPseudoLegal)
        );

        let knight = validate(&board, &uci("b7b8n"), Color::White).unwrap();
        assert_eq!(knight.mv.promotion, Some(PieceKind::Knight));

        let queen = validate(&board, &uci("b7b8q"), Color::White).unwrap();
        assert!(queen.flags.check);
    }

    #[test]
    fn test_pinned_promotion_reports_king_safety_first() {
        // The g7 pawn shields the king on h7 from the rook on a7
        let board = board("8/r5PK/8/8/8/8/8/k7 w - - 0 1");
        assert_eq!(
            validate(&board, &uci("g7g8"), Color::White),
            Err(IllegalMoveReason::LeavesKingInCheck)
        );
        assert_eq!(
            validate(&board, &uci("g7g8q"), Color::White),
            Err(IllegalMoveReason::LeavesKingInCheck)
        );
    }

    #[test]
    fn test_random_playouts_never_leave_king_in_check() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..8 {
            let mut board = Board::initial_standard();
            for _ in 0..120 {
                let color = board.side_to_move;
                let moves = legal_moves(&board, color);
                for mv in &moves {
                    let mut after = board.clone_for_lookahead();
                    after.apply_move(mv);
                    assert!(
                        !is_in_check(&after, color),
                        "{} leaves {} in check in {}",
                        mv,
                        color,
                        board.to_fen()
                    );
                    assert!(validate(&board, mv, color).is_ok());
                }
                if game_status(&board).is_terminal() {
                    break;
                }
                let Some(mv) = moves.choose(&mut rng) else {
                    break;
                };
                board.apply_move(mv);
                assert!(board.king_square(Color::White).is_some());
                assert!(board.king_square(Color::Black).is_some());
            }
        }
    }
}
