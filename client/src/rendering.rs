//! Plain-text board rendering for the terminal

use crate::game::ClientGameState;
use shared::{AppliedMove, Board, Color, Square};

/// Draws the board as text with the given side at the bottom
///
/// White pieces are uppercase, black pieces lowercase, empty squares `.`.
pub fn render_board(board: &Board, perspective: Color) -> String {
    let ranks: Vec<u8> = match perspective {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };
    let files: Vec<u8> = match perspective {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };

    let mut out = String::new();
    for &rank in &ranks {
        out.push_str(&format!("{} |", rank + 1));
        for &file in &files {
            let symbol = Square::new(file, rank)
                .and_then(|square| board.piece_at(square))
                .map_or('.', |piece| piece.symbol());
            out.push(' ');
            out.push(symbol);
        }
        out.push('\n');
    }
    out.push_str("  +----------------\n   ");
    for &file in &files {
        out.push(' ');
        out.push((b'a' + file) as char);
    }
    out.push('\n');
    out
}

pub fn describe_move(applied: &AppliedMove) -> String {
    let mut text = format!("{} {:?} {}", applied.color, applied.piece, applied.mv);
    if applied.flags.castle_kingside {
        text.push_str(" (castles kingside)");
    } else if applied.flags.castle_queenside {
        text.push_str(" (castles queenside)");
    } else if applied.flags.en_passant {
        text.push_str(" (en passant)");
    } else if let Some(captured) = applied.captured {
        text.push_str(&format!(" (takes {:?})", captured));
    }
    text.to_lowercase()
}

/// Full screen for the current game: last move, board and whose turn it is
pub fn render(state: &ClientGameState) -> String {
    let Some(board) = &state.board else {
        return "No game in progress\n".to_string();
    };

    let mut out = String::new();
    if let Some(applied) = &state.last_move {
        out.push_str(&format!("Last move: {}\n", describe_move(applied)));
    }
    out.push_str(&render_board(board, state.color.unwrap_or(Color::White)));

    let mover = board.side_to_move;
    let turn = if state.color == Some(mover) {
        "Your move".to_string()
    } else {
        format!("{} to move", mover)
    };
    if state.check {
        out.push_str(&format!("{}, check!\n", turn));
    } else {
        out.push_str(&format!("{}\n", turn));
    }
    out
}
