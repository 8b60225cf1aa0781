//! Messages exchanged between clients and the server
//!
//! Every message is a single JSON object on its own line, tagged by a `"type"`
//! field. The full board travels as a FEN string.

use crate::board::{AppliedMove, Color, Move, PieceKind, Square};
use crate::rules::IllegalMoveReason;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Port the server listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 5002;

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on every connection
    Join { name: String },
    Move {
        from: Square,
        to: Square,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<PieceKind>,
    },
    Resign,
    Chat { text: String },
    /// Leave the lobby, or resign and leave when in a game
    Quit,
}

impl From<Move> for ClientMessage {
    fn from(mv: Move) -> Self {
        ClientMessage::Move {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        }
    }
}

/// How a finished game ended, from the receiving player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    CheckmateWin,
    CheckmateLoss,
    StalemateDraw,
    DrawFiftyMove,
    DrawInsufficientMaterial,
    ResignWin,
    ResignLoss,
    OpponentDisconnectedWin,
}

impl Outcome {
    pub fn describe(self) -> &'static str {
        match self {
            Outcome::CheckmateWin => "you won by checkmate",
            Outcome::CheckmateLoss => "you lost by checkmate",
            Outcome::StalemateDraw => "draw by stalemate",
            Outcome::DrawFiftyMove => "draw by the fifty-move rule",
            Outcome::DrawInsufficientMaterial => "draw by insufficient material",
            Outcome::ResignWin => "your opponent resigned, you win",
            Outcome::ResignLoss => "you resigned",
            Outcome::OpponentDisconnectedWin => "your opponent left, you win by forfeit",
        }
    }
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome,
    Queued {
        position: usize,
    },
    Paired {
        opponent: String,
        color: Color,
    },
    BoardUpdate {
        fen: String,
        last_move: Option<AppliedMove>,
        side_to_move: Color,
        check: bool,
    },
    IllegalMove {
        reason: IllegalMoveReason,
    },
    GameOver {
        outcome: Outcome,
    },
    Chat {
        from: String,
        text: String,
    },
    /// Sent right before the server drops a connection for a protocol violation
    Error {
        message: String,
    },
}

/// Serializes a message as one newline-terminated JSON line
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}
