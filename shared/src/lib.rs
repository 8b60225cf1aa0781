//! # Shared chess core
//!
//! Types and rules used by both the server and the client.
//!
//! - [`board`]: the board model (pieces, castling rights, en-passant target,
//!   clocks) and its state transition for already validated moves.
//! - [`rules`]: legal move generation, move validation, check, checkmate,
//!   stalemate and draw detection.
//! - [`fen`]: conversion between boards and FEN strings.
//! - [`protocol`]: the newline-delimited JSON messages spoken over TCP.
//!
//! The server is the only authority on legality. Clients use this crate to
//! decode board updates and render them.

pub mod board;
pub mod fen;
pub mod protocol;
pub mod rules;

pub use board::{
    AppliedMove, Board, CastlingRights, Color, Move, MoveFlags, Piece, PieceKind, Square,
};
pub use fen::{FenError, STARTING_FEN};
pub use protocol::{ClientMessage, Outcome, ServerMessage, DEFAULT_PORT};
pub use rules::{GameStatus, IllegalMoveReason};
