//! # Chess Server Library
//!
//! This library provides the authoritative server for two-player chess over
//! TCP. It pairs waiting players, owns the board of every running game,
//! validates each submitted move, and reports results to both players.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Rules
//! Clients only ever propose moves. The server checks every move against the
//! full rules of chess (see [`shared::rules`]) and is the only place where a
//! board changes. Rejected moves are reported to the mover alone, with a
//! reason, and the game carries on.
//!
//! ### Matchmaking
//! Players who completed the handshake wait in a first-come first-served
//! queue. The two players who have waited longest are seated together, the
//! earlier one playing white.
//!
//! ### Game Lifecycle
//! A game ends in checkmate, stalemate, a draw by the fifty-move rule or
//! insufficient material, a resignation, or a forfeit when a player's
//! connection goes away.
//!
//! ## Architecture Design
//!
//! ### One Task per Connection
//! Each socket is served by its own task, so a slow or silent client never
//! holds up anybody else and a dropped connection is noticed right away,
//! even while the opponent is thinking.
//!
//! ### One Task per Match
//! Each match runs as a small actor that owns its board. Connection tasks
//! talk to it through an unbounded channel, which serializes the moves of a
//! game without any shared lock on the board.
//!
//! ## Module Organization
//!
//! - [`config`]: runtime settings with sensible defaults
//! - [`error`]: protocol and server error types
//! - [`codec`]: newline-delimited JSON framing
//! - [`pairing`]: the waiting queue and name deduplication
//! - [`session`]: a single match and its state machine
//! - [`network`]: the accept loop and per-connection protocol handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         ..ServerConfig::default()
//!     };
//!
//!     // Binds the listener, then accepts players until the task is dropped
//!     let server = Server::new(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod pairing;
pub mod session;
