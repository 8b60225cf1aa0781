//! # Chess Client Library
//!
//! A small terminal client for the chess server. It connects over TCP,
//! joins the queue under a display name, and then relays typed commands to
//! the server while printing whatever the server reports back.
//!
//! The client holds no authority over the game. It never applies a move to
//! its own board; every position it draws comes from a server `board_update`
//! and every move it sends may still be rejected.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Turns a typed line such as `move e2e4` or `chat hi` into a [`input::Command`].
//!
//! ### Game Module (`game`)
//! Tracks the local view of the game: queue position, own color, opponent,
//! the latest board and the final outcome.
//!
//! ### Rendering Module (`rendering`)
//! Draws the board as text from the player's side of the table.
//!
//! ### Network Module (`network`)
//! Owns the TCP connection and runs the loop that multiplexes keyboard input
//! with server messages.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use tokio::io::{AsyncBufReadExt, BufReader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:5002").await?;
//!     client.next_message().await?; // welcome
//!     client.join("alice").await?;
//!
//!     let mut stdin = BufReader::new(tokio::io::stdin()).lines();
//!     client.run(&mut stdin).await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
