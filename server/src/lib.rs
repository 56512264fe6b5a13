//! # Concentration Server Library
//!
//! Authoritative server for the networked memory-matching game. The server deals
//! the cards, judges every pair, and tells the client what to show.
//!
//! ## Architecture
//!
//! ### One Task Per Connection
//! Every accepted connection gets its own Tokio task and its own board. Sessions
//! share nothing, so there are no locks on the game path. Inside a session all
//! work happens sequentially as request lines arrive.
//!
//! ### Line Protocol
//! Requests and notifications are newline-terminated text frames defined in the
//! `shared` crate. Malformed requests and illegal moves are answered with an
//! `ERROR` line and the session carries on; only transport failures end a
//! session early.
//!
//! ## Module Organization
//!
//! ### Board Module (`board`)
//! The card grid and the two-reveal match rule:
//! - Shuffled dealing of `dim²/2` letter pairs
//! - Reveal validation (range, already revealed, game over)
//! - Match and mismatch judgement, re-hiding mismatched pairs
//! - Debug rendering of the grid
//!
//! ### Session Module (`session`)
//! Binds one board to one connection:
//! - Translates request lines into board calls and outcomes into replies
//! - Enforces reply ordering (`CARD`, then `MATCH`, then `GAME_OVER`)
//! - Delays the `MISMATCH` announcement so players can see both cards
//!
//! ### Network Module (`network`)
//! Accepts TCP connections and spawns a session for each.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::session::SessionConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new(4, Duration::from_secs(1), false)?;
//!     let server = Server::bind("127.0.0.1:8080", config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod board;
pub mod network;
pub mod session;
