//! # Concentration Client Library
//!
//! Client side of the networked memory-matching game. The server holds the real
//! board; the client only knows what it has been shown, asks to turn cards
//! over, and tells a renderer what changed.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The local view of the board:
//! - Per-cell `Hidden` / `Revealed(letter)` tracking
//! - Move and match counters, game status
//! - Guard against requesting face-up cells or a third card per pair
//! - Translation of server messages into view events
//!
//! ### Network Module (`network`)
//! The client session adapter:
//! - TCP connection and `BOARD_DIM` handshake
//! - Sending `REVEAL` requests
//! - Decoding server lines, skipping unknown ones
//! - Forwarding view events over a channel until `GAME_OVER`
//!
//! ### Input Module (`input`)
//! Parses typed `row col` moves for the terminal front end.
//!
//! ### Rendering Module (`rendering`)
//! Text rendering of the board, driven only by view events.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use shared::Coord;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:8080").await?;
//!
//!     let (move_tx, move_rx) = mpsc::channel(8);
//!     let (event_tx, mut event_rx) = mpsc::unbounded_channel();
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = event_rx.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     move_tx.send(Coord::new(0, 0)).await?;
//!     client.run(move_rx, event_tx).await?;
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
