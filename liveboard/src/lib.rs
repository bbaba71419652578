//! # Matchday Liveboard
//!
//! The subscriber side of live match state propagation: a local board of
//! match snapshots kept current by a resilient feed consumer.
//!
//! - [`board`] - [`MatchBoard`](board::MatchBoard), the idempotent
//!   replace-by-id merge of full-state updates
//! - [`subscriber`] - [`BoardSubscriber`](subscriber::BoardSubscriber),
//!   the subscribe-process-reconnect loop with graceful shutdown
//!
//! ## Example
//!
//! ```ignore
//! use matchday_liveboard::{shared_board, BoardSubscriber};
//! use matchday_core::feed::MatchFilter;
//!
//! let board = shared_board();
//! let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
//!
//! let handle = BoardSubscriber::new(
//!     "scoreboard",
//!     feed,
//!     MatchFilter::All,
//!     board.clone(),
//!     shutdown_rx,
//! )
//! .spawn();
//!
//! // ... read `board` from the render loop ...
//!
//! let _ = shutdown_tx.send(());
//! handle.await?;
//! ```

pub mod board;
pub mod subscriber;

pub use board::{DisplayPhase, MatchBoard};
pub use subscriber::{BoardSubscriber, SharedBoard, shared_board};
