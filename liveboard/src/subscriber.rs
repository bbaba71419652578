//! Feed consumption with reconnection and graceful shutdown.
//!
//! [`BoardSubscriber`] owns the subscribe-process-reconnect loop around a
//! [`MatchBoard`]:
//!
//! ```text
//! loop {
//!     subscribe(filter)
//!     loop {
//!         apply update to board
//!         log in-band errors, keep consuming
//!         bail out on shutdown signal
//!     }
//!     // stream ended or subscription failed:
//!     mark board stale, back off, resubscribe with the same filter
//! }
//! ```
//!
//! Losing the connection never corrupts the board: the last applied
//! snapshots stay visible, only the staleness flag flips until the next
//! update lands.

use crate::board::MatchBoard;
use futures::StreamExt;
use matchday_core::feed::{MatchFeed, MatchFilter};
use matchday_core::retry::BackoffPolicy;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Shared handle to the board a subscriber maintains.
///
/// Lock scopes are short and synchronous (the merge itself is pure data
/// movement), so a std `RwLock` is enough.
pub type SharedBoard = Arc<RwLock<MatchBoard>>;

/// Create a fresh shared board.
#[must_use]
pub fn shared_board() -> SharedBoard {
    Arc::new(RwLock::new(MatchBoard::new()))
}

/// Why a drain pass over the stream ended.
enum DrainEnd {
    /// Shutdown signal received; the subscriber is done
    Shutdown,
    /// The stream died; `delivered` says whether it ever produced events
    /// (a healthy run resets the reconnect backoff)
    Lost {
        /// At least one update was applied during this subscription
        delivered: bool,
    },
}

/// Consumes a match feed into a shared board until shut down.
pub struct BoardSubscriber {
    name: String,
    feed: Arc<dyn MatchFeed>,
    filter: MatchFilter,
    board: SharedBoard,
    shutdown: broadcast::Receiver<()>,
    backoff: BackoffPolicy,
}

impl BoardSubscriber {
    /// Create a subscriber.
    ///
    /// * `name` - for logging (e.g. "scoreboard", "match-centre")
    /// * `feed` - the feed to consume
    /// * `filter` - wildcard or a single match
    /// * `board` - the shared board to merge into
    /// * `shutdown` - broadcast receiver for graceful shutdown
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        feed: Arc<dyn MatchFeed>,
        filter: MatchFilter,
        board: SharedBoard,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            feed,
            filter,
            board,
            shutdown,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Replace the reconnect backoff policy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Spawn the consume loop as a background task.
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the consume loop until a shutdown signal arrives.
    pub async fn run(mut self) {
        info!(subscriber = %self.name, filter = ?self.filter, "board subscriber started");
        let mut failures: usize = 0;

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(subscriber = %self.name, "shutdown before subscribe");
                    break;
                }
                subscribed = self.feed.subscribe(self.filter) => {
                    match subscribed {
                        Ok(mut stream) => {
                            debug!(subscriber = %self.name, "subscribed to match feed");
                            match self.drain(&mut stream).await {
                                DrainEnd::Shutdown => break,
                                DrainEnd::Lost { delivered } => {
                                    // Connection lost mid-subscription.
                                    self.mark_stale();
                                    if delivered {
                                        failures = 0;
                                    }
                                }
                            }
                        }
                        Err(err) => {
                            error!(subscriber = %self.name, error = %err, "subscribe failed");
                            self.mark_stale();
                        }
                    }

                    let delay = self.backoff.delay_after(failures);
                    failures = failures.saturating_add(1);
                    warn!(
                        subscriber = %self.name,
                        delay_ms = delay.as_millis(),
                        "feed lost, resubscribing after backoff"
                    );
                    tokio::select! {
                        _ = self.shutdown.recv() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(subscriber = %self.name, "board subscriber stopped");
    }

    /// Consume the stream until shutdown or the stream dies.
    async fn drain(&mut self, stream: &mut matchday_core::feed::MatchStream) -> DrainEnd {
        let mut delivered = false;
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!(subscriber = %self.name, "shutdown during consumption");
                    return DrainEnd::Shutdown;
                }
                item = stream.next() => {
                    match item {
                        Some(Ok(update)) => {
                            metrics::counter!("liveboard_updates_received_total").increment(1);
                            delivered = true;
                            self.apply(&update);
                        }
                        Some(Err(err)) => {
                            // In-band error (decode failure, lag): log and
                            // keep consuming, the stream is still alive.
                            warn!(subscriber = %self.name, error = %err, "feed error");
                        }
                        None => {
                            warn!(subscriber = %self.name, "feed stream ended");
                            return DrainEnd::Lost { delivered };
                        }
                    }
                }
            }
        }
    }

    fn apply(&self, update: &matchday_core::types::MatchUpdate) {
        match self.board.write() {
            Ok(mut board) => {
                board.apply(update);
            }
            Err(poisoned) => {
                // A panicked writer elsewhere; the data is still usable.
                poisoned.into_inner().apply(update);
            }
        }
    }

    fn mark_stale(&self) {
        match self.board.write() {
            Ok(mut board) => board.mark_stale(),
            Err(poisoned) => poisoned.into_inner().mark_stale(),
        }
    }
}
