//! In-memory match feed over a tokio broadcast channel.
//!
//! Fast, single-process implementation of [`MatchFeed`] for tests and
//! demos. Delivery matches the production contract closely enough to test
//! subscriber logic: subscribers that fall behind see a transport error
//! (mirroring a dropped connection), and [`republish`] lets tests exercise
//! duplicate delivery.
//!
//! [`republish`]: InMemoryMatchFeed::republish

use async_stream::stream;
use matchday_core::feed::{MatchFeed, MatchFeedError, MatchFilter, MatchStream};
use matchday_core::types::MatchUpdate;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Broadcast-channel match feed.
///
/// Clones share the same channel. Publishing with no live subscribers is
/// a no-op, as in production.
#[derive(Clone)]
pub struct InMemoryMatchFeed {
    sender: broadcast::Sender<MatchUpdate>,
}

impl InMemoryMatchFeed {
    /// Create a feed with the default buffer (64 pending updates per
    /// subscriber before lag kicks in).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a feed with an explicit per-subscriber buffer.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver an update again, as a redelivery would.
    ///
    /// Tests use this to assert the subscriber-side merge is idempotent.
    pub fn republish(&self, update: &MatchUpdate) {
        let _ = self.sender.send(update.clone());
    }

    /// Number of currently attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryMatchFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchFeed for InMemoryMatchFeed {
    fn publish(
        &self,
        update: &MatchUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), MatchFeedError>> + Send + '_>> {
        let update = update.clone();
        Box::pin(async move {
            // A send error only means nobody is listening right now.
            let _ = self.sender.send(update);
            Ok(())
        })
    }

    fn subscribe(
        &self,
        filter: MatchFilter,
    ) -> Pin<Box<dyn Future<Output = Result<MatchStream, MatchFeedError>> + Send + '_>> {
        let mut receiver = self.sender.subscribe();
        Box::pin(async move {
            let stream = stream! {
                loop {
                    match receiver.recv().await {
                        Ok(update) => {
                            if filter.accepts(update.state.id) {
                                yield Ok(update);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            yield Err(MatchFeedError::Transport(format!(
                                "subscriber lagged, {missed} updates dropped"
                            )));
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };
            Ok(Box::pin(stream) as MatchStream)
        })
    }
}
