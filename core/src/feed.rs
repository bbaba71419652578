//! Match feed abstraction for live state propagation.
//!
//! The feed carries [`MatchUpdate`] snapshots from the publisher (match
//! clock, admin console) to any number of subscribers (scoreboards, match
//! centre pages). Events flow one way:
//!
//! ```text
//! ┌──────────────┐      ┌───────────────┐      ┌─────────────┐
//! │  MatchClock  │ ───► │   MatchFeed   │ ───► │ Subscribers │
//! │ admin edits  │      │ (fan-out)     │      │ (MatchBoard)│
//! └──────────────┘      └───────────────┘      └─────────────┘
//! ```
//!
//! # Delivery semantics
//!
//! At-least-once, unordered across matches: an update may be redelivered,
//! and updates for different matches may interleave arbitrarily. Every
//! update is a complete snapshot, so subscribers stay correct by merging
//! with a replace-by-id - applying the same update twice is a no-op.
//!
//! # Implementations
//!
//! - `InMemoryMatchFeed` (`matchday-testing`) - tokio broadcast channel,
//!   for tests and single-process demos
//! - `PostgresMatchFeed` (`matchday-postgres`) - LISTEN/NOTIFY on the
//!   match state table, for production
//!
//! # Dyn Compatibility
//!
//! The trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to enable trait object usage (`Arc<dyn MatchFeed>`), which
//! the subscriber needs to hold the feed across reconnects.

use crate::types::{MatchId, MatchUpdate};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by feed operations.
#[derive(Error, Debug, Clone)]
pub enum MatchFeedError {
    /// Could not establish the underlying connection
    #[error("feed connection failed: {0}")]
    ConnectionFailed(String),

    /// Publishing an update failed
    #[error("publish failed for match {match_id}: {reason}")]
    PublishFailed {
        /// Match whose update could not be published
        match_id: MatchId,
        /// The reason for failure
        reason: String,
    },

    /// Subscribing failed
    #[error("subscription failed: {0}")]
    SubscriptionFailed(String),

    /// A received payload could not be decoded into a [`MatchUpdate`]
    #[error("undecodable feed payload: {0}")]
    Decode(String),

    /// Transport-level failure mid-stream
    #[error("feed transport error: {0}")]
    Transport(String),

    /// The feed has shut down and will deliver nothing further
    #[error("feed closed")]
    Closed,
}

/// Which matches a subscription covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchFilter {
    /// Every match on the feed (list views)
    All,
    /// A single match (match centre page)
    One(MatchId),
}

impl MatchFilter {
    /// Whether an update for `id` falls inside this filter.
    #[must_use]
    pub fn accepts(&self, id: MatchId) -> bool {
        match self {
            Self::All => true,
            Self::One(wanted) => *wanted == id,
        }
    }
}

/// Stream of match updates from a subscription.
///
/// Each item is a `Result`: decode and transport failures arrive in-band
/// so subscribers can log them and keep consuming, rather than the stream
/// dying silently.
pub type MatchStream = Pin<Box<dyn Stream<Item = Result<MatchUpdate, MatchFeedError>> + Send>>;

/// Publish/subscribe surface for live match state.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the publisher task and any
/// number of subscriber tasks hold the same instance.
pub trait MatchFeed: Send + Sync {
    /// Publish a full-state snapshot to all subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`MatchFeedError::PublishFailed`] if the update could not
    /// be handed to the transport. Publishing to a feed nobody is
    /// listening on is not an error.
    fn publish(
        &self,
        update: &MatchUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), MatchFeedError>> + Send + '_>>;

    /// Subscribe to match updates matching `filter`.
    ///
    /// The returned stream yields updates until the transport drops; the
    /// caller is responsible for resubscribing (see
    /// `matchday-liveboard::BoardSubscriber` for the reconnect loop).
    ///
    /// # Errors
    ///
    /// Returns [`MatchFeedError::SubscriptionFailed`] if the subscription
    /// could not be established.
    fn subscribe(
        &self,
        filter: MatchFilter,
    ) -> Pin<Box<dyn Future<Output = Result<MatchStream, MatchFeedError>> + Send + '_>>;
}
