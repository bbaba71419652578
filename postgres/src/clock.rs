//! The match clock: the publisher that advances live matches.
//!
//! One process per deployment runs [`MatchClock::run`], which on a fixed
//! cadence advances the elapsed minute of every match whose timer is
//! running and publishes the fresh snapshot through the feed. Admin
//! actions (kickoff, goals, second half, full time) go through the same
//! struct so every mutation leaves via a single publishing path.
//!
//! Subscribers never advance minutes themselves; this process is the only
//! source of clock movement.

use crate::feed::{PostgresMatchFeed, row_to_state};
use crate::store::map_sqlx;
use matchday_core::environment::Clock;
use matchday_core::feed::{MatchFeed, MatchFeedError};
use matchday_core::ledger::StoreError;
use matchday_core::retry::{BackoffPolicy, retry_transient};
use matchday_core::types::{MatchId, MatchState, MatchStatus, MatchUpdate};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Errors raised while driving the match clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Reading or writing match rows failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Publishing the fresh snapshot failed
    #[error(transparent)]
    Feed(#[from] MatchFeedError),
    /// The referenced match does not exist
    #[error("unknown match: {0}")]
    UnknownMatch(MatchId),
}

/// Compute the next snapshot for one tick of a running match.
///
/// Returns `None` when the tick changes nothing (timer stopped, match not
/// live). The half-time interval and added time fall out of the rules:
///
/// - below 45': the minute advances
/// - at 45' with an interval configured: status flips to half-time and
///   the timer stops (the admin restarts it for the second half)
/// - 45' to 89': the minute advances
/// - 90' onward: the minute holds and added time accumulates until the
///   admin calls full time
#[must_use]
pub fn advanced(state: &MatchState) -> Option<MatchState> {
    if !state.timer_running || state.status != MatchStatus::Live {
        return None;
    }

    let mut next = state.clone();
    if next.current_minute < 45 {
        next.current_minute += 1;
    } else if next.current_minute == 45 && next.half_time_break {
        next.status = MatchStatus::HalfTime;
        next.timer_running = false;
    } else if next.current_minute < 90 {
        next.current_minute += 1;
    } else {
        next.extra_time += 1;
    }
    Some(next)
}

/// The live match state publisher.
pub struct MatchClock {
    feed: PostgresMatchFeed,
    clock: Arc<dyn Clock>,
    tick: Duration,
    backoff: BackoffPolicy,
}

impl MatchClock {
    /// Create a clock publishing through the given feed.
    #[must_use]
    pub fn new(feed: PostgresMatchFeed, clock: Arc<dyn Clock>, tick: Duration) -> Self {
        Self {
            feed,
            clock,
            tick,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Replace the backoff policy used for transient store failures.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the tick loop until a shutdown signal arrives.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(tick_secs = self.tick.as_secs(), "match clock started");
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("match clock received shutdown signal");
                    break;
                }
                _ = interval.tick() => {
                    let result = retry_transient(
                        &self.backoff,
                        || self.advance_running_matches(),
                        ClockError::is_transient,
                    )
                    .await;
                    if let Err(err) = result {
                        // Skip this tick; rows are still authoritative and
                        // the next tick starts from them.
                        error!(error = %err, "tick failed");
                    }
                }
            }
        }

        info!("match clock stopped");
    }

    /// Advance every running match by one tick and publish the results.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if reading the running matches or
    /// publishing an advanced snapshot fails.
    pub async fn advance_running_matches(&self) -> Result<usize, ClockError> {
        let rows = sqlx::query(
            "SELECT id, status, home_score, away_score, current_minute,
                    extra_time, timer_running, half_time_break
             FROM match_states
             WHERE timer_running = TRUE AND status = 'live'",
        )
        .fetch_all(self.feed.pool())
        .await
        .map_err(|e| map_sqlx(&e))?;

        let mut advanced_count = 0;
        for row in &rows {
            let state = row_to_state(row)?;
            if let Some(next) = advanced(&state) {
                self.publish_state(next).await?;
                advanced_count += 1;
            }
        }

        if advanced_count > 0 {
            debug!(matches = advanced_count, "advanced running matches");
        }
        Ok(advanced_count)
    }

    /// Kick a scheduled match off: status live, clock at 1', timer on.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the match is unknown or the write fails.
    pub async fn kickoff(&self, id: MatchId) -> Result<MatchState, ClockError> {
        self.mutate(id, |state| {
            state.status = MatchStatus::Live;
            state.current_minute = 1;
            state.extra_time = 0;
            state.timer_running = true;
        })
        .await
    }

    /// Start the second half: back to live at 46', timer on.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the match is unknown or the write fails.
    pub async fn start_second_half(&self, id: MatchId) -> Result<MatchState, ClockError> {
        self.mutate(id, |state| {
            state.status = MatchStatus::Live;
            state.current_minute = 46;
            state.extra_time = 0;
            state.timer_running = true;
        })
        .await
    }

    /// Record a goal and publish the new score.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the match is unknown or the write fails.
    pub async fn record_goal(&self, id: MatchId, home: bool) -> Result<MatchState, ClockError> {
        self.mutate(id, |state| {
            if home {
                state.home_score += 1;
            } else {
                state.away_score += 1;
            }
        })
        .await
    }

    /// Call full time: status finished, timer off.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the match is unknown or the write fails.
    pub async fn full_time(&self, id: MatchId) -> Result<MatchState, ClockError> {
        self.mutate(id, |state| {
            state.status = MatchStatus::Finished;
            state.timer_running = false;
        })
        .await
    }

    /// Register a new scheduled match and publish its initial snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the write or publish fails.
    pub async fn schedule(&self, id: MatchId) -> Result<MatchState, ClockError> {
        let state = MatchState::scheduled(id);
        self.publish_state(state.clone()).await?;
        Ok(state)
    }

    async fn mutate(
        &self,
        id: MatchId,
        change: impl FnOnce(&mut MatchState),
    ) -> Result<MatchState, ClockError> {
        let mut state = self
            .feed
            .current_state(id)
            .await?
            .ok_or(ClockError::UnknownMatch(id))?;
        change(&mut state);
        self.publish_state(state.clone()).await?;
        Ok(state)
    }

    async fn publish_state(&self, state: MatchState) -> Result<(), ClockError> {
        let update = MatchUpdate::new(state, self.clock.now());
        self.feed.publish(&update).await?;
        Ok(())
    }
}

impl ClockError {
    /// Whether a retry of the failed tick could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Feed(_) => true,
            Self::UnknownMatch(_) => false,
        }
    }
}
