//! LISTEN/NOTIFY match feed.
//!
//! Publishing writes the authoritative row in `match_states` and then
//! `pg_notify`s the full snapshot as JSON on a channel, in one
//! transaction - the row is the source of truth, the notification is the
//! fan-out. Subscribing attaches a `PgListener` and decodes payloads into
//! [`MatchUpdate`]s, filtered client-side by [`MatchFilter`].
//!
//! NOTIFY delivery is at-least-once from the subscriber's point of view
//! (reconnects replay nothing but the row survives), and payloads for
//! different matches interleave freely. Both are fine: updates are full
//! snapshots and the board merge is replace-by-id.

use crate::store::map_sqlx;
use async_stream::stream;
use matchday_core::feed::{MatchFeed, MatchFeedError, MatchFilter, MatchStream};
use matchday_core::ledger::StoreError;
use matchday_core::types::{MatchId, MatchState, MatchStatus, MatchUpdate};
use sqlx::Row;
use sqlx::postgres::{PgListener, PgPool, PgRow};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

/// Default NOTIFY channel for match updates.
pub const DEFAULT_CHANNEL: &str = "match_updates";

/// Postgres-backed implementation of [`MatchFeed`].
#[derive(Clone)]
pub struct PostgresMatchFeed {
    pool: PgPool,
    channel: String,
}

impl PostgresMatchFeed {
    /// Create a feed over an existing pool using the default channel.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_channel(pool, DEFAULT_CHANNEL)
    }

    /// Create a feed with an explicit NOTIFY channel name.
    #[must_use]
    pub fn with_channel(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Read the current snapshot for every known match.
    ///
    /// Subscribers seed their board from this before consuming the feed,
    /// so a fresh page is never blank until the first change.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn current_states(&self) -> Result<Vec<MatchState>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, status, home_score, away_score, current_minute,
                    extra_time, timer_running, half_time_break
             FROM match_states",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx(&e))?;

        rows.iter().map(row_to_state).collect()
    }

    /// The underlying pool, for callers composing their own queries.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Read one match's current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn current_state(&self, id: MatchId) -> Result<Option<MatchState>, StoreError> {
        let row = sqlx::query(
            "SELECT id, status, home_score, away_score, current_minute,
                    extra_time, timer_running, half_time_break
             FROM match_states
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx(&e))?;

        row.as_ref().map(row_to_state).transpose()
    }
}

pub(crate) fn row_to_state(row: &PgRow) -> Result<MatchState, StoreError> {
    let id: Uuid = row.try_get("id").map_err(|e| map_sqlx(&e))?;
    let status_text: String = row.try_get("status").map_err(|e| map_sqlx(&e))?;
    let status = MatchStatus::parse(&status_text)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown match status: {status_text}")))?;

    let int_column = |name: &str| -> Result<u32, StoreError> {
        let value: i32 = row.try_get(name).map_err(|e| map_sqlx(&e))?;
        u32::try_from(value)
            .map_err(|_| StoreError::Corrupt(format!("negative value in {name}: {value}")))
    };

    Ok(MatchState {
        id: MatchId::from_uuid(id),
        status,
        home_score: int_column("home_score")?,
        away_score: int_column("away_score")?,
        current_minute: int_column("current_minute")?,
        extra_time: int_column("extra_time")?,
        timer_running: row.try_get("timer_running").map_err(|e| map_sqlx(&e))?,
        half_time_break: row.try_get("half_time_break").map_err(|e| map_sqlx(&e))?,
    })
}

impl MatchFeed for PostgresMatchFeed {
    fn publish(
        &self,
        update: &MatchUpdate,
    ) -> Pin<Box<dyn Future<Output = Result<(), MatchFeedError>> + Send + '_>> {
        let update = update.clone();
        Box::pin(async move {
            let state = &update.state;
            let match_id = state.id;
            let fail = |reason: String| MatchFeedError::PublishFailed { match_id, reason };

            let payload = serde_json::to_string(&update).map_err(|e| fail(e.to_string()))?;

            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| MatchFeedError::ConnectionFailed(e.to_string()))?;

            sqlx::query(
                "INSERT INTO match_states
                     (id, status, home_score, away_score, current_minute,
                      extra_time, timer_running, half_time_break, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
                 ON CONFLICT (id) DO UPDATE
                 SET status = EXCLUDED.status,
                     home_score = EXCLUDED.home_score,
                     away_score = EXCLUDED.away_score,
                     current_minute = EXCLUDED.current_minute,
                     extra_time = EXCLUDED.extra_time,
                     timer_running = EXCLUDED.timer_running,
                     half_time_break = EXCLUDED.half_time_break,
                     updated_at = now()",
            )
            .bind(state.id.as_uuid())
            .bind(state.status.as_str())
            .bind(i32::try_from(state.home_score).unwrap_or(i32::MAX))
            .bind(i32::try_from(state.away_score).unwrap_or(i32::MAX))
            .bind(i32::try_from(state.current_minute).unwrap_or(i32::MAX))
            .bind(i32::try_from(state.extra_time).unwrap_or(i32::MAX))
            .bind(state.timer_running)
            .bind(state.half_time_break)
            .execute(&mut *tx)
            .await
            .map_err(|e| fail(e.to_string()))?;

            sqlx::query("SELECT pg_notify($1, $2)")
                .bind(&self.channel)
                .bind(&payload)
                .execute(&mut *tx)
                .await
                .map_err(|e| fail(e.to_string()))?;

            tx.commit().await.map_err(|e| fail(e.to_string()))?;

            tracing::debug!(
                match_id = %state.id,
                status = %state.status,
                minute = state.current_minute,
                "match update published"
            );
            Ok(())
        })
    }

    fn subscribe(
        &self,
        filter: MatchFilter,
    ) -> Pin<Box<dyn Future<Output = Result<MatchStream, MatchFeedError>> + Send + '_>> {
        Box::pin(async move {
            let mut listener = PgListener::connect_with(&self.pool)
                .await
                .map_err(|e| MatchFeedError::SubscriptionFailed(e.to_string()))?;
            listener
                .listen(&self.channel)
                .await
                .map_err(|e| MatchFeedError::SubscriptionFailed(e.to_string()))?;

            tracing::info!(channel = %self.channel, ?filter, "listening for match updates");

            let stream = stream! {
                loop {
                    match listener.recv().await {
                        Ok(notification) => {
                            match serde_json::from_str::<MatchUpdate>(notification.payload()) {
                                Ok(update) => {
                                    if filter.accepts(update.state.id) {
                                        yield Ok(update);
                                    }
                                }
                                // Bad payload: report in-band, keep listening.
                                Err(err) => yield Err(MatchFeedError::Decode(err.to_string())),
                            }
                        }
                        Err(err) => {
                            // Connection lost; end the stream so the
                            // subscriber's reconnect loop takes over.
                            yield Err(MatchFeedError::Transport(err.to_string()));
                            break;
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as MatchStream)
        })
    }
}
