//! Subscribes to the match feed and logs board changes.
//!
//! Seeds the board from the current `match_states` rows, then renders a
//! line whenever a live update lands. The board keeps showing last-known
//! state if the feed drops, with a staleness marker.

use anyhow::Context;
use chrono::Utc;
use matchday_console::{Config, init_tracing};
use matchday_core::feed::{MatchFeed, MatchFilter};
use matchday_core::types::MatchUpdate;
use matchday_liveboard::{BoardSubscriber, DisplayPhase, shared_board};
use matchday_postgres::{PostgresGateStore, PostgresMatchFeed};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_filter);

    let store = PostgresGateStore::connect(&config.database.url)
        .await
        .context("connecting to database")?;
    store.migrate().await.context("running migrations")?;

    let feed = Arc::new(PostgresMatchFeed::with_channel(
        store.pool().clone(),
        &config.feed.channel,
    ));
    let board = shared_board();

    // Seed from the authoritative rows so the board is never blank.
    let seeded = feed.current_states().await.context("seeding board")?;
    {
        let mut board = board.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        for state in seeded {
            board.apply(&MatchUpdate::new(state, Utc::now()));
        }
        info!(matches = board.len(), "board seeded");
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let subscriber = BoardSubscriber::new(
        "scoreboard",
        Arc::clone(&feed) as Arc<dyn MatchFeed>,
        MatchFilter::All,
        Arc::clone(&board),
        shutdown_rx,
    )
    .spawn();

    let mut render = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("ctrl-c received, shutting down");
                let _ = shutdown_tx.send(());
                break;
            }
            _ = render.tick() => {
                let board = board.read().unwrap_or_else(std::sync::PoisonError::into_inner);
                for state in board.all() {
                    info!(
                        match_id = %state.id,
                        clock = %state.clock_label(),
                        score = %format!("{}-{}", state.home_score, state.away_score),
                        phase = ?DisplayPhase::for_state(state),
                        stale = board.is_stale(),
                        "match"
                    );
                }
            }
        }
    }

    subscriber.await.context("joining subscriber")?;
    Ok(())
}
