//! Runs the live match state publisher.
//!
//! ```text
//! DATABASE_URL=postgres://... MATCH_CLOCK_TICK_SECONDS=60 matchclock
//! ```

use anyhow::Context;
use matchday_console::{Config, init_tracing};
use matchday_core::environment::SystemClock;
use matchday_postgres::{MatchClock, PostgresGateStore, PostgresMatchFeed};
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

    let feed = PostgresMatchFeed::with_channel(store.pool().clone(), &config.feed.channel);
    let clock = MatchClock::new(
        feed,
        Arc::new(SystemClock),
        Duration::from_secs(config.clock.tick_seconds),
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    clock.run(shutdown_rx).await;
    Ok(())
}
