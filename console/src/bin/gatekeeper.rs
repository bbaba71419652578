//! Manual-entry gate console: type or paste codes, one per line.
//!
//! Prints the one-line validation result per code and the session totals
//! on exit. Operator identity comes from `GATE_OPERATOR_ID` (a UUID) or
//! is generated fresh for the session.

use anyhow::Context;
use matchday_console::{Config, init_tracing};
use matchday_core::environment::SystemClock;
use matchday_core::types::OperatorId;
use matchday_core::validator::Validator;
use matchday_gate::feedback::SilentFeedback;
use matchday_gate::manual::ManualEntry;
use matchday_postgres::PostgresGateStore;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config.log_filter);

    let store = PostgresGateStore::connect(&config.database.url)
        .await
        .context("connecting to database")?;
    store.migrate().await.context("running migrations")?;

    let operator = std::env::var("GATE_OPERATOR_ID")
        .ok()
        .and_then(|s| uuid::Uuid::parse_str(&s).ok())
        .map_or_else(OperatorId::new, OperatorId::from_uuid);
    info!(%operator, "gate console ready; one code per line, ctrl-d to finish");

    let validator = Validator::new(
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(SystemClock),
    );
    let mut entry = ManualEntry::new(
        validator,
        operator,
        Arc::new(SystemClock),
        Arc::new(SilentFeedback),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let report = entry.submit(&line).await;
        if report.is_suppressed() {
            continue;
        }
        info!("{}", report.message);
    }

    let totals = entry.gatekeeper().history().totals();
    info!(
        attempts = totals.attempts,
        accepted = totals.accepted,
        today = totals.today,
        "session finished"
    );
    Ok(())
}
