//! # Matchday Console
//!
//! Operational binaries wiring the workspace crates against Postgres:
//!
//! - `matchclock` - runs the live match state publisher
//! - `scoreboard` - subscribes to the feed and renders board updates
//! - `gatekeeper` - manual-entry gate console over stdin
//!
//! The library part holds the shared [`config`] and tracing setup.

pub mod config;

pub use config::Config;

/// Initialize tracing from the configured filter.
pub fn init_tracing(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
