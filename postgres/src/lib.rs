//! # Matchday Postgres
//!
//! `PostgreSQL` implementations of the Matchday store surfaces and the
//! live match feed:
//!
//! - [`store`] - [`PostgresGateStore`](store::PostgresGateStore), the
//!   ticket directory and scan ledger; the `scan_records` primary key is
//!   the system's "scanned at most once" boundary
//! - [`feed`] - [`PostgresMatchFeed`](feed::PostgresMatchFeed),
//!   row-then-NOTIFY publication and `PgListener` subscriptions
//! - [`clock`] - [`MatchClock`](clock::MatchClock), the publisher that
//!   advances live matches and carries admin actions
//!
//! ## Schema
//!
//! Migrations live in `migrations/` and are applied with
//! [`PostgresGateStore::migrate`](store::PostgresGateStore::migrate):
//!
//! ```sql
//! ticket_orders (id UUID PRIMARY KEY, payment_status TEXT, ...)
//! scan_records  (ticket_order_id UUID PRIMARY KEY, scanned_at, operator_id)
//! match_states  (id UUID PRIMARY KEY, status, scores, clock fields, ...)
//! ```

pub mod clock;
pub mod feed;
pub mod store;

pub use clock::{ClockError, MatchClock};
pub use feed::{DEFAULT_CHANNEL, PostgresMatchFeed};
pub use store::PostgresGateStore;
