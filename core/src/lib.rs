//! # Matchday Core
//!
//! Domain types and decision logic for the Matchday live event integrity
//! core: gate-entry ticket validation and live match state propagation.
//!
//! ## What lives here
//!
//! - [`types`] - ticket orders, scan records, match state snapshots
//! - [`ledger`] - store traits the validator runs against, and the
//!   uniqueness contract that makes "scanned at most once" hold
//! - [`validator`] - the accept/reject decision both gate frontends
//!   funnel into
//! - [`feed`] - publish/subscribe abstraction for live match updates
//! - [`environment`] - the injected [`Clock`](environment::Clock)
//! - [`retry`] - backoff for transient store/feed failures
//!
//! ## Architecture principles
//!
//! - Business rejections are values ([`validator::Verdict`]), never
//!   errors; infrastructure failures are errors, never verdicts
//! - Atomicity lives in the store (uniqueness constraint), never in a
//!   client-side lock - scanner devices are independent
//! - Live state is propagated as full snapshots merged by id, so
//!   redelivery and reordering are harmless
//!
//! ## Example
//!
//! ```ignore
//! use matchday_core::validator::{Validator, Verdict};
//!
//! let validator = Validator::new(directory, ledger, clock);
//! match validator.validate(scanned_code, operator).await? {
//!     Verdict::Accepted(summary) => admit(summary),
//!     Verdict::Rejected(rejection) => refuse(rejection),
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod environment;
pub mod feed;
pub mod ledger;
pub mod retry;
pub mod types;
pub mod validator;
