//! Injected dependencies shared across the workspace.
//!
//! Wall-clock time is the only ambient dependency the core logic touches,
//! and it is abstracted so the validator's grace window and the scan
//! session's cooldown are deterministic under test.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability.
///
/// Production code uses [`SystemClock`]; tests use the `FixedClock` from
/// `matchday-testing`, which only moves when told to.
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by `Utc::now()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
