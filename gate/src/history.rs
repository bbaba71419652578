//! Session-scoped scan history and running counters.
//!
//! Purely local to the operator's device session: a list of forwarded
//! attempts with their outcomes, plus the running totals shown at the top
//! of the scanning screen. Nothing here is durable - the ledger is the
//! record; this is the operator's working memory.

use chrono::{DateTime, Utc};
use matchday_core::environment::Clock;
use matchday_core::types::TicketSummary;
use std::sync::Arc;

/// How a forwarded attempt ended, for counting purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Holder admitted
    Accepted,
    /// Holder refused on a business rule
    Rejected,
    /// Store failure; the attempt may be retried
    SystemError,
}

/// One forwarded attempt as remembered by the session.
#[derive(Clone, Debug)]
pub struct ScanAttempt {
    /// The code that was forwarded
    pub code: String,
    /// How it ended
    pub outcome: AttemptOutcome,
    /// Acceptance summary, when there was one
    pub summary: Option<TicketSummary>,
    /// The one-line message shown to the operator
    pub message: String,
    /// When the attempt completed
    pub at: DateTime<Utc>,
}

/// Running totals for the session header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryTotals {
    /// Every forwarded attempt, whatever the outcome
    pub attempts: usize,
    /// Attempts that admitted the holder
    pub accepted: usize,
    /// Attempts made today (per the session clock)
    pub today: usize,
}

/// Append-only attempt history for one operator session.
pub struct ScanHistory {
    clock: Arc<dyn Clock>,
    entries: Vec<ScanAttempt>,
}

impl ScanHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Vec::new(),
        }
    }

    /// Record a completed attempt.
    pub fn push(&mut self, attempt: ScanAttempt) {
        metrics::counter!("gate_scan_attempts_total").increment(1);
        match attempt.outcome {
            AttemptOutcome::Accepted => {
                metrics::counter!("gate_scans_accepted_total").increment(1);
            }
            AttemptOutcome::Rejected => {
                metrics::counter!("gate_scans_rejected_total").increment(1);
            }
            AttemptOutcome::SystemError => {
                metrics::counter!("gate_scan_errors_total").increment(1);
            }
        }
        self.entries.push(attempt);
    }

    /// All attempts, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[ScanAttempt] {
        &self.entries
    }

    /// Attempts newest-first, the order the operator's list renders in.
    pub fn recent(&self) -> impl Iterator<Item = &ScanAttempt> {
        self.entries.iter().rev()
    }

    /// Current running totals.
    #[must_use]
    pub fn totals(&self) -> HistoryTotals {
        let today = self.clock.now().date_naive();
        HistoryTotals {
            attempts: self.entries.len(),
            accepted: self
                .entries
                .iter()
                .filter(|a| a.outcome == AttemptOutcome::Accepted)
                .count(),
            today: self
                .entries
                .iter()
                .filter(|a| a.at.date_naive() == today)
                .count(),
        }
    }
}
