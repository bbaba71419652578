//! The shared, debounced entry point both frontends funnel through.
//!
//! Manual entry and the camera scanner differ only in how codes arrive;
//! everything after that - debounce, validation, feedback, history - is
//! identical and lives here. One `Gatekeeper` belongs to one operator's
//! device session.

use crate::feedback::{FeedbackCue, OperatorFeedback};
use crate::history::{AttemptOutcome, ScanAttempt, ScanHistory};
use crate::session::{Admission, ScanSession, SuppressReason};
use matchday_core::environment::Clock;
use matchday_core::types::TicketSummary;
use matchday_core::validator::{Rejection, Validator, Verdict};
use std::sync::Arc;

/// What one submitted code came to.
#[derive(Clone, Debug)]
pub enum GateOutcome {
    /// Holder admitted
    Accepted(TicketSummary),
    /// Holder refused; terminal for this code
    Rejected(Rejection),
    /// Store failure; the operator may re-present the ticket
    SystemError(String),
    /// The debounce filter swallowed the trigger before validation
    Suppressed(SuppressReason),
}

/// Result surfaced to the operator for one submission.
#[derive(Clone, Debug)]
pub struct ScanReport {
    /// What happened
    pub outcome: GateOutcome,
    /// One-line human-readable message
    pub message: String,
}

impl ScanReport {
    /// Whether this report admitted the holder.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.outcome, GateOutcome::Accepted(_))
    }

    /// Whether the trigger was swallowed before reaching the validator.
    #[must_use]
    pub const fn is_suppressed(&self) -> bool {
        matches!(self.outcome, GateOutcome::Suppressed(_))
    }
}

/// One operator's gate: debounce, validate, signal, remember.
pub struct Gatekeeper {
    validator: Validator,
    session: ScanSession,
    feedback: Arc<dyn OperatorFeedback>,
    history: ScanHistory,
    clock: Arc<dyn Clock>,
}

impl Gatekeeper {
    /// Assemble a gatekeeper from its parts. The session decides the
    /// debounce profile (camera cooldown vs manual).
    #[must_use]
    pub fn new(
        validator: Validator,
        session: ScanSession,
        feedback: Arc<dyn OperatorFeedback>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let history = ScanHistory::new(Arc::clone(&clock));
        Self {
            validator,
            session,
            feedback,
            history,
            clock,
        }
    }

    /// Submit one raw code (scanned or typed).
    ///
    /// Suppressed triggers return immediately with no validation, no
    /// feedback cue, and no history entry - at camera frame rates they
    /// are pure noise. Forwarded attempts always produce a cue and a
    /// history entry, whatever the outcome.
    pub async fn submit(&mut self, raw: &str) -> ScanReport {
        let code = raw.trim().to_string();

        match self.session.admit(&code) {
            Admission::Suppressed(reason) => {
                tracing::trace!(?reason, "scan trigger suppressed");
                return ScanReport {
                    outcome: GateOutcome::Suppressed(reason),
                    message: String::new(),
                };
            }
            Admission::Forward => {}
        }

        let result = self
            .validator
            .validate(&code, self.session.operator())
            .await;
        self.session.complete();

        let (outcome, attempt, cue, message) = match result {
            Ok(Verdict::Accepted(summary)) => {
                let message = Verdict::Accepted(summary.clone()).message();
                (
                    GateOutcome::Accepted(summary),
                    AttemptOutcome::Accepted,
                    FeedbackCue::Accepted,
                    message,
                )
            }
            Ok(Verdict::Rejected(rejection)) => {
                let message = Verdict::Rejected(rejection.clone()).message();
                (
                    GateOutcome::Rejected(rejection),
                    AttemptOutcome::Rejected,
                    FeedbackCue::Rejected,
                    message,
                )
            }
            Err(err) => {
                tracing::warn!(error = %err, "store failure during validation");
                let message = format!("SYSTEM ERROR: {err} (please retry)");
                (
                    GateOutcome::SystemError(err.to_string()),
                    AttemptOutcome::SystemError,
                    FeedbackCue::Rejected,
                    message,
                )
            }
        };

        // Best-effort by contract: a dead speaker never fails a scan.
        self.feedback.signal(cue);

        self.history.push(ScanAttempt {
            code,
            outcome: attempt,
            summary: match &outcome {
                GateOutcome::Accepted(summary) => Some(summary.clone()),
                _ => None,
            },
            message: message.clone(),
            at: self.clock.now(),
        });

        ScanReport { outcome, message }
    }

    /// The session's attempt history.
    #[must_use]
    pub const fn history(&self) -> &ScanHistory {
        &self.history
    }

    /// The underlying debounce session (for frontend state displays).
    #[must_use]
    pub const fn session(&self) -> &ScanSession {
        &self.session
    }
}
