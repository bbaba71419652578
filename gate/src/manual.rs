//! Manual code entry: the keyboard fallback frontend.
//!
//! A single-field form in spirit: the operator types or pastes the code
//! and submits. Input is trimmed, blank input is swallowed, and while a
//! validation is outstanding resubmission is disabled - one operator gets
//! one in-flight validation, never two.

use crate::feedback::OperatorFeedback;
use crate::gatekeeper::{Gatekeeper, ScanReport};
use crate::session::ScanSession;
use matchday_core::environment::Clock;
use matchday_core::types::OperatorId;
use matchday_core::validator::Validator;
use std::sync::Arc;

/// Manual-entry frontend for one operator.
pub struct ManualEntry {
    gatekeeper: Gatekeeper,
}

impl ManualEntry {
    /// Build a manual-entry frontend. Uses a no-cooldown session: typed
    /// entry cannot machine-gun the validator the way a camera can.
    #[must_use]
    pub fn new(
        validator: Validator,
        operator: OperatorId,
        clock: Arc<dyn Clock>,
        feedback: Arc<dyn OperatorFeedback>,
    ) -> Self {
        let session = ScanSession::manual(operator, Arc::clone(&clock));
        Self {
            gatekeeper: Gatekeeper::new(validator, session, feedback, clock),
        }
    }

    /// Submit the form once.
    pub async fn submit(&mut self, input: &str) -> ScanReport {
        self.gatekeeper.submit(input).await
    }

    /// Whether the submit control should be disabled right now.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.gatekeeper.session().is_processing()
    }

    /// Access the shared entry point (history, session state).
    #[must_use]
    pub const fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }
}
