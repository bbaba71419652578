//! Per-operator scan session: the debounce filter in front of the
//! validator.
//!
//! A continuous camera decoder fires many times per second while a ticket
//! stays in frame; without suppression every frame would hit the store.
//! The session keeps the rolling window the frontends consult before
//! forwarding anything: the last forwarded code, when it was forwarded,
//! and whether a validation is currently outstanding.
//!
//! The state is ephemeral and strictly local to one operator's device.
//! It is rebuilt fresh per session and never shared - cross-device
//! duplicate prevention is the scan ledger's job, not this filter's.

use chrono::{DateTime, Duration, Utc};
use matchday_core::environment::Clock;
use matchday_core::types::OperatorId;
use std::sync::Arc;

/// Cooldown between forwarded payloads for camera sessions.
///
/// Long enough that a held-up ticket does not re-trigger every frame,
/// short enough that the same ticket can be legitimately re-attempted
/// after an errored first try.
pub const SCAN_COOLDOWN_MS: i64 = 2000;

/// Why a decoded payload was not forwarded to the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuppressReason {
    /// A validation for this operator is still outstanding
    InFlight,
    /// The cooldown since the last forwarded payload has not elapsed
    Cooldown,
    /// The input was blank after trimming
    Blank,
}

/// The session's answer for one decoded payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Forward to the validator; the in-flight window is now open
    Forward,
    /// Swallow the trigger
    Suppressed(SuppressReason),
}

/// Rolling debounce state for one operator's device session.
pub struct ScanSession {
    operator: OperatorId,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    last_code: Option<String>,
    last_forwarded_at: Option<DateTime<Utc>>,
    in_flight: bool,
}

impl ScanSession {
    /// Session for a continuous camera frontend, with the standard
    /// cooldown between forwarded payloads.
    #[must_use]
    pub fn camera(operator: OperatorId, clock: Arc<dyn Clock>) -> Self {
        Self::with_cooldown(operator, clock, Duration::milliseconds(SCAN_COOLDOWN_MS))
    }

    /// Session for a manual-entry frontend: no cooldown, only the
    /// one-outstanding-validation rule applies.
    #[must_use]
    pub fn manual(operator: OperatorId, clock: Arc<dyn Clock>) -> Self {
        Self::with_cooldown(operator, clock, Duration::zero())
    }

    /// Session with an explicit cooldown.
    #[must_use]
    pub fn with_cooldown(operator: OperatorId, clock: Arc<dyn Clock>, cooldown: Duration) -> Self {
        Self {
            operator,
            clock,
            cooldown,
            last_code: None,
            last_forwarded_at: None,
            in_flight: false,
        }
    }

    /// Decide whether a payload may be forwarded to the validator.
    ///
    /// Forwards iff no validation is outstanding and the cooldown has
    /// elapsed since the last forwarded payload. The cooldown applies to
    /// every payload, same or different - which also means the same code
    /// becomes forwardable again once the cooldown passes, so an errored
    /// attempt can be retried without restarting the session.
    ///
    /// On `Forward` the in-flight window opens; call [`complete`] once
    /// the validation result is known.
    ///
    /// [`complete`]: ScanSession::complete
    pub fn admit(&mut self, code: &str) -> Admission {
        let code = code.trim();
        if code.is_empty() {
            return Admission::Suppressed(SuppressReason::Blank);
        }
        if self.in_flight {
            return Admission::Suppressed(SuppressReason::InFlight);
        }

        let now = self.clock.now();
        if let Some(last) = self.last_forwarded_at {
            if now - last < self.cooldown {
                return Admission::Suppressed(SuppressReason::Cooldown);
            }
        }

        self.in_flight = true;
        self.last_code = Some(code.to_string());
        self.last_forwarded_at = Some(now);
        Admission::Forward
    }

    /// Close the in-flight window after a validation completed (in any
    /// way, including a store error).
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Whether a validation is currently outstanding.
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        self.in_flight
    }

    /// The last forwarded code, if any.
    #[must_use]
    pub fn last_code(&self) -> Option<&str> {
        self.last_code.as_deref()
    }

    /// When the last payload was forwarded.
    #[must_use]
    pub const fn last_forwarded_at(&self) -> Option<DateTime<Utc>> {
        self.last_forwarded_at
    }

    /// The operator this session belongs to.
    #[must_use]
    pub const fn operator(&self) -> OperatorId {
        self.operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchday_testing::test_clock;
    use proptest::prelude::*;

    fn camera_session(clock: &matchday_testing::FixedClock) -> ScanSession {
        ScanSession::camera(OperatorId::new(), Arc::new(clock.clone()))
    }

    #[test]
    fn same_payload_within_cooldown_forwards_once() {
        let clock = test_clock();
        let mut session = camera_session(&clock);

        assert_eq!(session.admit("T-1"), Admission::Forward);
        session.complete();

        clock.advance(Duration::milliseconds(500));
        assert_eq!(
            session.admit("T-1"),
            Admission::Suppressed(SuppressReason::Cooldown)
        );
    }

    #[test]
    fn same_payload_after_cooldown_forwards_again() {
        let clock = test_clock();
        let mut session = camera_session(&clock);

        assert_eq!(session.admit("T-1"), Admission::Forward);
        session.complete();

        clock.advance(Duration::milliseconds(SCAN_COOLDOWN_MS));
        assert_eq!(session.admit("T-1"), Admission::Forward);
    }

    #[test]
    fn nothing_forwards_while_validation_is_outstanding() {
        let clock = test_clock();
        let mut session = camera_session(&clock);

        assert_eq!(session.admit("T-1"), Admission::Forward);
        // Cooldown elapsed, but still in flight
        clock.advance(Duration::milliseconds(SCAN_COOLDOWN_MS * 2));
        assert_eq!(
            session.admit("T-2"),
            Admission::Suppressed(SuppressReason::InFlight)
        );

        session.complete();
        assert_eq!(session.admit("T-2"), Admission::Forward);
    }

    #[test]
    fn blank_input_is_suppressed_without_opening_a_window() {
        let clock = test_clock();
        let mut session = camera_session(&clock);

        assert_eq!(
            session.admit("   "),
            Admission::Suppressed(SuppressReason::Blank)
        );
        assert!(!session.is_processing());
        assert_eq!(session.admit("T-1"), Admission::Forward);
    }

    #[test]
    fn manual_session_has_no_cooldown() {
        let clock = test_clock();
        let mut session = ScanSession::manual(OperatorId::new(), Arc::new(clock.clone()));

        assert_eq!(session.admit("T-1"), Admission::Forward);
        session.complete();
        // Immediate resubmission of a different code is fine for typed entry
        assert_eq!(session.admit("T-2"), Admission::Forward);
    }

    #[test]
    fn session_tracks_the_rolling_window() {
        let clock = test_clock();
        let mut session = camera_session(&clock);
        assert_eq!(session.last_code(), None);

        session.admit("  T-9  ");
        assert_eq!(session.last_code(), Some("T-9"));
        assert_eq!(session.last_forwarded_at(), Some(clock.now()));
        assert!(session.is_processing());
    }

    proptest! {
        /// Any two forwarded payloads in a camera session are at least a
        /// cooldown apart, whatever the frame timing looks like.
        #[test]
        fn forwards_are_never_closer_than_the_cooldown(
            steps in prop::collection::vec((0_i64..3000, 0_u8..3), 1..40)
        ) {
            let clock = test_clock();
            let mut session = camera_session(&clock);
            let mut forwarded_at: Vec<DateTime<Utc>> = Vec::new();

            for (advance_ms, code_idx) in steps {
                clock.advance(Duration::milliseconds(advance_ms));
                let code = format!("T-{code_idx}");
                if session.admit(&code) == Admission::Forward {
                    forwarded_at.push(clock.now());
                    session.complete();
                }
            }

            for pair in forwarded_at.windows(2) {
                prop_assert!(pair[1] - pair[0] >= Duration::milliseconds(SCAN_COOLDOWN_MS));
            }
        }
    }
}
