//! Gate validation: decide whether a scanned code admits its holder.
//!
//! The validator is the single decision point both acquisition frontends
//! funnel into. Given a raw scanned/typed code it either accepts (and
//! durably records the scan) or rejects with a terminal, human-readable
//! reason. Store failures are a separate, retryable channel - see
//! [`StoreError`] - and leave no trace in the ledger.

use crate::environment::Clock;
use crate::ledger::{LedgerOutcome, ScanLedger, StoreError, TicketDirectory};
use crate::types::{OperatorId, ScanRecord, TicketOrder, TicketOrderId, TicketSummary};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How long after scheduled kickoff a match ticket remains redeemable.
///
/// Late arrivals are let through well into the match; after this window
/// the ticket is treated as expired regardless of payment.
pub const GRACE_PERIOD: Duration = Duration::hours(2);

/// Terminal business reasons for refusing a code.
///
/// Retrying the same code will not change these outcomes within the same
/// match window, which is why they are values on [`Verdict`] rather than
/// errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No completed-payment order matches the code
    NotFoundOrUnpaid,
    /// The order was already redeemed; carries the original scan time
    AlreadyScanned {
        /// When the winning scan was recorded
        scanned_at: DateTime<Utc>,
    },
    /// The linked match's window has passed
    Expired {
        /// The scheduled kickoff that anchors the window
        kickoff: DateTime<Utc>,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFoundOrUnpaid => write!(f, "ticket not found or unpaid"),
            Self::AlreadyScanned { scanned_at } => {
                write!(f, "already scanned at {}", scanned_at.format("%H:%M:%S"))
            }
            Self::Expired { kickoff } => {
                write!(f, "expired (kickoff was {})", kickoff.format("%Y-%m-%d %H:%M"))
            }
        }
    }
}

/// The validator's answer for one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Admit the holder; summary for operator display
    Accepted(TicketSummary),
    /// Refuse the holder; terminal for this code
    Rejected(Rejection),
}

impl Verdict {
    /// Whether this verdict admits the holder.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// One-line operator message for this verdict.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Accepted(summary) => match &summary.match_description {
                Some(desc) => format!(
                    "OK: {} x{} ({desc})",
                    summary.customer_name, summary.quantity
                ),
                None => format!("OK: {} x{}", summary.customer_name, summary.quantity),
            },
            Self::Rejected(rejection) => format!("REFUSED: {rejection}"),
        }
    }
}

/// The gate's accept/reject decision logic.
///
/// Holds the two store surfaces and a clock; cheap to clone and share
/// across frontends. One instance serves any number of operators - the
/// operator id travels with each call.
#[derive(Clone)]
pub struct Validator {
    directory: Arc<dyn TicketDirectory>,
    ledger: Arc<dyn ScanLedger>,
    clock: Arc<dyn Clock>,
}

impl Validator {
    /// Create a validator over the given store surfaces.
    #[must_use]
    pub fn new(
        directory: Arc<dyn TicketDirectory>,
        ledger: Arc<dyn ScanLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            ledger,
            clock,
        }
    }

    /// Validate a raw scanned or typed code.
    ///
    /// Steps: parse the code, fetch the paid order, refuse an already
    /// redeemed or expired ticket, then attempt the ledger insert. The
    /// insert is the atomicity boundary - if two validations race on the
    /// same id, the store accepts exactly one and the loser comes back
    /// here as [`Rejection::AlreadyScanned`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for infrastructure failures during lookup or
    /// insert. Nothing is recorded in the ledger in that case and the
    /// operator may retry the same code.
    pub async fn validate(
        &self,
        raw_code: &str,
        operator: OperatorId,
    ) -> Result<Verdict, StoreError> {
        let Some(id) = TicketOrderId::parse(raw_code) else {
            tracing::debug!(code = raw_code, "unparseable gate code");
            return Ok(Verdict::Rejected(Rejection::NotFoundOrUnpaid));
        };

        let Some(order) = self.directory.paid_order(id).await? else {
            tracing::info!(ticket_order = %id, "no paid order for code");
            return Ok(Verdict::Rejected(Rejection::NotFoundOrUnpaid));
        };

        if let Some(existing) = self.ledger.find(id).await? {
            tracing::info!(
                ticket_order = %id,
                scanned_at = %existing.scanned_at,
                "ticket already redeemed"
            );
            return Ok(Verdict::Rejected(Rejection::AlreadyScanned {
                scanned_at: existing.scanned_at,
            }));
        }

        let now = self.clock.now();
        if let Some(rejection) = Self::expiry_check(&order, now) {
            tracing::info!(ticket_order = %id, "ticket outside match window");
            return Ok(Verdict::Rejected(rejection));
        }

        let record = ScanRecord {
            ticket_order_id: id,
            scanned_at: now,
            operator_id: operator,
        };

        match self.ledger.record(record).await? {
            LedgerOutcome::Recorded => {
                tracing::info!(ticket_order = %id, operator = %operator, "scan recorded");
                Ok(Verdict::Accepted(TicketSummary::from_order(&order, now)))
            }
            // Lost the insert race to another operator: re-classified, not
            // an error. The winner's record supplies the timestamp.
            LedgerOutcome::Duplicate(existing) => {
                tracing::info!(
                    ticket_order = %id,
                    scanned_at = %existing.scanned_at,
                    "lost scan race"
                );
                Ok(Verdict::Rejected(Rejection::AlreadyScanned {
                    scanned_at: existing.scanned_at,
                }))
            }
        }
    }

    /// Expired iff the order is tied to a match whose kickoff plus the
    /// grace window lies in the past.
    fn expiry_check(order: &TicketOrder, now: DateTime<Utc>) -> Option<Rejection> {
        let info = order.ticket_type.match_info.as_ref()?;
        (info.kickoff + GRACE_PERIOD < now).then(|| Rejection::Expired {
            kickoff: info.kickoff,
        })
    }
}
