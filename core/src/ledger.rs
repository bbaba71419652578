//! Store abstractions for ticket orders and the scan ledger.
//!
//! The gate depends on two narrow query surfaces: a read-only directory of
//! paid ticket orders, and an append-only ledger of successful scans. Both
//! are traits so the validator can be exercised against the in-memory
//! doubles in `matchday-testing` as well as the Postgres implementations.
//!
//! # Atomicity
//!
//! The validator performs a check-then-insert sequence that is **not**
//! atomic at the application level. Correctness of "scanned at most once"
//! rests entirely on the ledger's uniqueness constraint: when two inserts
//! race on the same ticket order id, the store accepts exactly one and the
//! implementation reports the loser as [`LedgerOutcome::Duplicate`] with
//! the winning record. Implementations must never substitute client-side
//! locking for this - multiple independent scanner devices exist, and a
//! lock held on one of them protects nothing.
//!
//! # Dyn Compatibility
//!
//! These traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so they can be used as trait objects (`Arc<dyn ScanLedger>`)
//! and shared across frontends.

use crate::types::{ScanRecord, TicketOrder, TicketOrderId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by the backing store.
///
/// These are infrastructure failures, distinct from business rejections:
/// they are surfaced to the operator as a retryable "system error" and are
/// never recorded in the scan ledger.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Could not reach the store at all
    #[error("store connection failed: {0}")]
    Connection(String),

    /// A query or statement failed
    #[error("store query failed: {0}")]
    Query(String),

    /// The store returned data the client could not interpret
    #[error("store returned corrupt data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether a retry of the same operation could plausibly succeed.
    ///
    /// Corrupt rows will stay corrupt; connectivity and query failures are
    /// worth another attempt.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query(_))
    }
}

/// Outcome of attempting to record a scan in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerOutcome {
    /// The insert was durably accepted; this scan is the first
    Recorded,
    /// A record for this ticket order already existed - the ledger holds
    /// the winning record, returned here for operator context
    Duplicate(ScanRecord),
}

/// Read-only directory of paid ticket orders.
///
/// The payment filter lives in the implementation's query: an order whose
/// payment never completed is reported as absent, exactly like an unknown
/// id. The gate never learns the difference, and does not need to.
pub trait TicketDirectory: Send + Sync {
    /// Point lookup of a ticket order by id, restricted to orders whose
    /// payment has completed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup itself fails; absence is
    /// `Ok(None)`.
    fn paid_order(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TicketOrder>, StoreError>> + Send + '_>>;
}

/// Append-only ledger of successful scans.
///
/// One row per redeemed ticket order, keyed (uniquely) by the order id.
/// Rows are never updated or deleted under normal operation.
pub trait ScanLedger: Send + Sync {
    /// Look up the scan record for a ticket order, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails.
    fn find(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ScanRecord>, StoreError>> + Send + '_>>;

    /// Attempt to record a scan.
    ///
    /// This call is the atomicity boundary for the whole gate: the store's
    /// uniqueness constraint decides the winner when concurrent scans race
    /// on the same id. Implementations translate a uniqueness violation
    /// into [`LedgerOutcome::Duplicate`] carrying the existing record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only for infrastructure failures; losing the
    /// race is a normal outcome, not an error.
    fn record(
        &self,
        record: ScanRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LedgerOutcome, StoreError>> + Send + '_>>;
}
