//! In-memory ticket directory and scan ledger.
//!
//! [`InMemoryGateStore`] backs validator tests with the same observable
//! contract as the Postgres implementation: the paid-order filter lives in
//! the lookup, and the scan ledger enforces at-most-one-record-per-order
//! atomically (here via a mutex around the map, standing in for the
//! database's uniqueness constraint).
//!
//! Store failures can be injected per-operation with [`fail_next`]
//! to exercise the retryable "system error" path.
//!
//! [`fail_next`]: InMemoryGateStore::fail_next

#![allow(clippy::unwrap_used)] // Test infrastructure: lock poisoning aborts the test anyway

use matchday_core::ledger::{LedgerOutcome, ScanLedger, StoreError, TicketDirectory};
use matchday_core::types::{PaymentStatus, ScanRecord, TicketOrder, TicketOrderId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    orders: HashMap<TicketOrderId, TicketOrder>,
    scans: HashMap<TicketOrderId, ScanRecord>,
    fail_next: Option<StoreError>,
}

/// In-memory stand-in for the gate's store surfaces.
///
/// Cheap to clone; clones share state, so a directory handle and a ledger
/// handle cut from the same store see the same world - as do "two
/// operators" in a race test.
///
/// # Example
///
/// ```
/// use matchday_testing::InMemoryGateStore;
/// use matchday_core::ledger::TicketDirectory;
/// use matchday_core::types::TicketOrderId;
///
/// # async fn example() -> Result<(), matchday_core::ledger::StoreError> {
/// let store = InMemoryGateStore::new();
/// let missing = store.paid_order(TicketOrderId::new()).await?;
/// assert!(missing.is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryGateStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryGateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a ticket order (any payment status).
    pub fn insert_order(&self, order: TicketOrder) {
        self.inner.lock().unwrap().orders.insert(order.id, order);
    }

    /// Inject a failure for the next store operation (any surface).
    pub fn fail_next(&self, error: StoreError) {
        self.inner.lock().unwrap().fail_next = Some(error);
    }

    /// Number of scan records held.
    #[must_use]
    pub fn scan_count(&self) -> usize {
        self.inner.lock().unwrap().scans.len()
    }

    /// The scan record for an order, if any (direct inspection for
    /// assertions, bypassing the async trait surface).
    #[must_use]
    pub fn scan_for(&self, id: TicketOrderId) -> Option<ScanRecord> {
        self.inner.lock().unwrap().scans.get(&id).cloned()
    }

    fn take_injected_failure(inner: &mut Inner) -> Option<StoreError> {
        inner.fail_next.take()
    }
}

impl TicketDirectory for InMemoryGateStore {
    fn paid_order(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<TicketOrder>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            if let Some(err) = Self::take_injected_failure(&mut inner) {
                return Err(err);
            }
            Ok(inner
                .orders
                .get(&id)
                .filter(|order| order.payment_status == PaymentStatus::Completed)
                .cloned())
        })
    }
}

impl ScanLedger for InMemoryGateStore {
    fn find(
        &self,
        id: TicketOrderId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<ScanRecord>, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            if let Some(err) = Self::take_injected_failure(&mut inner) {
                return Err(err);
            }
            Ok(inner.scans.get(&id).cloned())
        })
    }

    fn record(
        &self,
        record: ScanRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LedgerOutcome, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap();
            if let Some(err) = Self::take_injected_failure(&mut inner) {
                return Err(err);
            }
            // Check-and-insert under one lock: the in-memory equivalent of
            // the database uniqueness constraint.
            match inner.scans.get(&record.ticket_order_id) {
                Some(existing) => Ok(LedgerOutcome::Duplicate(existing.clone())),
                None => {
                    inner.scans.insert(record.ticket_order_id, record);
                    Ok(LedgerOutcome::Recorded)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matchday_core::types::{OperatorId, TicketType};

    fn paid_order() -> TicketOrder {
        TicketOrder {
            id: TicketOrderId::new(),
            ticket_type: TicketType {
                name: "Terrace".to_string(),
                match_info: None,
            },
            quantity: 1,
            payment_status: PaymentStatus::Completed,
            customer_name: "Alex".to_string(),
        }
    }

    #[tokio::test]
    async fn unpaid_orders_are_invisible() {
        let store = InMemoryGateStore::new();
        let mut order = paid_order();
        order.payment_status = PaymentStatus::Pending;
        let id = order.id;
        store.insert_order(order);

        assert!(store.paid_order(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_record_for_same_order_is_a_duplicate() {
        let store = InMemoryGateStore::new();
        let id = TicketOrderId::new();
        let first = ScanRecord {
            ticket_order_id: id,
            scanned_at: Utc::now(),
            operator_id: OperatorId::new(),
        };

        let outcome = store.record(first.clone()).await.unwrap();
        assert_eq!(outcome, LedgerOutcome::Recorded);

        let second = ScanRecord {
            operator_id: OperatorId::new(),
            ..first.clone()
        };
        let outcome = store.record(second).await.unwrap();
        assert_eq!(outcome, LedgerOutcome::Duplicate(first));
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryGateStore::new();
        store.fail_next(StoreError::Connection("down".into()));

        assert!(store.paid_order(TicketOrderId::new()).await.is_err());
        assert!(store.paid_order(TicketOrderId::new()).await.is_ok());
    }
}
