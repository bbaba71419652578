//! End-to-end gate flow tests: the validator exercised through the manual
//! frontend against the in-memory store, including the concurrent-scan
//! race the ledger's uniqueness contract exists to win.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{Duration, Utc};
use matchday_core::environment::Clock;
use matchday_core::ledger::StoreError;
use matchday_core::types::{
    MatchId, MatchInfo, OperatorId, PaymentStatus, TicketOrder, TicketOrderId, TicketType,
};
use matchday_core::validator::{Rejection, Validator, Verdict};
use matchday_gate::feedback::{FeedbackCue, OperatorFeedback, SilentFeedback};
use matchday_gate::manual::ManualEntry;
use matchday_gate::GateOutcome;
use matchday_testing::{FixedClock, InMemoryGateStore, test_clock};
use std::sync::{Arc, Mutex};

fn validator_over(store: &InMemoryGateStore, clock: &FixedClock) -> Validator {
    Validator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
    )
}

fn manual_entry(store: &InMemoryGateStore, clock: &FixedClock) -> ManualEntry {
    ManualEntry::new(
        validator_over(store, clock),
        OperatorId::new(),
        Arc::new(clock.clone()),
        Arc::new(SilentFeedback),
    )
}

fn order(payment_status: PaymentStatus, kickoff: Option<chrono::DateTime<Utc>>) -> TicketOrder {
    TicketOrder {
        id: TicketOrderId::new(),
        ticket_type: TicketType {
            name: "West Stand Adult".to_string(),
            match_info: kickoff.map(|kickoff| MatchInfo {
                match_id: MatchId::new(),
                home_team: "Rovers".to_string(),
                away_team: "Athletic".to_string(),
                kickoff,
            }),
        },
        quantity: 2,
        payment_status,
        customer_name: "Pat Lee".to_string(),
    }
}

// Scenario A/B: first scan is accepted and recorded; the immediate retry
// is refused with the original timestamp, unchanged.
#[tokio::test]
async fn accepts_once_then_reports_already_scanned() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let paid = order(PaymentStatus::Completed, None);
    let code = paid.id.to_string();
    store.insert_order(paid.clone());

    let mut entry = manual_entry(&store, &clock);

    let first = entry.submit(&code).await;
    assert!(first.is_accepted());
    let recorded = store.scan_for(paid.id).unwrap();
    assert_eq!(recorded.scanned_at, clock.now());

    clock.advance(Duration::minutes(5));
    let second = entry.submit(&code).await;
    match second.outcome {
        GateOutcome::Rejected(Rejection::AlreadyScanned { scanned_at }) => {
            assert_eq!(scanned_at, recorded.scanned_at);
        }
        other => panic!("expected AlreadyScanned, got {other:?}"),
    }

    // Still exactly one ledger row
    assert_eq!(store.scan_count(), 1);
}

// Scenario C: a pending-payment order is indistinguishable from an
// unknown code.
#[tokio::test]
async fn pending_payment_reads_as_not_found() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let unpaid = order(PaymentStatus::Pending, None);
    let code = unpaid.id.to_string();
    store.insert_order(unpaid);

    let mut entry = manual_entry(&store, &clock);
    let report = entry.submit(&code).await;

    assert!(matches!(
        report.outcome,
        GateOutcome::Rejected(Rejection::NotFoundOrUnpaid)
    ));
    assert_eq!(store.scan_count(), 0);
}

#[tokio::test]
async fn garbage_code_reads_as_not_found() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let mut entry = manual_entry(&store, &clock);

    let report = entry.submit("definitely-not-a-ticket").await;
    assert!(matches!(
        report.outcome,
        GateOutcome::Rejected(Rejection::NotFoundOrUnpaid)
    ));
}

// Expiry: kickoff more than the grace window in the past refuses the
// ticket regardless of payment status, and records nothing.
#[tokio::test]
async fn expired_match_window_refuses_paid_ticket() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let stale = order(
        PaymentStatus::Completed,
        Some(clock.now() - Duration::hours(3)),
    );
    let code = stale.id.to_string();
    store.insert_order(stale);

    let mut entry = manual_entry(&store, &clock);
    let report = entry.submit(&code).await;

    assert!(matches!(
        report.outcome,
        GateOutcome::Rejected(Rejection::Expired { .. })
    ));
    assert_eq!(store.scan_count(), 0);
}

#[tokio::test]
async fn late_arrival_inside_grace_window_is_admitted() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let late = order(
        PaymentStatus::Completed,
        Some(clock.now() - Duration::minutes(110)),
    );
    let code = late.id.to_string();
    store.insert_order(late);

    let mut entry = manual_entry(&store, &clock);
    assert!(entry.submit(&code).await.is_accepted());
}

// Two operators, same physical ticket, simultaneously: exactly one
// ACCEPT, the other re-classified as already scanned. Never two accepts.
#[tokio::test]
async fn concurrent_scans_admit_exactly_one() {
    for _ in 0..50 {
        let store = InMemoryGateStore::new();
        let clock = test_clock();
        let paid = order(PaymentStatus::Completed, None);
        let code = paid.id.to_string();
        store.insert_order(paid.clone());

        let validator_a = validator_over(&store, &clock);
        let validator_b = validator_over(&store, &clock);
        let (code_a, code_b) = (code.clone(), code);

        let a = tokio::spawn(async move {
            validator_a.validate(&code_a, OperatorId::new()).await
        });
        let b = tokio::spawn(async move {
            validator_b.validate(&code_b, OperatorId::new()).await
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        let accepted = [&a, &b].iter().filter(|v| v.is_accepted()).count();
        assert_eq!(accepted, 1, "exactly one operator must win");

        let loser = if a.is_accepted() { &b } else { &a };
        assert!(matches!(
            loser,
            Verdict::Rejected(Rejection::AlreadyScanned { .. })
        ));
        assert_eq!(store.scan_count(), 1);
    }
}

// A store failure is a retryable system error: nothing lands in the
// ledger and the same code succeeds on the retry.
#[tokio::test]
async fn store_failure_is_retryable_and_leaves_no_trace() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let paid = order(PaymentStatus::Completed, None);
    let code = paid.id.to_string();
    store.insert_order(paid);

    let mut entry = manual_entry(&store, &clock);

    store.fail_next(StoreError::Connection("store unreachable".into()));
    let report = entry.submit(&code).await;
    assert!(matches!(report.outcome, GateOutcome::SystemError(_)));
    assert_eq!(store.scan_count(), 0);

    let retry = entry.submit(&code).await;
    assert!(retry.is_accepted());
    assert_eq!(store.scan_count(), 1);
}

// The operator is never left without feedback: every forwarded attempt
// fires a cue, and the failure cue is distinct from the success cue.
#[tokio::test]
async fn every_forwarded_attempt_fires_a_cue() {
    #[derive(Default)]
    struct CapturedFeedback(Mutex<Vec<FeedbackCue>>);
    impl OperatorFeedback for CapturedFeedback {
        fn signal(&self, cue: FeedbackCue) {
            self.0.lock().unwrap().push(cue);
        }
    }

    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let paid = order(PaymentStatus::Completed, None);
    let code = paid.id.to_string();
    store.insert_order(paid);

    let captured = Arc::new(CapturedFeedback::default());
    let mut entry = ManualEntry::new(
        validator_over(&store, &clock),
        OperatorId::new(),
        Arc::new(clock.clone()),
        Arc::clone(&captured) as Arc<dyn OperatorFeedback>,
    );

    entry.submit(&code).await;
    entry.submit(&code).await;
    entry.submit("  ").await; // blank: suppressed, no cue

    let cues = captured.0.lock().unwrap().clone();
    assert_eq!(cues, vec![FeedbackCue::Accepted, FeedbackCue::Rejected]);
}

// History keeps the operator's running totals.
#[tokio::test]
async fn history_totals_track_the_session() {
    let store = InMemoryGateStore::new();
    let clock = test_clock();
    let paid = order(PaymentStatus::Completed, None);
    let code = paid.id.to_string();
    store.insert_order(paid);

    let mut entry = manual_entry(&store, &clock);
    entry.submit(&code).await;
    entry.submit(&code).await;
    entry.submit("nonsense").await;

    let totals = entry.gatekeeper().history().totals();
    assert_eq!(totals.attempts, 3);
    assert_eq!(totals.accepted, 1);
    assert_eq!(totals.today, 3);
}
