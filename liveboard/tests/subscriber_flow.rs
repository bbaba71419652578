//! Subscriber behavior against the in-memory feed: live updates land on
//! the board, redelivery is invisible, filters hold, shutdown is clean.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use matchday_core::feed::{MatchFeed, MatchFilter};
use matchday_core::types::{MatchId, MatchState, MatchStatus, MatchUpdate};
use matchday_liveboard::{BoardSubscriber, shared_board};
use matchday_testing::InMemoryMatchFeed;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn live_update(id: MatchId, minute: u32, home: u32, away: u32) -> MatchUpdate {
    let mut state = MatchState::scheduled(id);
    state.status = MatchStatus::Live;
    state.current_minute = minute;
    state.home_score = home;
    state.away_score = away;
    state.timer_running = true;
    MatchUpdate::new(state, Utc::now())
}

async fn settle() {
    // Give the subscriber task a few polls to drain the channel.
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn updates_reach_the_board_without_polling() {
    let feed = Arc::new(InMemoryMatchFeed::new());
    let board = shared_board();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = BoardSubscriber::new(
        "test",
        Arc::clone(&feed) as Arc<dyn MatchFeed>,
        MatchFilter::All,
        Arc::clone(&board),
        shutdown_rx,
    )
    .spawn();

    // Wait for the subscription to attach before publishing.
    while feed.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let id = MatchId::new();
    feed.publish(&live_update(id, 10, 1, 0)).await.unwrap();
    feed.publish(&live_update(id, 11, 1, 0)).await.unwrap();
    settle().await;

    {
        let board = board.read().unwrap();
        let state = board.get(id).unwrap();
        assert_eq!(state.current_minute, 11);
        assert_eq!(state.home_score, 1);
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn redelivered_update_leaves_state_identical() {
    let feed = Arc::new(InMemoryMatchFeed::new());
    let board = shared_board();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = BoardSubscriber::new(
        "test",
        Arc::clone(&feed) as Arc<dyn MatchFeed>,
        MatchFilter::All,
        Arc::clone(&board),
        shutdown_rx,
    )
    .spawn();

    while feed.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let id = MatchId::new();
    let event = live_update(id, 10, 0, 0);
    feed.publish(&event).await.unwrap();
    settle().await;

    let after_first = board.read().unwrap().get(id).cloned();

    // The transport redelivers the exact same event.
    feed.republish(&event);
    settle().await;

    assert_eq!(board.read().unwrap().get(id).cloned(), after_first);
    assert_eq!(
        board.read().unwrap().get(id).map(|s| s.current_minute),
        Some(10)
    );

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn single_match_filter_ignores_other_matches() {
    let feed = Arc::new(InMemoryMatchFeed::new());
    let board = shared_board();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let wanted = MatchId::new();
    let handle = BoardSubscriber::new(
        "match-centre",
        Arc::clone(&feed) as Arc<dyn MatchFeed>,
        MatchFilter::One(wanted),
        Arc::clone(&board),
        shutdown_rx,
    )
    .spawn();

    while feed.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    feed.publish(&live_update(MatchId::new(), 60, 2, 2))
        .await
        .unwrap();
    feed.publish(&live_update(wanted, 15, 0, 1)).await.unwrap();
    settle().await;

    {
        let board = board.read().unwrap();
        assert_eq!(board.len(), 1);
        assert_eq!(board.get(wanted).map(|s| s.away_score), Some(1));
    }

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn shutdown_stops_the_task_promptly() {
    let feed = Arc::new(InMemoryMatchFeed::new());
    let board = shared_board();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = BoardSubscriber::new(
        "test",
        Arc::clone(&feed) as Arc<dyn MatchFeed>,
        MatchFilter::All,
        Arc::clone(&board),
        shutdown_rx,
    )
    .spawn();

    while feed.subscriber_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("subscriber should stop on shutdown")
        .unwrap();
}
