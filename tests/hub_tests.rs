// SPDX-License-Identifier: MIT

//! BroadcastHub fan-out and subscription lifecycle tests.

use race_tracker::models::{Coordinate, FeedEvent};
use std::time::Duration;

mod common;

#[tokio::test]
async fn test_subscribe_empty_race_gets_info_and_empty_snapshot() {
    let state = common::create_test_state();

    let (_handle, mut rx) = state.hub.subscribe(1).await.unwrap();

    match rx.recv().await.unwrap() {
        FeedEvent::Info { message } => assert!(message.contains("race 1")),
        other => panic!("expected info event, got {:?}", other),
    }
    match rx.recv().await.unwrap() {
        FeedEvent::LeaderboardSnapshot { entries } => assert!(entries.is_empty()),
        other => panic!("expected leaderboard snapshot, got {:?}", other),
    }
    // no tracking points yet: no runner positions follow
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_subscribe_after_ingestion_gets_populated_snapshot() {
    let state = common::create_test_state();
    state
        .ingestion
        .ingest(
            1,
            101,
            Coordinate::new(31.5204, 74.3587),
            Some(common::ts(0)),
        )
        .await
        .unwrap();

    let (_handle, mut rx) = state.hub.subscribe(1).await.unwrap();

    let mut saw_snapshot = false;
    let mut saw_position = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            FeedEvent::LeaderboardSnapshot { entries } => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].runner_id, 101);
                saw_snapshot = true;
            }
            FeedEvent::RaceUpdate(update) => {
                assert_eq!(update.runner_id, 101);
                assert_eq!(update.latitude, 31.5204);
                saw_position = true;
            }
            _ => {}
        }
    }
    assert!(saw_snapshot && saw_position);
}

#[tokio::test]
async fn test_fan_out_isolation_on_failed_delivery() {
    let state = common::create_test_state();

    let (_h1, mut rx1) = state.hub.subscribe(1).await.unwrap();
    let (_h2, rx2) = state.hub.subscribe(1).await.unwrap();
    let (_h3, mut rx3) = state.hub.subscribe(1).await.unwrap();
    assert_eq!(state.hub.subscriber_count(1), 3);

    // drain initial snapshots, then kill one subscriber
    while rx1.try_recv().is_ok() {}
    while rx3.try_recv().is_ok() {}
    drop(rx2);

    state.hub.publish(1, FeedEvent::Ping).await;

    // the dead subscriber was evicted, the others still got the event
    assert!(matches!(rx1.recv().await.unwrap(), FeedEvent::Ping));
    assert!(matches!(rx3.recv().await.unwrap(), FeedEvent::Ping));
    assert_eq!(state.hub.subscriber_count(1), 2);
}

#[tokio::test]
async fn test_slow_subscriber_is_evicted_on_send_timeout() {
    let config = race_tracker::config::Config {
        send_timeout: Duration::from_millis(50),
        ..common::test_config()
    };
    let state = common::create_test_state_with(config);

    // stalled viewer: keeps its receiver open but never reads it
    let (_slow, _slow_rx) = state.hub.subscribe(1).await.unwrap();
    let (_healthy, mut healthy_rx) = state.hub.subscribe(1).await.unwrap();
    assert_eq!(state.hub.subscriber_count(1), 2);

    // publish past the stalled viewer's buffer while the healthy one keeps up
    for _ in 0..70 {
        state.hub.publish(1, FeedEvent::Ping).await;
        let _ = healthy_rx.recv().await;
    }

    // only the stalled subscriber timed out and was evicted
    assert_eq!(state.hub.subscriber_count(1), 1);
    state.hub.publish(1, FeedEvent::Ping).await;
    assert!(healthy_rx.recv().await.is_some());
}

#[tokio::test]
async fn test_publish_to_race_without_subscribers_is_noop() {
    let state = common::create_test_state();
    state.hub.publish(42, FeedEvent::Ping).await;
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let state = common::create_test_state();

    let (handle, _rx) = state.hub.subscribe(1).await.unwrap();
    assert_eq!(state.hub.subscriber_count(1), 1);

    state.hub.unsubscribe(&handle);
    assert_eq!(state.hub.subscriber_count(1), 0);
    state.hub.unsubscribe(&handle);
    assert_eq!(state.hub.subscriber_count(1), 0);
}

#[tokio::test]
async fn test_heartbeat_pings_subscriber() {
    let config = race_tracker::config::Config {
        heartbeat_interval: Duration::from_millis(50),
        ..common::test_config()
    };
    let state = common::create_test_state_with(config);

    let (_handle, mut rx) = state.hub.subscribe(1).await.unwrap();

    let ping = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(FeedEvent::Ping) = rx.recv().await {
                return true;
            }
        }
    })
    .await;
    assert!(ping.unwrap_or(false), "no ping within 2s");
}

#[tokio::test]
async fn test_resend_snapshot_delivers_current_state() {
    let state = common::create_test_state();
    state
        .ingestion
        .ingest(
            1,
            101,
            Coordinate::new(31.5204, 74.3587),
            Some(common::ts(0)),
        )
        .await
        .unwrap();

    let (handle, mut rx) = state.hub.subscribe(1).await.unwrap();
    while rx.try_recv().is_ok() {}

    state.hub.resend_snapshot(&handle).await.unwrap();

    match rx.recv().await.unwrap() {
        FeedEvent::LeaderboardSnapshot { entries } => assert_eq!(entries.len(), 1),
        other => panic!("expected leaderboard snapshot, got {:?}", other),
    }
}
