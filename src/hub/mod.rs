// SPDX-License-Identifier: MIT

//! Per-race pub/sub fan-out to live feed subscribers.
//!
//! Delivery is best-effort: there is no queue for disconnected viewers, and a
//! slow subscriber is bounded by a send timeout and then evicted so it can
//! never stall the rest of the race's fan-out.

use crate::models::FeedEvent;
use crate::services::SnapshotService;
use crate::store::StoreError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffered events per subscriber before sends start hitting the timeout.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

/// Identifies one subscription; returned by `subscribe`, consumed by
/// `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionHandle {
    race_id: u64,
    id: u64,
}

struct Subscriber {
    tx: mpsc::Sender<FeedEvent>,
    heartbeat: JoinHandle<()>,
}

/// Maintains per-race subscriber registries and fans events out to them.
pub struct BroadcastHub {
    races: DashMap<u64, DashMap<u64, Subscriber>>,
    next_id: AtomicU64,
    snapshots: Arc<SnapshotService>,
    heartbeat_interval: Duration,
    send_timeout: Duration,
}

impl BroadcastHub {
    pub fn new(
        snapshots: Arc<SnapshotService>,
        heartbeat_interval: Duration,
        send_timeout: Duration,
    ) -> Self {
        Self {
            races: DashMap::new(),
            next_id: AtomicU64::new(0),
            snapshots,
            heartbeat_interval,
            send_timeout,
        }
    }

    /// Register a new subscriber for a race.
    ///
    /// The returned receiver immediately yields a connection confirmation and
    /// the current race snapshot (leaderboard plus latest runner positions),
    /// so a fresh viewer is never blank. A periodic ping keeps idle
    /// connections alive through intermediate infrastructure.
    pub async fn subscribe(
        &self,
        race_id: u64,
    ) -> Result<(SubscriptionHandle, mpsc::Receiver<FeedEvent>), StoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = SubscriptionHandle { race_id, id };

        // Initial synchronization before the subscriber can see live events.
        let mut initial = vec![FeedEvent::Info {
            message: format!("Connected to race {}", race_id),
        }];
        initial.extend(self.snapshots.feed_snapshot(race_id)?);
        for event in initial {
            // Capacity is larger than any realistic snapshot; a failure here
            // means the receiver is already gone.
            if tx.send(event).await.is_err() {
                return Ok((handle, rx));
            }
        }

        let heartbeat = spawn_heartbeat(tx.clone(), self.heartbeat_interval);
        self.races
            .entry(race_id)
            .or_default()
            .insert(id, Subscriber { tx, heartbeat });

        tracing::debug!(race_id, subscription = id, "Subscriber connected");
        Ok((handle, rx))
    }

    /// Deliver an event to every current subscriber of a race.
    ///
    /// Fan-out is independent per subscriber: a failed or timed-out delivery
    /// evicts that subscriber and never blocks the others. Failures stay
    /// contained here; callers cannot observe them.
    pub async fn publish(&self, race_id: u64, event: FeedEvent) {
        // Snapshot the senders so no registry lock is held across await.
        let targets: Vec<(u64, mpsc::Sender<FeedEvent>)> = match self.races.get(&race_id) {
            Some(subscribers) => subscribers
                .iter()
                .map(|entry| (*entry.key(), entry.value().tx.clone()))
                .collect(),
            None => return,
        };

        let send_timeout = self.send_timeout;
        let deliveries = targets.into_iter().map(|(id, tx)| {
            let event = event.clone();
            async move {
                match tokio::time::timeout(send_timeout, tx.send(event)).await {
                    Ok(Ok(())) => None,
                    Ok(Err(_)) | Err(_) => Some(id),
                }
            }
        });

        let failed: Vec<u64> = futures_util::future::join_all(deliveries)
            .await
            .into_iter()
            .flatten()
            .collect();

        for id in failed {
            tracing::warn!(race_id, subscription = id, "Delivery failed, evicting subscriber");
            self.remove_subscriber(race_id, id);
        }
    }

    /// Remove a subscription. Idempotent; the heartbeat task is cancelled on
    /// the first call and later calls are no-ops.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) {
        self.remove_subscriber(handle.race_id, handle.id);
    }

    /// Re-send the race snapshot to one subscriber (client `get_last`).
    pub async fn resend_snapshot(&self, handle: &SubscriptionHandle) -> Result<(), StoreError> {
        let tx = self
            .races
            .get(&handle.race_id)
            .and_then(|subs| subs.get(&handle.id).map(|s| s.tx.clone()));
        let Some(tx) = tx else { return Ok(()) };

        for event in self.snapshots.feed_snapshot(handle.race_id)? {
            if tx.send(event).await.is_err() {
                break;
            }
        }
        Ok(())
    }

    pub fn subscriber_count(&self, race_id: u64) -> usize {
        self.races.get(&race_id).map(|subs| subs.len()).unwrap_or(0)
    }

    fn remove_subscriber(&self, race_id: u64, id: u64) {
        let removed = self
            .races
            .get(&race_id)
            .and_then(|subs| subs.remove(&id));
        if let Some((_, subscriber)) = removed {
            subscriber.heartbeat.abort();
            tracing::debug!(race_id, subscription = id, "Subscriber removed");
        }
        // Drop empty race groups so the map does not grow with finished races.
        self.races
            .remove_if(&race_id, |_, subscribers| subscribers.is_empty());
    }
}

/// One-way liveness pings; the transport's own disconnect signal (not a
/// missing ack) is what triggers cleanup.
fn spawn_heartbeat(tx: mpsc::Sender<FeedEvent>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick is immediate
        loop {
            ticker.tick().await;
            if tx.send(FeedEvent::Ping).await.is_err() {
                break;
            }
        }
    })
}
