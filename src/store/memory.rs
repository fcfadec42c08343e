// SPDX-License-Identifier: MIT

//! In-memory track store for single-instance deployments.

use super::{StoreError, TrackStore};
use crate::models::{Coordinate, PointId, TrackingPoint};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// DashMap-backed store keyed by (race_id, runner_id). Appends for different
/// keys proceed independently; out-of-order delivery is accepted and sorted
/// on read, with the global point-id sequence breaking timestamp ties.
#[derive(Default)]
pub struct MemoryTrackStore {
    tracks: DashMap<(u64, u64), Vec<TrackingPoint>>,
    next_id: AtomicU64,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_track(points: &mut [TrackingPoint]) {
    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}

impl TrackStore for MemoryTrackStore {
    fn append(
        &self,
        runner_id: u64,
        race_id: u64,
        coord: Coordinate,
        timestamp: DateTime<Utc>,
    ) -> Result<PointId, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.tracks
            .entry((race_id, runner_id))
            .or_default()
            .push(TrackingPoint {
                id,
                runner_id,
                race_id,
                coord,
                timestamp,
            });
        Ok(id)
    }

    fn last_point(&self, runner_id: u64, race_id: u64) -> Result<Option<TrackingPoint>, StoreError> {
        Ok(self.tracks.get(&(race_id, runner_id)).and_then(|track| {
            track
                .iter()
                .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
                .cloned()
        }))
    }

    fn points(&self, runner_id: u64, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        let mut points = self
            .tracks
            .get(&(race_id, runner_id))
            .map(|track| track.clone())
            .unwrap_or_default();
        sort_track(&mut points);
        Ok(points)
    }

    fn latest_per_runner(&self, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        let mut latest: Vec<TrackingPoint> = self
            .tracks
            .iter()
            .filter(|entry| entry.key().0 == race_id)
            .filter_map(|entry| {
                entry
                    .value()
                    .iter()
                    .max_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)))
                    .cloned()
            })
            .collect();
        latest.sort_by_key(|p| p.runner_id);
        Ok(latest)
    }

    fn drain_race(&self, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        let keys: Vec<(u64, u64)> = self
            .tracks
            .iter()
            .map(|entry| *entry.key())
            .filter(|key| key.0 == race_id)
            .collect();

        let mut drained = Vec::new();
        for key in keys {
            if let Some((_, mut points)) = self.tracks.remove(&key) {
                drained.append(&mut points);
            }
        }
        sort_track(&mut drained);
        Ok(drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn coord(lat: f64) -> Coordinate {
        Coordinate::new(lat, 74.0)
    }

    #[test]
    fn test_append_and_read_in_order() {
        let store = MemoryTrackStore::new();
        store.append(101, 1, coord(31.0), ts(0)).unwrap();
        store.append(101, 1, coord(31.1), ts(10)).unwrap();

        let points = store.points(101, 1).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].coord.latitude, 31.0);
        assert_eq!(points[1].coord.latitude, 31.1);
    }

    #[test]
    fn test_out_of_order_delivery_sorted_on_read() {
        let store = MemoryTrackStore::new();
        store.append(101, 1, coord(31.1), ts(10)).unwrap();
        store.append(101, 1, coord(31.0), ts(0)).unwrap();

        let points = store.points(101, 1).unwrap();
        assert_eq!(points[0].timestamp, ts(0));
        assert_eq!(points[1].timestamp, ts(10));
    }

    #[test]
    fn test_timestamp_ties_break_by_insertion_order() {
        let store = MemoryTrackStore::new();
        let first = store.append(101, 1, coord(31.0), ts(5)).unwrap();
        let second = store.append(101, 1, coord(31.1), ts(5)).unwrap();
        assert!(second > first);

        let points = store.points(101, 1).unwrap();
        assert_eq!(points[0].id, first);
        assert_eq!(points[1].id, second);

        let last = store.last_point(101, 1).unwrap().unwrap();
        assert_eq!(last.id, second);
    }

    #[test]
    fn test_tracks_are_isolated_per_runner_and_race() {
        let store = MemoryTrackStore::new();
        store.append(101, 1, coord(31.0), ts(0)).unwrap();
        store.append(102, 1, coord(32.0), ts(0)).unwrap();
        store.append(101, 2, coord(33.0), ts(0)).unwrap();

        assert_eq!(store.points(101, 1).unwrap().len(), 1);
        assert_eq!(store.points(102, 1).unwrap().len(), 1);
        assert_eq!(store.points(101, 2).unwrap().len(), 1);
        assert_eq!(store.points(103, 1).unwrap().len(), 0);
    }

    #[test]
    fn test_latest_per_runner() {
        let store = MemoryTrackStore::new();
        store.append(101, 1, coord(31.0), ts(0)).unwrap();
        store.append(101, 1, coord(31.5), ts(20)).unwrap();
        store.append(102, 1, coord(32.0), ts(10)).unwrap();

        let latest = store.latest_per_runner(1).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].runner_id, 101);
        assert_eq!(latest[0].coord.latitude, 31.5);
        assert_eq!(latest[1].runner_id, 102);
    }

    #[test]
    fn test_drain_race_removes_all_points() {
        let store = MemoryTrackStore::new();
        store.append(101, 1, coord(31.0), ts(0)).unwrap();
        store.append(102, 1, coord(32.0), ts(5)).unwrap();
        store.append(101, 2, coord(33.0), ts(0)).unwrap();

        let drained = store.drain_race(1).unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(store.points(101, 1).unwrap().len(), 0);
        // other race untouched
        assert_eq!(store.points(101, 2).unwrap().len(), 1);
    }
}
