//! In-memory per-user listening history.
//!
//! Each user owns a bounded ring of recently played tracks. The store is a
//! hot, ephemeral signal: nothing survives a restart, and that is acceptable
//! because the offline tables cover the cold path.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::models::{TrackId, UserId};
use crate::services::recommender::HistoryLookup;

/// Per-user bounded event ring, keyed by user ID.
///
/// Same-user mutations serialize on the user's own lock; distinct users land
/// on independent entries and do not contend beyond the map shard.
pub struct EventHistoryStore {
    events: DashMap<UserId, RwLock<VecDeque<TrackId>>>,
    capacity: usize,
    total_events: AtomicU64,
}

impl EventHistoryStore {
    /// Creates a store where each user retains at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: DashMap::new(),
            // A zero cap would make every append a no-op.
            capacity: capacity.max(1),
            total_events: AtomicU64::new(0),
        }
    }

    /// Appends a played track to the user's history, evicting the oldest
    /// entry once the ring is full. Duplicate consecutive tracks are kept;
    /// replays are real events.
    pub fn add_event(&self, user_id: UserId, track_id: TrackId) {
        let ring = self
            .events
            .entry(user_id)
            .or_insert_with(|| RwLock::new(VecDeque::with_capacity(self.capacity)));

        let mut ring = ring.write();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(track_id);
        drop(ring);

        self.total_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the user's `min(n, len)` most recent tracks, most-recent-first.
    /// Unknown users and `n == 0` yield an empty list, never an error.
    pub fn recent_events(&self, user_id: UserId, n: usize) -> Vec<TrackId> {
        if n == 0 {
            return Vec::new();
        }
        match self.events.get(&user_id) {
            Some(ring) => ring.read().iter().rev().take(n).copied().collect(),
            None => Vec::new(),
        }
    }

    /// Number of users with at least one recorded event.
    pub fn user_count(&self) -> usize {
        self.events.len()
    }

    /// Total events accepted since startup (including evicted ones).
    pub fn event_count(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HistoryLookup for EventHistoryStore {
    async fn recent(&self, user_id: UserId, n: usize) -> Vec<TrackId> {
        self.recent_events(user_id, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_is_empty() {
        let store = EventHistoryStore::new(10);
        assert!(store.recent_events(42, 5).is_empty());
    }

    #[test]
    fn test_most_recent_first() {
        let store = EventHistoryStore::new(10);
        for track in [1, 2, 3] {
            store.add_event(7, track);
        }
        assert_eq!(store.recent_events(7, 2), vec![3, 2]);
        assert_eq!(store.recent_events(7, 10), vec![3, 2, 1]);
    }

    #[test]
    fn test_zero_n_clamps_to_empty() {
        let store = EventHistoryStore::new(10);
        store.add_event(7, 1);
        assert!(store.recent_events(7, 0).is_empty());
    }

    #[test]
    fn test_duplicate_consecutive_tracks_kept() {
        let store = EventHistoryStore::new(10);
        store.add_event(7, 5);
        store.add_event(7, 5);
        assert_eq!(store.recent_events(7, 10), vec![5, 5]);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let cap = 4;
        let store = EventHistoryStore::new(cap);
        // cap + 3 inserts; only the last `cap` survive.
        for track in 1..=(cap as u64 + 3) {
            store.add_event(7, track);
        }
        assert_eq!(store.recent_events(7, cap), vec![7, 6, 5, 4]);
        assert_eq!(store.event_count(), cap as u64 + 3);
    }

    #[test]
    fn test_concurrent_writers_distinct_users_stay_isolated() {
        use std::sync::Arc;

        let store = Arc::new(EventHistoryStore::new(64));
        let mut handles = Vec::new();

        for user in 0..4u64 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..50u64 {
                    store.add_event(user, user * 1000 + i);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for user in 0..4u64 {
            let expected: Vec<TrackId> =
                (0..50).rev().map(|i| user * 1000 + i).collect();
            assert_eq!(store.recent_events(user, 50), expected);
        }
        assert_eq!(store.user_count(), 4);
        assert_eq!(store.event_count(), 200);
    }
}
