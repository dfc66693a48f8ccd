//! Recommendation orchestrator: offline lookup, online expansion, blending.
//!
//! The orchestrator is stateless per request. It depends on capability
//! traits rather than concrete stores so the blending logic can be tested
//! against in-memory fakes, and a deployment may back either lookup with a
//! network client without touching this module.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{ScoredTrack, TrackId, UserId};
use crate::services::blend;
use crate::services::catalog::CatalogStore;

/// Access to a user's most recent listening events, most-recent-first.
#[async_trait]
pub trait HistoryLookup: Send + Sync {
    async fn recent(&self, user_id: UserId, n: usize) -> Vec<TrackId>;
}

/// Access to a track's nearest neighbors, best first.
#[async_trait]
pub trait SimilarityLookup: Send + Sync {
    async fn similar(&self, track_id: TrackId, k: usize) -> Vec<ScoredTrack>;
}

/// How many requests were served from the personal table vs. the
/// popularity fallback.
#[derive(Debug, Clone, Copy)]
pub struct ServeCounters {
    pub personal: u64,
    pub fallback: u64,
}

pub struct Recommender {
    catalog: Arc<CatalogStore>,
    history: Arc<dyn HistoryLookup>,
    similarity: Arc<dyn SimilarityLookup>,
    recent_window: usize,
    online_deadline: Duration,
    personal_served: AtomicU64,
    fallback_served: AtomicU64,
}

impl Recommender {
    pub fn new(
        catalog: Arc<CatalogStore>,
        history: Arc<dyn HistoryLookup>,
        similarity: Arc<dyn SimilarityLookup>,
        recent_window: usize,
        online_deadline: Duration,
    ) -> Self {
        Self {
            catalog,
            history,
            similarity,
            recent_window: recent_window.max(1),
            online_deadline,
            personal_served: AtomicU64::new(0),
            fallback_served: AtomicU64::new(0),
        }
    }

    /// The user's precomputed list, or the top-`k` popularity list when the
    /// user has no personal row. Never exceeds `k` items.
    pub fn offline(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        if k == 0 {
            return Vec::new();
        }
        let snapshot = self.catalog.snapshot();
        match snapshot.personal(user_id, k) {
            Some(recs) => {
                self.personal_served.fetch_add(1, Ordering::Relaxed);
                recs
            }
            None => {
                self.fallback_served.fetch_add(1, Ordering::Relaxed);
                snapshot.popular(k)
            }
        }
    }

    /// Candidates derived from recent activity: each of the user's last `W`
    /// played tracks expands into its neighbors, in seed recency order.
    /// Seeds themselves are excluded; the concatenation is stable-deduped
    /// and capped at `k`. No recent events means an empty result — the
    /// popularity fallback belongs to the caller, not this path.
    pub async fn online(&self, user_id: UserId, k: usize) -> Vec<TrackId> {
        if k == 0 {
            return Vec::new();
        }
        let seeds = self.history.recent(user_id, self.recent_window).await;
        if seeds.is_empty() {
            return Vec::new();
        }

        let seed_set: HashSet<TrackId> = seeds.iter().copied().collect();
        let mut candidates = Vec::new();
        for seed in &seeds {
            for neighbor in self.similarity.similar(*seed, k).await {
                if !seed_set.contains(&neighbor.track_id) {
                    candidates.push(neighbor.track_id);
                }
            }
        }

        blend::take_prefix(blend::dedup_stable(candidates), k)
    }

    /// The blended endpoint: interleave online-first with the offline list,
    /// stable-dedup, cap at `k`. With no online signal the offline list is
    /// returned as-is.
    ///
    /// Online assembly runs under `deadline` (the configured default when
    /// the caller supplies none). On expiry the offline-only result is a
    /// valid degraded response, so the request still succeeds.
    pub async fn blended(
        &self,
        user_id: UserId,
        k: usize,
        deadline: Option<Duration>,
    ) -> Vec<TrackId> {
        let offline = self.offline(user_id, k);

        let budget = deadline.unwrap_or(self.online_deadline);
        let online = match tokio::time::timeout(budget, self.online(user_id, k)).await {
            Ok(recs) => recs,
            Err(_) => {
                tracing::warn!(
                    user_id,
                    deadline_ms = budget.as_millis() as u64,
                    "online candidate assembly timed out, serving offline only"
                );
                Vec::new()
            }
        };

        if online.is_empty() {
            return offline;
        }
        blend::merge(&online, &offline, k)
    }

    pub fn serve_counters(&self) -> ServeCounters {
        ServeCounters {
            personal: self.personal_served.load(Ordering::Relaxed),
            fallback: self.fallback_served.load(Ordering::Relaxed),
        }
    }
}
