//! Precomputed item-item similarity lookup.
//!
//! Backs the online recommendation path: a seed track expands into its
//! nearest neighbors. The table is read-only during serving and replaced
//! wholesale on refresh, same discipline as the catalog.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{ScoredTrack, TrackId};
use crate::services::catalog::{read_records, ArtifactError};
use crate::services::recommender::SimilarityLookup;

/// One row of the similarity export: `track_id_2` is a neighbor of
/// `track_id_1` with the given score.
#[derive(Debug, Deserialize)]
pub struct SimilarityRecord {
    pub track_id_1: TrackId,
    pub track_id_2: TrackId,
    pub score: f32,
}

/// Neighbor lists keyed by seed track, each pre-sorted by descending score
/// with ascending track ID breaking ties.
pub struct SimilarityTable {
    neighbors: HashMap<TrackId, Vec<ScoredTrack>>,
    pair_count: usize,
}

impl SimilarityTable {
    /// Builds the table from raw export rows. Self-similarity pairs are
    /// dropped; duplicate neighbor rows collapse to the best-scored one.
    pub fn from_records(records: Vec<SimilarityRecord>) -> Self {
        let mut neighbors: HashMap<TrackId, Vec<ScoredTrack>> = HashMap::new();

        for record in records {
            if record.track_id_1 == record.track_id_2 {
                continue;
            }
            neighbors
                .entry(record.track_id_1)
                .or_default()
                .push(ScoredTrack::new(record.track_id_2, record.score));
        }

        let mut pair_count = 0;
        for list in neighbors.values_mut() {
            list.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.track_id.cmp(&b.track_id))
            });
            // Duplicates need not be adjacent after the score sort.
            let mut seen = HashSet::new();
            list.retain(|entry| seen.insert(entry.track_id));
            pair_count += list.len();
        }

        Self {
            neighbors,
            pair_count,
        }
    }

    /// Loads the table from its JSON export file.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let records: Vec<SimilarityRecord> = read_records(path)?;
        if records.is_empty() {
            return Err(ArtifactError::Empty(path.display().to_string()));
        }
        Ok(Self::from_records(records))
    }

    fn similar(&self, track_id: TrackId, k: usize) -> Vec<ScoredTrack> {
        match self.neighbors.get(&track_id) {
            Some(list) => list.iter().take(k).copied().collect(),
            None => Vec::new(),
        }
    }

    fn contains_track(&self, track_id: TrackId) -> bool {
        self.neighbors.contains_key(&track_id)
            || self
                .neighbors
                .values()
                .any(|list| list.iter().any(|entry| entry.track_id == track_id))
    }
}

/// Holder publishing `SimilarityTable`s to concurrent readers.
pub struct SimilarityStore {
    table: ArcSwap<SimilarityTable>,
}

impl SimilarityStore {
    pub fn new(table: SimilarityTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Top-`k` neighbors of `track_id`, best first. Unknown tracks yield an
    /// empty list, never an error.
    pub fn similar(&self, track_id: TrackId, k: usize) -> Vec<ScoredTrack> {
        self.table.load().similar(track_id, k)
    }

    /// Whether the track appears in the table, as seed or neighbor.
    pub fn contains_track(&self, track_id: TrackId) -> bool {
        self.table.load().contains_track(track_id)
    }

    /// Number of (seed, neighbor) pairs currently served.
    pub fn pair_count(&self) -> usize {
        self.table.load().pair_count
    }

    /// Publishes a freshly built table.
    pub fn replace(&self, table: SimilarityTable) {
        self.table.store(Arc::new(table));
    }
}

#[async_trait]
impl SimilarityLookup for SimilarityStore {
    async fn similar(&self, track_id: TrackId, k: usize) -> Vec<ScoredTrack> {
        SimilarityStore::similar(self, track_id, k)
    }
}
