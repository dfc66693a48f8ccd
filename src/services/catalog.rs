//! Offline recommendation artifacts: the personal table and the global
//! popularity table, loaded once at startup and refreshed wholesale.
//!
//! The pipeline exports rows in arbitrary order; loaders sort by `rank` so
//! serving is a plain prefix copy. Readers hold one snapshot `Arc` for the
//! whole request, so a concurrent refresh can never mix table generations
//! inside a single response.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{TrackId, UserId};

/// Errors raised while loading pipeline artifacts. Fatal at startup;
/// on background refresh they are logged and the old snapshot is kept.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse artifact file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("artifact contains no rows: {0}")]
    Empty(String),
}

/// One row of the personal recommendation export.
#[derive(Debug, Deserialize)]
pub struct PersonalRecord {
    pub user_id: UserId,
    pub track_id: TrackId,
    pub rank: u32,
}

/// One row of the global popularity export.
#[derive(Debug, Deserialize)]
pub struct PopularRecord {
    pub track_id: TrackId,
    pub rank: u32,
}

/// Reads a JSON artifact file into its row type.
pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ArtifactError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Immutable view over both offline tables.
pub struct CatalogSnapshot {
    personal: HashMap<UserId, Vec<TrackId>>,
    popular: Vec<TrackId>,
    tracks: HashSet<TrackId>,
}

impl CatalogSnapshot {
    /// Builds a snapshot from raw export rows.
    ///
    /// Rows are sorted by `rank`; duplicate track rows within one list
    /// collapse to the best-ranked occurrence so exposed sequences stay
    /// duplicate-free.
    pub fn from_records(
        mut personal: Vec<PersonalRecord>,
        mut popular: Vec<PopularRecord>,
    ) -> Self {
        personal.sort_by(|a, b| a.user_id.cmp(&b.user_id).then(a.rank.cmp(&b.rank)));
        popular.sort_by(|a, b| a.rank.cmp(&b.rank));

        let mut tracks = HashSet::new();

        let mut personal_lists: HashMap<UserId, Vec<TrackId>> = HashMap::new();
        for record in personal {
            tracks.insert(record.track_id);
            let list = personal_lists.entry(record.user_id).or_default();
            if !list.contains(&record.track_id) {
                list.push(record.track_id);
            }
        }

        let mut popular_list = Vec::with_capacity(popular.len());
        let mut seen = HashSet::new();
        for record in popular {
            tracks.insert(record.track_id);
            if seen.insert(record.track_id) {
                popular_list.push(record.track_id);
            }
        }

        Self {
            personal: personal_lists,
            popular: popular_list,
            tracks,
        }
    }

    /// Loads both tables from their JSON export files.
    pub fn load(personal_path: &Path, popular_path: &Path) -> Result<Self, ArtifactError> {
        let personal: Vec<PersonalRecord> = read_records(personal_path)?;
        let popular: Vec<PopularRecord> = read_records(popular_path)?;

        // An empty popularity table would leave cold-start users with nothing.
        if popular.is_empty() {
            return Err(ArtifactError::Empty(popular_path.display().to_string()));
        }

        Ok(Self::from_records(personal, popular))
    }

    /// The user's personal list capped at `k`, or `None` when the user has
    /// no row in the offline table.
    pub fn personal(&self, user_id: UserId, k: usize) -> Option<Vec<TrackId>> {
        self.personal
            .get(&user_id)
            .map(|list| list.iter().take(k).copied().collect())
    }

    /// Top-`k` of the global popularity list.
    pub fn popular(&self, k: usize) -> Vec<TrackId> {
        self.popular.iter().take(k).copied().collect()
    }

    /// Whether the track appears in either offline table.
    pub fn contains_track(&self, track_id: TrackId) -> bool {
        self.tracks.contains(&track_id)
    }

    /// Number of users with a personal row.
    pub fn personal_user_count(&self) -> usize {
        self.personal.len()
    }

    /// Length of the popularity list.
    pub fn popular_len(&self) -> usize {
        self.popular.len()
    }
}

/// Holder publishing `CatalogSnapshot`s to concurrent readers.
pub struct CatalogStore {
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl CatalogStore {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Current snapshot. Callers keep the returned `Arc` for the duration of
    /// one request so a refresh cannot change tables mid-request.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    /// Publishes a freshly built snapshot. In-flight readers continue on the
    /// one they already hold.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }
}
