use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::models::TrackId;
use crate::services::{
    CatalogSnapshot, CatalogStore, EventHistoryStore, Recommender, SimilarityStore,
    SimilarityTable,
};

/// Shared application state
///
/// The stores are owned here and handed to the recommender behind its
/// capability traits. Handlers reach the stores directly for the raw
/// endpoints and go through the recommender for the blended ones.
#[derive(Clone)]
pub struct AppState {
    pub history: Arc<EventHistoryStore>,
    pub catalog: Arc<CatalogStore>,
    pub similarity: Arc<SimilarityStore>,
    pub recommender: Arc<Recommender>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wires the stores and orchestrator from loaded artifacts.
    pub fn new(config: &Config, snapshot: CatalogSnapshot, table: SimilarityTable) -> Self {
        let history = Arc::new(EventHistoryStore::new(config.history_capacity));
        let catalog = Arc::new(CatalogStore::new(snapshot));
        let similarity = Arc::new(SimilarityStore::new(table));

        let recommender = Arc::new(Recommender::new(
            Arc::clone(&catalog),
            history.clone(),
            similarity.clone(),
            config.recent_window,
            config.online_deadline(),
        ));

        Self {
            history,
            catalog,
            similarity,
            recommender,
            started_at: Utc::now(),
        }
    }

    /// A track is valid only if some artifact knows it.
    pub fn is_known_track(&self, track_id: TrackId) -> bool {
        self.catalog.snapshot().contains_track(track_id)
            || self.similarity.contains_track(track_id)
    }
}
