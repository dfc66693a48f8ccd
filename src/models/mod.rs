use serde::{Deserialize, Serialize};

/// Opaque user identifier, assigned by the upstream interaction log.
pub type UserId = u64;

/// Opaque track identifier, shared with the offline pipeline's artifacts.
pub type TrackId = u64;

/// A track paired with the similarity score that ranked it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrack {
    pub track_id: TrackId,
    pub score: f32,
}

impl ScoredTrack {
    pub fn new(track_id: TrackId, score: f32) -> Self {
        Self { track_id, score }
    }
}
