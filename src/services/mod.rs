pub mod blend;
pub mod catalog;
pub mod history;
pub mod recommender;
pub mod similarity;

pub use catalog::{ArtifactError, CatalogSnapshot, CatalogStore};
pub use history::EventHistoryStore;
pub use recommender::{HistoryLookup, Recommender, SimilarityLookup};
pub use similarity::{SimilarityStore, SimilarityTable};
