use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the personal recommendation table export
    #[serde(default = "default_personal_recs_path")]
    pub personal_recs_path: String,

    /// Path to the global popularity table export
    #[serde(default = "default_popular_recs_path")]
    pub popular_recs_path: String,

    /// Path to the item-item similarity table export
    #[serde(default = "default_similar_tracks_path")]
    pub similar_tracks_path: String,

    /// Maximum events retained per user before FIFO eviction
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// How many recent events seed the online path
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// Default deadline for online candidate assembly, in milliseconds
    #[serde(default = "default_online_deadline_ms")]
    pub online_deadline_ms: u64,

    /// Artifact refresh period in seconds; 0 disables background refresh
    #[serde(default)]
    pub catalog_refresh_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_personal_recs_path() -> String {
    "data/recommendations.json".to_string()
}

fn default_popular_recs_path() -> String {
    "data/top_popular.json".to_string()
}

fn default_similar_tracks_path() -> String {
    "data/similar.json".to_string()
}

fn default_history_capacity() -> usize {
    20
}

fn default_recent_window() -> usize {
    5
}

fn default_online_deadline_ms() -> u64 {
    200
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn online_deadline(&self) -> Duration {
        Duration::from_millis(self.online_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_without_env() {
        let config: Config = envy::from_iter(std::iter::empty::<(String, String)>()).unwrap();
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.recent_window, 5);
        assert_eq!(config.catalog_refresh_secs, 0);
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn test_env_overrides_defaults() {
        let vars = vec![
            ("HISTORY_CAPACITY".to_string(), "7".to_string()),
            ("PORT".to_string(), "9000".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.history_capacity, 7);
        assert_eq!(config.port, 9000);
    }
}
