use serde::Deserialize;

use crate::services::neighbors::DistanceMetric;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path of the movie metadata CSV
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Path of the precomputed feature table CSV (first column is the movie id)
    #[serde(default = "default_features_path")]
    pub features_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Distance metric used by the neighbor index
    #[serde(default)]
    pub neighbor_metric: DistanceMetric,

    /// Candidate pool size as a multiple of the requested count
    #[serde(default = "default_oversampling")]
    pub oversampling: usize,

    /// Upper bound on the number of recommendations a single request may ask for
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Timeout for a single thumbnail lookup
    #[serde(default = "default_thumbnail_timeout_secs")]
    pub thumbnail_timeout_secs: u64,
}

fn default_movies_path() -> String {
    "data/movie_metadata.csv".to_string()
}

fn default_features_path() -> String {
    "data/movie_features.csv".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_oversampling() -> usize {
    10
}

fn default_max_recommendations() -> usize {
    50
}

fn default_thumbnail_timeout_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
