use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MovieId;

/// Neighbor ids in distance order, tagged with the catalog snapshot they index into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    /// Reload counter of the snapshot that produced `ids`
    pub generation: u64,
    pub ids: Vec<MovieId>,
}

/// State kept between the first recommendation request and its refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSession {
    pub id: Uuid,
    /// Title the user asked recommendations for
    pub title: String,
    /// Number of recommendations requested
    pub count: usize,
    /// Oversampled neighbors of the title
    pub candidates: CandidateSet,
    pub created_at: DateTime<Utc>,
}

impl RecommendationSession {
    pub fn new(title: String, count: usize, candidates: CandidateSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            count,
            candidates,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }
}
