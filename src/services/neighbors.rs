use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::HashMap, fmt::Display, time::Instant};

use crate::{
    catalog::CatalogStore,
    error::{AppError, AppResult},
    models::{AudienceTier, MovieId},
};

/// Distance used to compare feature vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// L1 distance; the tuned default
    #[default]
    Manhattan,
    Euclidean,
    Chebyshev,
    /// `1 - cosine similarity`
    Cosine,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 4] = [
        DistanceMetric::Manhattan,
        DistanceMetric::Euclidean,
        DistanceMetric::Chebyshev,
        DistanceMetric::Cosine,
    ];

    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let pairs = a.iter().zip(b);
        match self {
            DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Euclidean => pairs.map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt(),
            DistanceMetric::Chebyshev => pairs.map(|(x, y)| (x - y).abs()).fold(0.0, f64::max),
            DistanceMetric::Cosine => {
                let (dot, norm_a, norm_b) = pairs.fold((0.0, 0.0, 0.0), |(d, na, nb), (x, y)| {
                    (d + x * y, na + x * x, nb + y * y)
                });
                if norm_a == 0.0 || norm_b == 0.0 {
                    // Zero vectors have no direction
                    return if norm_a == norm_b { 0.0 } else { 1.0 };
                }
                (1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())).max(0.0)
            }
        }
    }
}

impl Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Manhattan => write!(f, "manhattan"),
            DistanceMetric::Euclidean => write!(f, "euclidean"),
            DistanceMetric::Chebyshev => write!(f, "chebyshev"),
            DistanceMetric::Cosine => write!(f, "cosine"),
        }
    }
}

/// Recommendation count the default index configuration is sized for
pub const DEFAULT_REQUESTED: usize = 5;

/// Index hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub metric: DistanceMetric,
    /// Neighbors returned by [`NeighborIndex::kneighbors`], self included; the
    /// pool the similarity evaluation scores
    pub neighbors: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Manhattan,
            neighbors: neighbor_count(DEFAULT_REQUESTED, 10),
        }
    }
}

/// Neighbors to request for `requested` recommendations: the oversampled
/// candidate pool plus the query movie itself
pub fn neighbor_count(requested: usize, oversampling: usize) -> usize {
    requested * oversampling + 1
}

/// One query result
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: MovieId,
    pub distance: f64,
}

/// Brute-force nearest-neighbor structure over the feature vectors of one audience tier
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    tier: AudienceTier,
    config: IndexConfig,
    ids: Vec<MovieId>,
    vectors: Vec<Vec<f64>>,
    positions: HashMap<MovieId, usize>,
}

impl NeighborIndex {
    /// Builds the index over the movies of `tier`
    pub fn build(catalog: &CatalogStore, tier: AudienceTier, config: IndexConfig) -> Self {
        let start = Instant::now();

        let (ids, vectors): (Vec<MovieId>, Vec<Vec<f64>>) = catalog
            .movies_for_tier(tier)
            .into_iter()
            .filter_map(|movie| {
                catalog
                    .features(movie.id)
                    .map(|values| (movie.id, values.to_vec()))
            })
            .unzip();

        let positions = ids.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();

        tracing::info!(
            tier = %tier,
            metric = %config.metric,
            rows = ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Neighbor index built"
        );

        Self {
            tier,
            config,
            ids,
            vectors,
            positions,
        }
    }

    pub fn tier(&self) -> AudienceTier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The `k` nearest movies to `movie_id`, closest first
    ///
    /// The query movie itself is always the first entry with distance 0;
    /// callers drop it to exclude the self-match. Equal distances are
    /// ordered by ascending id.
    pub fn query(&self, movie_id: MovieId, k: usize) -> AppResult<Vec<Neighbor>> {
        let &position = self.positions.get(&movie_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Movie id {} is not available for the {} audience",
                movie_id, self.tier
            ))
        })?;

        let query = &self.vectors[position];
        let metric = self.config.metric;

        let mut neighbors: Vec<Neighbor> = self
            .ids
            .par_iter()
            .zip(self.vectors.par_iter())
            .map(|(&id, vector)| Neighbor {
                id,
                distance: if id == movie_id {
                    0.0
                } else {
                    metric.distance(query, vector)
                },
            })
            .collect();

        neighbors.sort_by(|a, b| {
            (b.id == movie_id)
                .cmp(&(a.id == movie_id))
                .then_with(|| by_distance(a, b))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }

    /// Query with the configured neighbor count
    pub fn kneighbors(&self, movie_id: MovieId) -> AppResult<Vec<Neighbor>> {
        self.query(movie_id, self.config.neighbors)
    }
}

fn by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures::movie, AgeCategory, FeatureVector};

    fn catalog() -> CatalogStore {
        let rows: Vec<(&str, &str, Vec<f64>)> = vec![
            ("Origin", "adult", vec![0.0, 0.0]),
            ("Near", "child", vec![1.0, 0.0]),
            ("Mid", "teenager", vec![1.0, 2.0]),
            ("Far", "unknown", vec![5.0, 5.0]),
            ("Twin", "adult", vec![1.0, 0.0]),
        ];

        let movies = rows
            .iter()
            .enumerate()
            .map(|(id, (title, label, _))| {
                let mut m = movie(id, title);
                m.age_category = AgeCategory::from(label.to_string());
                m
            })
            .collect();
        let features = rows
            .into_iter()
            .enumerate()
            .map(|(id, (_, _, values))| FeatureVector { id, values })
            .collect();

        CatalogStore::from_parts(movies, features).unwrap()
    }

    fn ids(neighbors: &[Neighbor]) -> Vec<MovieId> {
        neighbors.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_manhattan_distance() {
        let d = DistanceMetric::Manhattan.distance(&[0.0, 0.0], &[1.0, -2.0]);
        assert_eq!(d, 3.0);
    }

    #[test]
    fn test_euclidean_and_chebyshev_distance() {
        assert_eq!(DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(DistanceMetric::Chebyshev.distance(&[0.0, 0.0], &[3.0, -4.0]), 4.0);
    }

    #[test]
    fn test_cosine_distance() {
        let d = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 2.0]);
        assert!((d - 1.0).abs() < 1e-12);
        assert_eq!(DistanceMetric::Cosine.distance(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_query_returns_self_first() {
        let index = NeighborIndex::build(&catalog(), AudienceTier::Adult, IndexConfig::default());
        for id in 0..5 {
            let neighbors = index.query(id, 3).unwrap();
            assert_eq!(neighbors[0], Neighbor { id, distance: 0.0 });
        }
    }

    #[test]
    fn test_self_first_even_with_identical_vector() {
        let index = NeighborIndex::build(&catalog(), AudienceTier::Adult, IndexConfig::default());
        // "Near" and "Twin" share a vector
        assert_eq!(ids(&index.query(4, 2).unwrap()), vec![4, 1]);
        assert_eq!(ids(&index.query(1, 2).unwrap()), vec![1, 4]);
    }

    #[test]
    fn test_query_sorted_by_distance() {
        let index = NeighborIndex::build(&catalog(), AudienceTier::Adult, IndexConfig::default());
        let neighbors = index.query(0, 5).unwrap();
        assert_eq!(ids(&neighbors), vec![0, 1, 4, 2, 3]);
        assert!(neighbors.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_query_restricted_to_tier() {
        let index = NeighborIndex::build(&catalog(), AudienceTier::Child, IndexConfig::default());
        assert_eq!(index.len(), 2);
        assert_eq!(ids(&index.query(1, 10).unwrap()), vec![1, 3]);
        assert!(matches!(index.query(0, 3), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_query_is_deterministic() {
        let store = catalog();
        let index = NeighborIndex::build(&store, AudienceTier::Adult, IndexConfig::default());
        let first = index.query(2, 4).unwrap();
        let rebuilt = NeighborIndex::build(&store, AudienceTier::Adult, IndexConfig::default());
        assert_eq!(first, index.query(2, 4).unwrap());
        assert_eq!(first, rebuilt.query(2, 4).unwrap());
    }

    #[test]
    fn test_kneighbors_uses_configured_count() {
        let config = IndexConfig {
            metric: DistanceMetric::Euclidean,
            neighbors: 2,
        };
        let index = NeighborIndex::build(&catalog(), AudienceTier::Adult, config);
        assert_eq!(index.kneighbors(0).unwrap().len(), 2);
    }

    #[test]
    fn test_neighbor_count() {
        assert_eq!(neighbor_count(5, 10), 51);
        assert_eq!(neighbor_count(1, 10), 11);
    }

    #[test]
    fn test_distance_ties_break_on_id() {
        let a = Neighbor { id: 3, distance: 1.0 };
        let b = Neighbor { id: 1, distance: 1.0 };
        assert_eq!(by_distance(&a, &b), Ordering::Greater);
    }
}
