use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    models::{AudienceTier, FeatureVector, MovieId, MovieRecord},
    services::age_filter::filter_by_age,
};

use super::loader::{load_feature_table, load_movies};

/// Locations of the two catalog tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub movies: PathBuf,
    pub features: PathBuf,
}

impl CatalogPaths {
    pub fn new(movies: impl Into<PathBuf>, features: impl Into<PathBuf>) -> Self {
        Self {
            movies: movies.into(),
            features: features.into(),
        }
    }
}

/// Immutable snapshot of the movie metadata and feature tables
///
/// Both tables are validated against each other when the snapshot is built,
/// so every movie is guaranteed to have exactly one feature vector of the
/// catalog-wide dimension.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    movies: Vec<MovieRecord>,
    /// Indexed by movie id
    features: Vec<Vec<f64>>,
    dimension: usize,
}

impl CatalogStore {
    /// Loads and validates both tables from disk
    pub fn load(paths: &CatalogPaths) -> AppResult<Self> {
        let movies = load_movies(&paths.movies)?;
        let features = load_feature_table(&paths.features)?;
        let store = Self::from_parts(movies, features)?;

        tracing::info!(
            movies = store.len(),
            dimension = store.dimension(),
            "Catalog snapshot ready"
        );

        Ok(store)
    }

    /// Builds a snapshot from already-parsed tables
    pub fn from_parts(movies: Vec<MovieRecord>, features: Vec<FeatureVector>) -> AppResult<Self> {
        if let Some((position, movie)) = movies.iter().enumerate().find(|(i, m)| m.id != *i) {
            return Err(AppError::DataIntegrity(format!(
                "Movie '{}' at row {} carries id {}",
                movie.title, position, movie.id
            )));
        }

        let dimension = features.first().map(|f| f.values.len()).unwrap_or(0);
        if !movies.is_empty() && dimension == 0 {
            return Err(AppError::DataIntegrity(
                "Feature table has no feature columns".to_string(),
            ));
        }

        let mut aligned: Vec<Option<Vec<f64>>> = vec![None; movies.len()];
        for feature in features {
            if feature.values.len() != dimension {
                return Err(AppError::DataIntegrity(format!(
                    "Feature vector for id {} has {} values, expected {}",
                    feature.id,
                    feature.values.len(),
                    dimension
                )));
            }

            let slot = aligned.get_mut(feature.id).ok_or_else(|| {
                AppError::DataIntegrity(format!(
                    "Feature table references unknown movie id {}",
                    feature.id
                ))
            })?;

            if slot.is_some() {
                return Err(AppError::DataIntegrity(format!(
                    "Feature table has duplicate rows for movie id {}",
                    feature.id
                )));
            }
            *slot = Some(feature.values);
        }

        let features = aligned
            .into_iter()
            .enumerate()
            .map(|(id, values)| {
                values.ok_or_else(|| {
                    AppError::DataIntegrity(format!("Movie id {} has no feature vector", id))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            movies,
            features,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn movie(&self, id: MovieId) -> Option<&MovieRecord> {
        self.movies.get(id)
    }

    pub fn features(&self, id: MovieId) -> Option<&[f64]> {
        self.features.get(id).map(Vec::as_slice)
    }

    /// Movies visible in `tier`, in catalog order
    pub fn movies_for_tier(&self, tier: AudienceTier) -> Vec<&MovieRecord> {
        filter_by_age(&self.movies, tier)
    }

    /// First movie of `tier` whose title matches exactly
    pub fn find_by_title(&self, title: &str, tier: AudienceTier) -> AppResult<&MovieRecord> {
        let title = title.trim();
        self.movies
            .iter()
            .find(|m| m.title == title && tier.admits(&m.age_category))
            .ok_or_else(|| AppError::NotFound(format!("Movie '{}' is not recognized", title)))
    }

    /// Rows for `ids`, in the order given
    pub fn load_by_ids(&self, ids: &[MovieId]) -> AppResult<Vec<MovieRecord>> {
        ids.iter()
            .map(|&id| {
                self.movie(id)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(format!("Movie id {} is not in the catalog", id)))
            })
            .collect()
    }
}
