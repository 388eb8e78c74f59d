use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::{collections::BTreeSet, sync::Arc};

use crate::{
    catalog::{CatalogPaths, CatalogStore},
    error::{AppError, AppResult},
    models::{
        AudienceTier, Autocomplete, CandidateSet, FacetOptions, MovieRecord, TitlesByTier,
        UserChoices,
    },
    services::{
        facets,
        neighbors::{neighbor_count, DistanceMetric, IndexConfig, NeighborIndex, DEFAULT_REQUESTED},
    },
};

/// Tunables of the recommendation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub metric: DistanceMetric,
    /// Candidate pool size as a multiple of the requested count
    pub oversampling: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Manhattan,
            oversampling: 10,
        }
    }
}

/// Catalog snapshot tagged with the reload that produced it
struct Snapshot {
    store: Arc<CatalogStore>,
    generation: u64,
}

struct CachedIndex {
    generation: u64,
    index: Arc<NeighborIndex>,
}

/// Generates candidate sets and refines them against a shared catalog snapshot
///
/// One neighbor index per audience tier is cached and rebuilt only after a reload.
pub struct RecommendationEngine {
    snapshot: RwLock<Snapshot>,
    indexes: DashMap<AudienceTier, CachedIndex>,
    settings: EngineSettings,
}

impl RecommendationEngine {
    pub fn new(catalog: CatalogStore, settings: EngineSettings) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot {
                store: Arc::new(catalog),
                generation: 0,
            }),
            indexes: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Configuration every cached index is built with
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            metric: self.settings.metric,
            neighbors: neighbor_count(DEFAULT_REQUESTED, self.settings.oversampling),
        }
    }

    /// The current catalog snapshot
    pub fn catalog(&self) -> Arc<CatalogStore> {
        self.snapshot.read().store.clone()
    }

    /// The current catalog snapshot with its reload counter, read under one lock
    fn current(&self) -> (Arc<CatalogStore>, u64) {
        let snapshot = self.snapshot.read();
        (snapshot.store.clone(), snapshot.generation)
    }

    /// The snapshot `candidates` were drawn from, if it is still the current one
    fn catalog_for(&self, candidates: &CandidateSet) -> AppResult<Arc<CatalogStore>> {
        let (store, generation) = self.current();
        if generation != candidates.generation {
            return Err(AppError::NotFound(format!(
                "Candidate set belongs to catalog generation {}, current is {}",
                candidates.generation, generation
            )));
        }
        Ok(store)
    }

    /// Re-reads the catalog files and swaps the snapshot in; the previous
    /// snapshot stays active if loading fails
    pub fn reload(&self, paths: &CatalogPaths) -> AppResult<()> {
        let store = CatalogStore::load(paths)?;
        let movies = store.len();

        {
            let mut snapshot = self.snapshot.write();
            snapshot.store = Arc::new(store);
            snapshot.generation += 1;
        }
        self.indexes.clear();

        tracing::info!(movies, "Catalog reloaded, index cache cleared");
        Ok(())
    }

    /// The neighbor index of `tier`, built on first use
    pub fn index_for(&self, tier: AudienceTier) -> Arc<NeighborIndex> {
        let (store, generation) = self.current();
        self.index_for_snapshot(tier, &store, generation)
    }

    /// The index of `tier` over `store`; cached only while `generation` is current
    fn index_for_snapshot(
        &self,
        tier: AudienceTier,
        store: &CatalogStore,
        generation: u64,
    ) -> Arc<NeighborIndex> {
        if let Some(cached) = self.indexes.get(&tier) {
            if cached.generation == generation {
                return cached.index.clone();
            }
        }

        let index = Arc::new(NeighborIndex::build(store, tier, self.index_config()));

        // A build racing a reload must not overwrite the newer index
        let mut entry = self.indexes.entry(tier).or_insert_with(|| CachedIndex {
            generation,
            index: index.clone(),
        });
        if entry.generation < generation {
            *entry = CachedIndex {
                generation,
                index: index.clone(),
            };
        }

        index
    }

    /// Builds every tier's index in parallel
    pub fn warm_up(&self) {
        AudienceTier::ALL.par_iter().for_each(|&tier| {
            self.index_for(tier);
        });
    }

    /// Candidate ids for `count` recommendations similar to `title`, closest first
    ///
    /// The pool is oversampled so refinement has material to filter; the
    /// query movie itself is excluded.
    pub fn generate(
        &self,
        title: &str,
        count: usize,
        tier: AudienceTier,
    ) -> AppResult<CandidateSet> {
        if count == 0 {
            return Err(AppError::InvalidInput(
                "Number of recommendations must be positive".to_string(),
            ));
        }

        let (catalog, generation) = self.current();
        let reference = catalog.find_by_title(title, tier)?;
        let index = self.index_for_snapshot(tier, &catalog, generation);

        let k = neighbor_count(count, self.settings.oversampling);
        let ids: Vec<_> = index
            .query(reference.id, k)?
            .into_iter()
            .skip(1)
            .map(|neighbor| neighbor.id)
            .collect();

        tracing::info!(
            title = %reference.title,
            movie_id = reference.id,
            tier = %tier,
            count,
            generation,
            candidates = ids.len(),
            "Generated candidate set"
        );

        Ok(CandidateSet { generation, ids })
    }

    /// Applies the user's refinement to a candidate set and keeps the top `count`
    ///
    /// A set generated before the last reload is `NotFound`: its ids index
    /// into a catalog that is no longer loaded.
    pub fn filter(
        &self,
        candidate_set: &CandidateSet,
        choices: &UserChoices,
        count: usize,
    ) -> AppResult<Vec<MovieRecord>> {
        let candidates = self
            .catalog_for(candidate_set)?
            .load_by_ids(&candidate_set.ids)?;
        let total = candidates.len();
        let results = facets::apply(candidates, choices, count);

        tracing::info!(
            candidates = total,
            results = results.len(),
            "Refined recommendations"
        );

        Ok(results)
    }

    /// Facet values present in a candidate set, for the refinement form
    pub fn facet_options(&self, candidate_set: &CandidateSet) -> AppResult<FacetOptions> {
        let candidates = self
            .catalog_for(candidate_set)?
            .load_by_ids(&candidate_set.ids)?;
        Ok(facet_options(&candidates))
    }

    /// Sorted distinct titles, primary actors and directors of a tier
    pub fn autocomplete(&self, tier: AudienceTier) -> Autocomplete {
        let catalog = self.catalog();
        let movies = catalog.movies_for_tier(tier);

        Autocomplete {
            titles: sorted_distinct(movies.iter().map(|m| m.title.as_str())),
            actors: sorted_distinct(movies.iter().map(|m| m.actor_1_name.as_str())),
            directors: sorted_distinct(movies.iter().map(|m| m.director_name.as_str())),
        }
    }

    pub fn titles_by_tier(&self) -> TitlesByTier {
        let catalog = self.catalog();
        let titles = |tier: AudienceTier| {
            sorted_distinct(
                catalog
                    .movies_for_tier(tier)
                    .iter()
                    .map(|m| m.title.as_str()),
            )
        };

        TitlesByTier {
            adult: titles(AudienceTier::Adult),
            teenager: titles(AudienceTier::Teenager),
            child: titles(AudienceTier::Child),
        }
    }
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct values in first-seen order, empty strings dropped
fn distinct_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect()
}

pub fn facet_options(candidates: &[MovieRecord]) -> FacetOptions {
    FacetOptions {
        languages: distinct_in_order(candidates.iter().map(|m| m.language.as_str())),
        genres: distinct_in_order(candidates.iter().flat_map(|m| m.genre_list())),
        actors: distinct_in_order(candidates.iter().map(|m| m.actor_1_name.as_str())),
        directors: distinct_in_order(candidates.iter().map(|m| m.director_name.as_str())),
    }
}
