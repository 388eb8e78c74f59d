use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

use crate::{
    catalog::CatalogStore,
    error::AppError,
    models::AudienceTier,
    services::{
        neighbors::{DistanceMetric, IndexConfig, NeighborIndex},
        similarity,
    },
};

/// Outcome of one index configuration over a set of probe titles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub config: IndexConfig,
    /// Summed similarity of every probe's neighbors to the probe
    pub total_score: f64,
    /// `total_score` divided by the number of probes actually scored
    pub mean_score: f64,
    pub probes_scored: usize,
    /// Probe titles absent from the tier
    pub probes_skipped: usize,
}

/// Every metric crossed with every neighbor count
pub fn metric_grid(neighbor_counts: &[usize]) -> Vec<IndexConfig> {
    DistanceMetric::ALL
        .iter()
        .flat_map(|&metric| {
            neighbor_counts
                .iter()
                .map(move |&neighbors| IndexConfig { metric, neighbors })
        })
        .collect()
}

/// Compares index configurations by how similar their neighbors are to each probe
///
/// For every configuration the tier's index is built, each probe title is queried
/// for the configuration's `neighbors` (the self-match is then dropped) and the
/// similarity score of the rest against the probe is accumulated. Reports come
/// back best first; configurations with equal totals keep their input order.
pub fn evaluate(
    catalog: &CatalogStore,
    tier: AudienceTier,
    configs: &[IndexConfig],
    probe_titles: &[&str],
) -> Vec<EvaluationReport> {
    let mut reports: Vec<EvaluationReport> = configs
        .par_iter()
        .map(|&config| evaluate_config(catalog, tier, config, probe_titles))
        .collect();

    reports.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });

    if let Some(best) = reports.first() {
        tracing::info!(
            tier = %tier,
            metric = %best.config.metric,
            neighbors = best.config.neighbors,
            mean_score = best.mean_score,
            "Best index configuration"
        );
    }

    reports
}

fn evaluate_config(
    catalog: &CatalogStore,
    tier: AudienceTier,
    config: IndexConfig,
    probe_titles: &[&str],
) -> EvaluationReport {
    let index = NeighborIndex::build(catalog, tier, config);
    let mut total_score = 0.0;
    let mut probes_scored = 0;
    let mut probes_skipped = 0;

    for title in probe_titles {
        let reference = match catalog.find_by_title(title, tier) {
            Ok(movie) => movie,
            Err(AppError::NotFound(_)) => {
                probes_skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Probe lookup failed");
                probes_skipped += 1;
                continue;
            }
        };

        let neighbors = match index.kneighbors(reference.id) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Probe query failed");
                probes_skipped += 1;
                continue;
            }
        };

        let candidates: Vec<_> = neighbors
            .iter()
            .skip(1)
            .filter_map(|neighbor| catalog.movie(neighbor.id))
            .collect();

        total_score += similarity::score(reference, &candidates);
        probes_scored += 1;
    }

    let mean_score = if probes_scored > 0 {
        total_score / probes_scored as f64
    } else {
        0.0
    };

    tracing::debug!(
        metric = %config.metric,
        neighbors = config.neighbors,
        total_score,
        probes_scored,
        probes_skipped,
        "Evaluated index configuration"
    );

    EvaluationReport {
        config,
        total_score,
        mean_score,
        probes_scored,
        probes_skipped,
    }
}
