use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::AudienceTier,
    routes::AppState,
    services::evaluation::{self, EvaluationReport},
};

#[derive(Debug, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub age: AudienceTier,
    pub probe_titles: Vec<String>,
    /// Neighbor counts to compare, self included; defaults to the engine's own
    #[serde(default)]
    pub neighbors: Vec<usize>,
}

/// Handler comparing every distance metric on the current catalog
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<EvaluationRequest>,
) -> AppResult<Json<Vec<EvaluationReport>>> {
    if request.probe_titles.is_empty() {
        return Err(AppError::InvalidInput(
            "probe_titles must not be empty".to_string(),
        ));
    }
    // Self plus at least one scored neighbor
    if request.neighbors.iter().any(|&k| k < 2) {
        return Err(AppError::InvalidInput(
            "neighbor counts must be at least 2".to_string(),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        age = %request.age,
        probes = request.probe_titles.len(),
        neighbors = ?request.neighbors,
        "Evaluating index configurations"
    );

    let catalog = state.engine.catalog();
    let neighbor_counts = if request.neighbors.is_empty() {
        vec![state.engine.index_config().neighbors]
    } else {
        request.neighbors
    };

    let reports = tokio::task::spawn_blocking(move || {
        let probes: Vec<&str> = request.probe_titles.iter().map(String::as_str).collect();
        evaluation::evaluate(
            &catalog,
            request.age,
            &evaluation::metric_grid(&neighbor_counts),
            &probes,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(reports))
}
