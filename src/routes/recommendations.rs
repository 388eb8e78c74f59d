use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        AudienceTier, FacetOptions, RecommendationSession, RecommendedMovie, RefineRequest,
        UserChoices,
    },
    routes::AppState,
    services::thumbnails::attach_thumbnails,
};

/// Facet values per row on the refinement form
const GROUP_SIZE: usize = 7;

/// Sessions not refined within this window are dropped
const SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub title: String,
    pub count: usize,
    #[serde(default)]
    pub age: AudienceTier,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub session_id: Uuid,
    pub title: String,
    pub count: usize,
    pub facets: FacetOptions,
    /// `facets.languages` split into display rows
    pub language_rows: Vec<Vec<String>>,
    /// `facets.genres` split into display rows
    pub genre_rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub title: String,
    pub count: usize,
    pub recommended_films: Vec<RecommendedMovie>,
}

fn rows(values: &[String]) -> Vec<Vec<String>> {
    values.chunks(GROUP_SIZE).map(<[String]>::to_vec).collect()
}

/// Handler generating the candidate set for a title and opening a refinement session
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    if request.count == 0 || request.count > state.max_recommendations {
        return Err(AppError::InvalidInput(format!(
            "count must be between 1 and {}",
            state.max_recommendations
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %request.title,
        count = request.count,
        age = %request.age,
        "Processing recommendation request"
    );

    let engine = state.engine.clone();
    let title = request.title.clone();
    let (candidates, facets) = tokio::task::spawn_blocking(move || {
        let candidates = engine.generate(&title, request.count, request.age)?;
        let facets = engine.facet_options(&candidates)?;
        Ok::<_, AppError>((candidates, facets))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let session = RecommendationSession::new(request.title.clone(), request.count, candidates);
    let session_id = session.id;

    {
        let mut sessions = state.sessions.write().await;
        let now = Utc::now();
        let ttl = Duration::minutes(SESSION_TTL_MINUTES);
        sessions.retain(|_, s| !s.is_expired(ttl, now));
        sessions.insert(session_id, session);
    }

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        "Recommendation session opened"
    );

    Ok(Json(RecommendationResponse {
        session_id,
        title: request.title,
        count: request.count,
        language_rows: rows(&facets.languages),
        genre_rows: rows(&facets.genres),
        facets,
    }))
}

/// Handler applying the user's refinement to a session's candidate set
///
/// A successful refinement consumes the session: refining the same id again
/// is `NotFound`. A failed one leaves it in place.
pub async fn refine(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RefineRequest>,
) -> AppResult<Json<RefineResponse>> {
    let unknown_session = || AppError::NotFound(format!("Unknown session {}", session_id));

    let session = state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or_else(unknown_session)?;

    let choices = UserChoices::from(request);

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        languages = choices.languages.len(),
        durations = choices.durations.len(),
        facet = ?choices.facet,
        "Processing refinement request"
    );

    let movies = state
        .engine
        .filter(&session.candidates, &choices, session.count)?;

    // A concurrent refinement of the same session may have won
    state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(unknown_session)?;

    let recommended_films = attach_thumbnails(state.thumbnails.clone(), movies).await;

    tracing::info!(
        request_id = %request_id,
        results = recommended_films.len(),
        "Refinement completed"
    );

    Ok(Json(RefineResponse {
        title: session.title,
        count: session.count,
        recommended_films,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateSet;

    #[test]
    fn test_rows_chunk_by_group_size() {
        let values: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        let grouped = rows(&values);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].len(), 7);
        assert_eq!(grouped[1], vec!["7", "8"]);
    }

    #[test]
    fn test_rows_of_nothing() {
        assert!(rows(&[]).is_empty());
    }

    fn test_state() -> AppState {
        use crate::{
            catalog::{CatalogPaths, CatalogStore},
            models::{fixtures::movie, FeatureVector},
            services::{thumbnails::MockThumbnailProvider, EngineSettings, RecommendationEngine},
        };
        use std::sync::Arc;

        let movies = vec![movie(0, "First"), movie(1, "Second"), movie(2, "Third")];
        let features = (0..3)
            .map(|id| FeatureVector {
                id,
                values: vec![id as f64],
            })
            .collect();
        let catalog = CatalogStore::from_parts(movies, features).unwrap();
        let engine = RecommendationEngine::new(catalog, EngineSettings::default());

        let mut thumbnails = MockThumbnailProvider::new();
        thumbnails
            .expect_thumbnail_url()
            .returning(|url| Ok(format!("{}poster.jpg", url)));
        thumbnails.expect_name().return_const("mock");

        AppState::new(
            Arc::new(engine),
            Arc::new(thumbnails),
            CatalogPaths::new("movies.csv", "features.csv"),
            10,
        )
    }

    async fn open(state: &AppState, candidates: CandidateSet) -> Uuid {
        let session = RecommendationSession::new("First".to_string(), 1, candidates);
        let id = session.id;
        state.sessions.write().await.insert(id, session);
        id
    }

    fn request_id() -> Extension<RequestId> {
        Extension(RequestId(Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_failed_refine_keeps_session() {
        let state = test_state();
        let stale = CandidateSet {
            generation: 3,
            ids: vec![1, 2],
        };
        let session_id = open(&state, stale).await;

        let result = refine(
            State(state.clone()),
            request_id(),
            Path(session_id),
            Json(RefineRequest::default()),
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(state.sessions.read().await.contains_key(&session_id));
    }

    #[tokio::test]
    async fn test_successful_refine_consumes_session() {
        let state = test_state();
        let candidates = CandidateSet {
            generation: 0,
            ids: vec![2, 1],
        };
        let session_id = open(&state, candidates).await;

        let Json(response) = refine(
            State(state.clone()),
            request_id(),
            Path(session_id),
            Json(RefineRequest::default()),
        )
        .await
        .unwrap();

        assert_eq!(response.recommended_films.len(), 1);
        assert_eq!(response.recommended_films[0].title, "Third");
        assert!(!state.sessions.read().await.contains_key(&session_id));
    }
}
