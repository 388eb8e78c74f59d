use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    routes::AppState,
};

/// Handler re-reading the catalog files and invalidating cached indexes
///
/// Open sessions hold ids of the replaced catalog and are dropped.
pub async fn reload(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Value>> {
    tracing::info!(request_id = %request_id, "Reloading catalog");

    let engine = state.engine.clone();
    let paths = state.catalog_paths.clone();
    let movies = tokio::task::spawn_blocking(move || {
        engine.reload(&paths)?;
        Ok::<_, AppError>(engine.catalog().len())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    let dropped_sessions = {
        let mut sessions = state.sessions.write().await;
        let open = sessions.len();
        sessions.clear();
        open
    };

    tracing::info!(
        request_id = %request_id,
        movies,
        dropped_sessions,
        "Catalog reload completed"
    );

    Ok(Json(json!({ "status": "reloaded", "movies": movies })))
}
