use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    models::{AudienceTier, Autocomplete, TitlesByTier},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    age: AudienceTier,
}

/// Handler listing the sorted titles of every audience tier
pub async fn titles_by_tier(State(state): State<AppState>) -> Json<TitlesByTier> {
    Json(state.engine.titles_by_tier())
}

/// Handler for title/actor/director autocomplete data of one tier
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<AutocompleteQuery>,
) -> Json<Autocomplete> {
    Json(state.engine.autocomplete(params.age))
}
