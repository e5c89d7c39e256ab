use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::RecommendationView;
use crate::services::recommendations::{self, DEFAULT_K};

use super::AppState;

/// Largest `k` a single request may ask for
pub const MAX_K: usize = 50;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
    /// Attach OMDb plot and poster to each result
    #[serde(default)]
    pub details: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub title: String,
    pub build_id: Uuid,
    pub recommendations: Vec<RecommendationView>,
}

#[derive(Debug, Serialize)]
pub struct IndexInfoResponse {
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    pub documents: usize,
    pub vocabulary_size: usize,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Describe the loaded index build
pub async fn get_index_info(State(state): State<AppState>) -> Json<IndexInfoResponse> {
    let index = &state.index;
    Json(IndexInfoResponse {
        build_id: index.build_id(),
        built_at: index.built_at(),
        documents: index.len(),
        vocabulary_size: index.model().vocabulary_size(),
    })
}

/// Get all selectable titles, sorted and de-duplicated
pub async fn get_titles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.index.corpus().titles())
}

/// Recommend movies similar to a title
///
/// An unknown title is not an error: it yields an empty list.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if query.title.trim().is_empty() {
        return Err(AppError::InvalidInput("title cannot be empty".to_string()));
    }

    let k = query.k.unwrap_or(DEFAULT_K);
    if k > MAX_K {
        return Err(AppError::InvalidInput(format!(
            "k must be at most {}",
            MAX_K
        )));
    }

    let recs = recommendations::recommend(&state.index, &query.title, k);
    tracing::info!(
        title = %query.title,
        k,
        results = recs.len(),
        "Recommendations computed"
    );

    let recommendations = match (query.details, &state.metadata) {
        (false, _) => recs.into_iter().map(RecommendationView::from).collect(),
        (true, Some(provider)) => recommendations::enrich(provider.clone(), recs).await,
        (true, None) => {
            tracing::warn!("Details requested but no metadata provider is configured");
            recommendations::without_details(recs)
        }
    };

    Ok(Json(RecommendationResponse {
        title: query.title,
        build_id: state.index.build_id(),
        recommendations,
    }))
}
