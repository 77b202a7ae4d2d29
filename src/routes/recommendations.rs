use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::Recommendation,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub name: String,
    pub k: Option<usize>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(request): Query<RecommendationQuery>,
) -> AppResult<Json<Recommendation>> {
    let k = request.k.unwrap_or(state.default_sample_size);

    tracing::info!(
        request_id = %request_id,
        name = %request.name,
        k,
        "Processing recommendation request"
    );

    let recommendation = state.recommender.recommend(&request.name, k).await?;

    tracing::info!(
        request_id = %request_id,
        similar = recommendation.similar.len(),
        "Recommendation completed"
    );

    Ok(Json(recommendation))
}
