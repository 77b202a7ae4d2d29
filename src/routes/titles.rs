use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogEntry, ItemId},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    q: Option<String>,
}

/// Handler listing the selectable titles, optionally filtered by `q`
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TitleQuery>,
) -> Json<Vec<CatalogEntry>> {
    let catalog = state.recommender.catalog();
    let entries: Vec<CatalogEntry> = match params.q.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => catalog.search(query).into_iter().cloned().collect(),
        _ => catalog.entries().to_vec(),
    };
    Json(entries)
}

/// Handler for a single catalog entry
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> AppResult<Json<CatalogEntry>> {
    let entry = state.recommender.catalog().by_identifier(ItemId(id))?;
    Ok(Json(entry.clone()))
}
