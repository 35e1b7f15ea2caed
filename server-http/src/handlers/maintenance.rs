use crate::api::responses::{CacheStatsResponse, ClearCacheResponse};
use crate::state::AppState;
use axum::{extract::State, Json};
use tracing::info;

/// GET /admin/cache
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.backoffice.cache_stats().into())
}

/// POST /clear-cache
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.backoffice.clear_cache();
    info!("cache cleared on request");

    Json(ClearCacheResponse {
        success: true,
        message: "Cache cleared".to_string(),
    })
}
