//! API Handlers
//!
//! HTTP request handlers for each edge cache endpoint. Handlers hold the
//! region locks only for the duration of a single cache call.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::{GeoCache, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, InvalidateResponse, PatternRequest, RegionsQuery,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Region router over JSON values
    pub cache: Arc<GeoCache<Value>>,
}

impl AppState {
    pub fn new(cache: GeoCache<Value>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates the state from configuration, using the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = GeoCache::new(config.geo.clone(), Arc::new(SystemClock))?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value in every target region with optional TTL and tags.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let regions = req.target_regions();
    let ttl = req.ttl.map(Duration::from_secs);
    let written = state
        .cache
        .set(&req.key, req.value, ttl, &req.tags, &regions)?;

    if written == 0 {
        return Err(CacheError::InvalidRequest(
            "None of the target regions are configured".to_string(),
        ));
    }

    Ok(Json(SetResponse::new(req.key, written)))
}

/// Handler for GET /get/:region/:key
///
/// Unknown regions follow the configured unknown-region policy; the response
/// names the region that actually served the read.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((region, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let served = state
        .cache
        .resolve_region(&region)
        .map(str::to_string)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;
    let value = state
        .cache
        .get(&key, &served)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, served, value)))
}

/// Handler for DELETE /del/:key
///
/// Deletes from all regions, or those listed in `?regions=`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RegionsQuery>,
) -> Result<Json<DeleteResponse>> {
    let removed = state.cache.invalidate(&key, &query.target_regions());
    if removed == 0 {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key, removed)))
}

/// Handler for POST /invalidate/tag/:tag
pub async fn invalidate_tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(query): Query<RegionsQuery>,
) -> Json<InvalidateResponse> {
    let count = state.cache.invalidate_by_tag(&tag, &query.target_regions());
    debug!(tag = %tag, count, "Tag invalidation request served");

    Json(InvalidateResponse::new(tag, count))
}

/// Handler for POST /invalidate/pattern
pub async fn invalidate_pattern_handler(
    State(state): State<AppState>,
    Json(req): Json<PatternRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let count = state
        .cache
        .invalidate_by_pattern(&req.pattern, &req.target_regions());

    Ok(Json(InvalidateResponse::new(req.pattern, count)))
}

/// Handler for GET /stats
///
/// Returns per-region snapshots plus totals.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.regions().to_vec()))
}
