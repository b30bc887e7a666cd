//! API Handlers
//!
//! HTTP request handlers for the recipe cache endpoints.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

use crate::admission::{AdmissionController, AdmissionPolicy, ResourceClass};
use crate::api::middleware::RateLimit;
use crate::cache::{
    cache_key, response_cache_config, CachedResponse, EntityCache, FileStore, ResponseCache,
};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    validate_id, validate_recipe, BatchGetRequest, BatchGetResponse, BatchSetRequest,
    BatchSetResponse, DeleteResponse, HealthResponse, Recipe, SetResponse, StatsResponse,
};

/// Response header telling whether a body came from the response cache
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Application state shared across all handlers.
///
/// Owns the process-wide recipe cache, response cache and admission
/// controller; all are constructed once at startup and handed to the router.
#[derive(Clone)]
pub struct AppState {
    /// Shared recipe cache
    pub cache: Arc<EntityCache<Recipe>>,
    /// Rendered lookup responses, cleared on every recipe write
    pub responses: Arc<ResponseCache>,
    /// Bumped on every recipe write; a lookup rendered across a bump is not cached
    writes: Arc<AtomicU64>,
    /// Shared admission counters
    pub admission: AdmissionController,
    pub auth_policy: AdmissionPolicy,
    pub api_policy: AdmissionPolicy,
}

impl AppState {
    /// Creates a new AppState with default admission policies.
    pub fn new(cache: EntityCache<Recipe>, admission: AdmissionController) -> Self {
        Self {
            cache: Arc::new(cache),
            responses: Arc::new(ResponseCache::new(response_cache_config())),
            writes: Arc::new(AtomicU64::new(0)),
            admission,
            auth_policy: ResourceClass::Auth.default_policy(),
            api_policy: ResourceClass::ApiGeneral.default_policy(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// A durable store that cannot be opened is logged and skipped; the
    /// cache then runs memory-only.
    pub async fn from_config(config: &Config) -> Self {
        let cache_config = config.cache_config();
        let cache = match &config.durable_dir {
            Some(dir) => match FileStore::<Recipe>::open(dir).await {
                Ok(store) => {
                    info!("Durable recipe store at {}", dir.display());
                    EntityCache::with_durable(cache_config, Arc::new(store))
                }
                Err(err) => {
                    warn!(
                        "Cannot open durable store at {}, running memory-only: {}",
                        dir.display(),
                        err
                    );
                    EntityCache::new(cache_config)
                }
            },
            None => EntityCache::new(cache_config),
        };

        Self {
            cache: Arc::new(cache),
            responses: Arc::new(ResponseCache::new(config.response_cache_config())),
            writes: Arc::new(AtomicU64::new(0)),
            admission: AdmissionController::new(config.max_tracked_identities),
            auth_policy: config.policy(ResourceClass::Auth),
            api_policy: config.policy(ResourceClass::ApiGeneral),
        }
    }

    /// Rate-limit middleware state for `class`.
    pub fn rate_limit(&self, class: ResourceClass) -> RateLimit {
        let policy = match class {
            ResourceClass::Auth => self.auth_policy,
            ResourceClass::ApiGeneral => self.api_policy,
        };
        RateLimit::new(self.admission.clone(), class, policy)
    }

    /// Drops every rendered response after a recipe write.
    async fn invalidate_responses(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if !self.responses.is_empty().await {
            debug!("Recipe write, clearing cached responses");
            self.responses.clear().await;
        }
    }
}

/// Handler for PUT /api/recipes
///
/// Caches a recipe after the caller fetched, generated or edited it.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(recipe): Json<Recipe>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = validate_recipe(&recipe) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let id = recipe.id.clone();
    state.cache.set(recipe).await;
    state.invalidate_responses().await;

    Ok(Json(SetResponse::new(id)))
}

/// Handler for GET /api/recipes?ids=a,b
///
/// Same lookup as the batch read, addressed through the query string so the
/// rendered body can be served from the response cache.
pub async fn lookup_handler(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response> {
    let key = cache_key(uri.path(), &params);
    if let Some(cached) = state.responses.get(&key).await {
        return Ok(with_cache_status(cached, "hit"));
    }

    let ids: Vec<String> = params
        .get("ids")
        .ok_or_else(|| ApiError::InvalidRequest("Missing ids parameter".to_string()))?
        .split(',')
        .map(|id| id.trim().to_string())
        .collect();
    let req = BatchGetRequest { ids };
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let writes_before = state.writes.load(Ordering::SeqCst);
    let recipes = state.cache.get_multiple(&req.ids).await;
    let body = serde_json::to_string(&BatchGetResponse { recipes })
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let rendered = CachedResponse::json(key, body);
    if state.writes.load(Ordering::SeqCst) == writes_before {
        state.responses.set(rendered.clone()).await;
    }
    Ok(with_cache_status(rendered, "miss"))
}

fn with_cache_status(cached: CachedResponse, status: &'static str) -> Response {
    let mut response = cached.into_response();
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(status));
    response
}

/// Handler for GET /api/recipes/:id
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>> {
    if let Some(error_msg) = validate_id(&id) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state
        .cache
        .get(&id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

/// Handler for DELETE /api/recipes/:id
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_id(&id) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete(&id).await;
    state.invalidate_responses().await;

    if removed {
        Ok(Json(DeleteResponse::new(id)))
    } else {
        Err(ApiError::NotFound(id))
    }
}

/// Handler for POST /api/recipes/batch/get
pub async fn batch_get_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchGetRequest>,
) -> Result<Json<BatchGetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let recipes = state.cache.get_multiple(&req.ids).await;
    Ok(Json(BatchGetResponse { recipes }))
}

/// Handler for PUT /api/recipes/batch
pub async fn batch_set_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchSetRequest>,
) -> Result<Json<BatchSetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let cached = req.recipes.len();
    state.cache.set_multiple(req.recipes).await;
    state.invalidate_responses().await;
    Ok(Json(BatchSetResponse { cached }))
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let responses = state.responses.stats().await;
    Json(StatsResponse::new(stats, responses, state.admission.tracked()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
