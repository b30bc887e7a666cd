//! Response Cache
//!
//! Rendered API responses, cached under a canonical key built from the
//! request path and its query parameters. Reuses [`EntityCache`] with a
//! short TTL and no durable backing.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, Entity, EntityCache};

/// Default capacity of the response cache
pub const RESPONSE_CACHE_ENTRIES: usize = 100;

/// Default age at which a cached response is re-rendered
pub const RESPONSE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache of rendered responses keyed by [`cache_key`].
pub type ResponseCache = EntityCache<CachedResponse>;

/// Default settings for a [`ResponseCache`].
pub fn response_cache_config() -> CacheConfig {
    CacheConfig {
        max_entries: RESPONSE_CACHE_ENTRIES,
        ttl: RESPONSE_CACHE_TTL,
        ..CacheConfig::default()
    }
}

// == Cache Key ==
/// Builds the canonical key for `path` queried with `params`.
///
/// Parameters are joined as `k=v` pairs in key order, so two requests that
/// only differ in parameter order share one entry. Without parameters the
/// key is the bare path.
pub fn cache_key(path: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return path.to_string();
    }

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

// == Cached Response ==
/// A rendered response body with its status and content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl CachedResponse {
    /// A `200 OK` JSON body stored under `key`.
    pub fn json(key: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: StatusCode::OK.as_u16(),
            content_type: "application/json".to_string(),
            body: body.into(),
        }
    }
}

impl Entity for CachedResponse {
    fn id(&self) -> &str {
        &self.key
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        (status, [(header::CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cache_key_ignores_param_order() {
        let forward = params(&[("ids", "r1,r2"), ("lang", "en")]);
        let reversed = params(&[("lang", "en"), ("ids", "r1,r2")]);

        assert_eq!(cache_key("/api/recipes", &forward), "/api/recipes?ids=r1,r2&lang=en");
        assert_eq!(cache_key("/api/recipes", &forward), cache_key("/api/recipes", &reversed));
    }

    #[test]
    fn test_cache_key_without_params_is_path() {
        assert_eq!(cache_key("/api/recipes", &BTreeMap::new()), "/api/recipes");
    }

    #[test]
    fn test_cache_key_distinguishes_values() {
        assert_ne!(
            cache_key("/api/recipes", &params(&[("ids", "r1")])),
            cache_key("/api/recipes", &params(&[("ids", "r2")]))
        );
    }

    #[tokio::test]
    async fn test_response_cache_stores_by_key() {
        let cache = ResponseCache::new(response_cache_config());
        let key = cache_key("/api/recipes", &params(&[("ids", "r1")]));

        cache.set(CachedResponse::json(key.clone(), r#"{"recipes":[]}"#)).await;

        let cached = cache.get(&key).await.unwrap();
        assert_eq!(cached.body, r#"{"recipes":[]}"#);
        assert_eq!(cached.status, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_cache_expires_after_five_minutes() {
        let cache = ResponseCache::new(response_cache_config());
        cache.set(CachedResponse::json("/api/recipes", "{}")).await;

        tokio::time::advance(RESPONSE_CACHE_TTL).await;

        assert_eq!(cache.get("/api/recipes").await, None);
    }

    #[tokio::test]
    async fn test_cached_response_renders_status_and_content_type() {
        let response = CachedResponse::json("k", "{}").into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
