//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::Recipe;

/// Response body for `PUT /api/recipes`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub message: String,
    pub id: String,
}

impl SetResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Recipe '{}' cached", id),
            id,
        }
    }
}

/// Response body for `DELETE /api/recipes/:id`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

impl DeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Recipe '{}' invalidated", id),
            id,
        }
    }
}

/// Response body for `POST /api/recipes/batch/get`
///
/// `recipes[i]` answers `ids[i]` of the request; absent entries are `null`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchGetResponse {
    pub recipes: Vec<Option<Recipe>>,
}

/// Response body for `PUT /api/recipes/batch`
#[derive(Debug, Clone, Serialize)]
pub struct BatchSetResponse {
    pub cached: usize,
}

/// Response body for `GET /api/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Rendered-response cache counters
    pub responses: CacheStats,
    /// Live admission records across all resource classes
    pub tracked_callers: usize,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, responses: CacheStats, tracked_callers: usize) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            responses,
            tracked_callers,
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_response_serialize() {
        let json = serde_json::to_string(&SetResponse::new("r1")).unwrap();
        assert!(json.contains("r1"));
        assert!(json.contains("cached"));
    }

    #[test]
    fn test_batch_get_response_nulls_for_absent() {
        let resp = BatchGetResponse {
            recipes: vec![Some(Recipe::sample("r1", "Soup")), None],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["recipes"][0]["id"], "r1");
        assert!(json["recipes"][1].is_null());
    }

    #[test]
    fn test_stats_response_flattens_cache_stats() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_miss();

        let json = serde_json::to_value(StatsResponse::new(stats, CacheStats::new(), 7)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 3);
        assert_eq!(json["hit_rate"], 0.25);
        assert_eq!(json["tracked_callers"], 7);
        assert_eq!(json["responses"]["hits"], 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
