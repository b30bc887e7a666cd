//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::admission::{AdmissionPolicy, ResourceClass, DEFAULT_MAX_TRACKED};
use crate::cache::{
    response_cache_config, CacheConfig, DeletePolicy, RESPONSE_CACHE_ENTRIES, RESPONSE_CACHE_TTL,
};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the recipe cache can hold
    pub max_entries: usize,
    /// Recipe cache TTL in seconds
    pub entry_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background housekeeping interval in seconds
    pub cleanup_interval: u64,
    /// Requests per window for authentication routes
    pub auth_rate_limit: u32,
    /// Authentication window in seconds
    pub auth_rate_window: u64,
    /// Requests per window for general API routes
    pub api_rate_limit: u32,
    /// General API window in seconds
    pub api_rate_window: u64,
    /// Soft cap on tracked admission records
    pub max_tracked_identities: usize,
    /// Directory of the durable recipe store, None = memory only
    pub durable_dir: Option<PathBuf>,
    /// Timeout for each durable store call in milliseconds
    pub durable_timeout_ms: u64,
    /// Whether cache invalidation reaches the durable store
    pub durable_delete: DeletePolicy,
    /// Maximum number of rendered responses kept
    pub response_cache_entries: usize,
    /// Response cache TTL in seconds
    pub response_cache_ttl: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cached recipes (default: 100)
    /// - `ENTRY_TTL` - Recipe TTL in seconds (default: 86400)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Housekeeping frequency in seconds (default: 60)
    /// - `AUTH_RATE_LIMIT` / `AUTH_RATE_WINDOW` - Auth policy (default: 5 per 60s)
    /// - `API_RATE_LIMIT` / `API_RATE_WINDOW` - API policy (default: 60 per 60s)
    /// - `MAX_TRACKED_IDENTITIES` - Admission record soft cap (default: 1000)
    /// - `DURABLE_DIR` - Durable store directory (default: unset)
    /// - `DURABLE_TIMEOUT_MS` - Durable call timeout (default: 500)
    /// - `DURABLE_DELETE` - `retain` or `propagate` (default: retain)
    /// - `RESPONSE_CACHE_ENTRIES` - Cached responses (default: 100)
    /// - `RESPONSE_CACHE_TTL` - Response TTL in seconds (default: 300)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            entry_ttl: env_or("ENTRY_TTL", defaults.entry_ttl),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            auth_rate_limit: env_or("AUTH_RATE_LIMIT", defaults.auth_rate_limit),
            auth_rate_window: env_or("AUTH_RATE_WINDOW", defaults.auth_rate_window),
            api_rate_limit: env_or("API_RATE_LIMIT", defaults.api_rate_limit),
            api_rate_window: env_or("API_RATE_WINDOW", defaults.api_rate_window),
            max_tracked_identities: env_or(
                "MAX_TRACKED_IDENTITIES",
                defaults.max_tracked_identities,
            ),
            durable_dir: env::var("DURABLE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            durable_timeout_ms: env_or("DURABLE_TIMEOUT_MS", defaults.durable_timeout_ms),
            durable_delete: env_or("DURABLE_DELETE", defaults.durable_delete),
            response_cache_entries: env_or(
                "RESPONSE_CACHE_ENTRIES",
                defaults.response_cache_entries,
            ),
            response_cache_ttl: env_or("RESPONSE_CACHE_TTL", defaults.response_cache_ttl),
        }
    }

    /// Policy for `class`, built from the configured limit and window.
    ///
    /// Zero values fall back to the class default rather than panicking.
    pub fn policy(&self, class: ResourceClass) -> AdmissionPolicy {
        let (limit, window) = match class {
            ResourceClass::Auth => (self.auth_rate_limit, self.auth_rate_window),
            ResourceClass::ApiGeneral => (self.api_rate_limit, self.api_rate_window),
        };
        if limit == 0 || window == 0 {
            warn!("Ignoring non-positive {} rate policy, using default", class);
            return class.default_policy();
        }
        AdmissionPolicy::new(limit, Duration::from_secs(window))
    }

    /// Recipe cache settings.
    ///
    /// A zero capacity or durable timeout falls back to the default rather
    /// than panicking or timing out every durable call.
    pub fn cache_config(&self) -> CacheConfig {
        let defaults = CacheConfig::default();

        let max_entries = if self.max_entries == 0 {
            warn!(
                "Ignoring zero MAX_ENTRIES, using default of {}",
                defaults.max_entries
            );
            defaults.max_entries
        } else {
            self.max_entries
        };

        let durable_timeout = if self.durable_timeout_ms == 0 {
            warn!(
                "Ignoring zero DURABLE_TIMEOUT_MS, using default of {:?}",
                defaults.durable_timeout
            );
            defaults.durable_timeout
        } else {
            Duration::from_millis(self.durable_timeout_ms)
        };

        CacheConfig {
            max_entries,
            ttl: Duration::from_secs(self.entry_ttl),
            durable_timeout,
            delete_policy: self.durable_delete,
        }
    }

    /// Response cache settings. Zero values fall back to the defaults.
    pub fn response_cache_config(&self) -> CacheConfig {
        let mut config = response_cache_config();
        if self.response_cache_entries == 0 || self.response_cache_ttl == 0 {
            warn!("Ignoring zero response cache setting, using defaults");
            return config;
        }
        config.max_entries = self.response_cache_entries;
        config.ttl = Duration::from_secs(self.response_cache_ttl);
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 100,
            entry_ttl: 24 * 60 * 60,
            server_port: 3000,
            cleanup_interval: 60,
            auth_rate_limit: 5,
            auth_rate_window: 60,
            api_rate_limit: 60,
            api_rate_window: 60,
            max_tracked_identities: DEFAULT_MAX_TRACKED,
            durable_dir: None,
            durable_timeout_ms: 500,
            durable_delete: DeletePolicy::Retain,
            response_cache_entries: RESPONSE_CACHE_ENTRIES,
            response_cache_ttl: RESPONSE_CACHE_TTL.as_secs(),
        }
    }
}

/// Parses `name` from the environment, falling back to `default` when unset
/// or unparsable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.entry_ttl, 86_400);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.auth_rate_limit, 5);
        assert_eq!(config.api_rate_limit, 60);
        assert!(config.durable_dir.is_none());
        assert_eq!(config.durable_delete, DeletePolicy::Retain);
    }

    #[test]
    fn test_config_policies_match_class_defaults() {
        let config = Config::default();
        assert_eq!(
            config.policy(ResourceClass::Auth),
            ResourceClass::Auth.default_policy()
        );
        assert_eq!(
            config.policy(ResourceClass::ApiGeneral),
            ResourceClass::ApiGeneral.default_policy()
        );
    }

    #[test]
    fn test_zero_policy_falls_back_to_default() {
        let config = Config {
            auth_rate_limit: 0,
            ..Config::default()
        };
        assert_eq!(config.policy(ResourceClass::Auth).limit, 5);
    }

    #[test]
    fn test_cache_config_conversion() {
        let config = Config {
            max_entries: 20,
            entry_ttl: 30,
            durable_timeout_ms: 250,
            ..Config::default()
        };
        let cache = config.cache_config();
        assert_eq!(cache.max_entries, 20);
        assert_eq!(cache.ttl, Duration::from_secs(30));
        assert_eq!(cache.durable_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_cache_settings_fall_back_to_default() {
        let config = Config {
            max_entries: 0,
            durable_timeout_ms: 0,
            ..Config::default()
        };
        let cache = config.cache_config();
        assert_eq!(cache.max_entries, 100);
        assert_eq!(cache.durable_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_response_cache_config() {
        let config = Config {
            response_cache_entries: 10,
            response_cache_ttl: 30,
            ..Config::default()
        };
        let responses = config.response_cache_config();
        assert_eq!(responses.max_entries, 10);
        assert_eq!(responses.ttl, Duration::from_secs(30));

        let zero = Config {
            response_cache_ttl: 0,
            ..Config::default()
        };
        assert_eq!(zero.response_cache_config().ttl, RESPONSE_CACHE_TTL);
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        assert_eq!(env_or("RECIPE_GATE_TEST_UNSET_VAR", 7u32), 7);
    }
}
