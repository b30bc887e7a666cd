//! Resource classes and their admission policies.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Resource Class ==
/// Category of endpoint sharing one rate-limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    /// Sign-in, sign-up and password reset endpoints
    Auth,
    /// Everything else under `/api`, including AI generation
    ApiGeneral,
}

impl ResourceClass {
    /// Stable name used in logs and stats.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Auth => "auth",
            ResourceClass::ApiGeneral => "api-general",
        }
    }

    /// Policy applied when configuration does not override it.
    pub fn default_policy(&self) -> AdmissionPolicy {
        match self {
            ResourceClass::Auth => AdmissionPolicy::new(5, Duration::from_secs(60)),
            ResourceClass::ApiGeneral => AdmissionPolicy::new(60, Duration::from_secs(60)),
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Admission Policy ==
/// Maximum admitted requests per fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl AdmissionPolicy {
    /// Creates a policy. Panics if `limit` is zero or `window` is empty.
    pub fn new(limit: u32, window: Duration) -> Self {
        assert!(limit > 0, "admission limit must be positive");
        assert!(!window.is_zero(), "admission window must be positive");
        Self { limit, window }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        assert_eq!(ResourceClass::Auth.as_str(), "auth");
        assert_eq!(ResourceClass::ApiGeneral.to_string(), "api-general");
    }

    #[test]
    fn test_class_serde_names() {
        let json = serde_json::to_string(&ResourceClass::ApiGeneral).unwrap();
        assert_eq!(json, "\"api-general\"");
        let class: ResourceClass = serde_json::from_str("\"auth\"").unwrap();
        assert_eq!(class, ResourceClass::Auth);
    }

    #[test]
    fn test_default_policies() {
        let auth = ResourceClass::Auth.default_policy();
        assert_eq!(auth.limit, 5);
        assert_eq!(auth.window, Duration::from_secs(60));

        let api = ResourceClass::ApiGeneral.default_policy();
        assert_eq!(api.limit, 60);
        assert_eq!(api.window, Duration::from_secs(60));
    }

    #[test]
    #[should_panic(expected = "limit must be positive")]
    fn test_zero_limit_panics() {
        AdmissionPolicy::new(0, Duration::from_secs(1));
    }

    #[test]
    #[should_panic(expected = "window must be positive")]
    fn test_zero_window_panics() {
        AdmissionPolicy::new(1, Duration::ZERO);
    }
}
