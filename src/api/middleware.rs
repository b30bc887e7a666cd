//! Rate-limit middleware
//!
//! Translates admission decisions into HTTP: admitted requests carry the
//! quota headers on their response, rejected ones become a 429 with the same
//! headers.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tracing::warn;

use super::handlers::AppState;
use crate::admission::{AdmissionController, AdmissionPolicy, ResourceClass, ANONYMOUS_IDENTITY};
use crate::error::{insert_quota_headers, ApiError, Result};

/// Middleware state: which controller, class and policy to apply.
#[derive(Debug, Clone)]
pub struct RateLimit {
    controller: AdmissionController,
    class: ResourceClass,
    policy: AdmissionPolicy,
}

impl RateLimit {
    pub fn new(controller: AdmissionController, class: ResourceClass, policy: AdmissionPolicy) -> Self {
        Self {
            controller,
            class,
            policy,
        }
    }
}

/// Applies `limit` to every route currently registered on `router`.
pub fn limit_routes<S>(router: Router<S>, limit: RateLimit) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(limit, rate_limit))
}

/// Puts every route on `router` under the strict authentication policy.
///
/// Login and signup routes live outside this crate; they are mounted with
/// this helper so brute-force attempts hit the Auth quota, which is counted
/// separately from the caller's general API quota.
pub fn limit_auth_routes<S>(router: Router<S>, state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    limit_routes(router, state.rate_limit(ResourceClass::Auth))
}

/// Puts every route on `router` under the general API policy.
pub fn limit_api_routes<S>(router: Router<S>, state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    limit_routes(router, state.rate_limit(ResourceClass::ApiGeneral))
}

/// Admission check for one request.
pub async fn rate_limit(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let identity = caller_identity(request.headers());
    let result = limit
        .controller
        .check_policy(&identity, limit.class, &limit.policy);

    if !result.admitted {
        warn!(
            "Rate limited {} on {} (resets in {:?})",
            identity,
            limit.class,
            result.reset_after()
        );
        return Err(ApiError::TooManyRequests(result));
    }

    let mut response = next.run(request).await;
    insert_quota_headers(response.headers_mut(), &result);
    Ok(response)
}

/// Resolves the caller identity from proxy headers.
///
/// Uses the first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// anonymous sentinel.
pub fn caller_identity(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim);
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim);

    forwarded
        .filter(|v| !v.is_empty())
        .or(real_ip.filter(|v| !v.is_empty()))
        .unwrap_or(ANONYMOUS_IDENTITY)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.0.9"));

        assert_eq!(caller_identity(&headers), "10.0.0.1");
    }

    #[test]
    fn test_identity_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" "));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.0.9"));

        assert_eq!(caller_identity(&headers), "192.168.0.9");
    }

    #[test]
    fn test_identity_anonymous_without_headers() {
        assert_eq!(caller_identity(&HeaderMap::new()), ANONYMOUS_IDENTITY);
    }
}
