// SPDX-FileCopyrightText: 2026 Etymon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /api/limits/check, GET /api/limits, GET /api/autocomplete,
//! GET /health and GET /metrics.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use etymon_core::{HealthStatus, RateDecision};
use etymon_ratelimit::LimitView;

use crate::server::GatewayState;

/// Request body for POST /api/limits/check.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as a 400 with a useful message instead of a deserializer error.
#[derive(Debug, Deserialize)]
pub struct LimitCheckRequest {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

/// Query parameters for GET /api/autocomplete.
#[derive(Debug, Deserialize)]
pub struct AutocompleteParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Response body for GET /api/autocomplete.
#[derive(Debug, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    pub suggestions: Vec<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok", "degraded" or "unavailable".
    pub status: String,
    /// Binary version.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn required(field: &str, value: Option<String>) -> Result<String, Response> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("missing required field: {field}"),
        )),
    }
}

fn rate_limit_headers(decision: &RateDecision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(decision.reset_at.timestamp()),
    );
    if !decision.allowed {
        let wait = (decision.reset_at - Utc::now()).num_seconds().max(1);
        headers.insert(header::RETRY_AFTER, HeaderValue::from(wait));
    }
    headers
}

/// POST /api/limits/check
///
/// Counts one request and returns the decision: 200 when admitted, 429
/// with the same body when denied.
pub async fn post_limit_check(
    State(state): State<GatewayState>,
    body: Result<Json<LimitCheckRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let client_id = match required("client_id", body.client_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let action = match required("action", body.action) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.limiter.check(&client_id, &action).await {
        Ok(decision) => {
            let status = if decision.allowed {
                StatusCode::OK
            } else {
                StatusCode::TOO_MANY_REQUESTS
            };
            (status, rate_limit_headers(&decision), Json(decision)).into_response()
        }
        Err(e) => {
            tracing::error!(
                client_id = %client_id,
                action = %action,
                error = %e,
                "rate limit check failed"
            );
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "rate limit store unavailable")
        }
    }
}

/// GET /api/limits
pub async fn get_limits(State(state): State<GatewayState>) -> Json<BTreeMap<String, LimitView>> {
    Json(state.limiter.limits().view())
}

/// GET /api/autocomplete?q=<prefix>&limit=<n>
pub async fn get_autocomplete(
    State(state): State<GatewayState>,
    params: Result<Query<AutocompleteParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };
    let limit = params
        .limit
        .unwrap_or(state.max_suggestions)
        .min(state.max_suggestions);

    match state.autocomplete.suggest(&params.q, limit).await {
        Ok(suggestions) => Json(AutocompleteResponse { suggestions }).into_response(),
        Err(e) => {
            tracing::error!(prefix = %params.q, error = %e, "autocomplete query failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "autocomplete store unavailable")
        }
    }
}

/// GET /health
///
/// Probes the ephemeral store; 503 when it does not answer.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let version = env!("CARGO_PKG_VERSION").to_string();
    let (code, status, error) = match state.store.health_check().await {
        HealthStatus::Healthy => (StatusCode::OK, "ok", None),
        HealthStatus::Degraded(reason) => {
            tracing::warn!(
                backend = state.store.backend(),
                reason = %reason,
                "store degraded"
            );
            (StatusCode::OK, "degraded", Some(reason))
        }
        HealthStatus::Unhealthy(reason) => {
            tracing::warn!(
                backend = state.store.backend(),
                reason = %reason,
                "health check failed"
            );
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(reason))
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version,
            error,
        }),
    )
        .into_response()
}

/// GET /metrics
///
/// Prometheus text format, or 404 when the exporter is disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.prometheus_render {
        Some(render) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics exporter disabled"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use etymon_autocomplete::AutocompleteIndex;
    use etymon_core::EphemeralStore;
    use etymon_ephemeral::MemoryStore;
    use etymon_ratelimit::{ActionLimit, LimitTable, RateLimiter};
    use etymon_test_utils::FaultyStore;

    use super::*;
    use crate::server::build_router;

    fn state_with(store: Arc<dyn EphemeralStore>) -> GatewayState {
        let table = LimitTable::new(
            BTreeMap::from([(
                "search".to_string(),
                ActionLimit::new(3, Duration::from_secs(60)),
            )]),
            ActionLimit::new(100, Duration::from_secs(60)),
        );
        GatewayState {
            limiter: RateLimiter::new(store.clone(), Arc::new(table)),
            autocomplete: AutocompleteIndex::new(store.clone()),
            store,
            max_suggestions: 2,
            prometheus_render: None,
        }
    }

    fn check_request(body: &str) -> Request<Body> {
        Request::post("/api/limits/check")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn limit_check_allows_then_denies() {
        let app = build_router(state_with(Arc::new(MemoryStore::new())));
        let body = r#"{"client_id":"u1","action":"search"}"#;

        for expected_remaining in [2, 1, 0] {
            let resp = app.clone().oneshot(check_request(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(
                resp.headers()["x-ratelimit-remaining"],
                expected_remaining.to_string().as_str()
            );
            let json = json_body(resp).await;
            assert_eq!(json["allowed"], true);
            assert_eq!(json["remaining"], expected_remaining);
        }

        let resp = app.oneshot(check_request(body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(resp.headers()["x-ratelimit-limit"], "3");
        let json = json_body(resp).await;
        assert_eq!(json["allowed"], false);
        assert_eq!(json["remaining"], 0);
        assert_eq!(json["limit"], 3);
        assert!(json["reset_at"].is_string());
    }

    #[tokio::test]
    async fn limit_check_rejects_missing_fields() {
        let app = build_router(state_with(Arc::new(MemoryStore::new())));
        for body in [
            r#"{"client_id":"u1"}"#,
            r#"{"action":"search"}"#,
            r#"{"client_id":"","action":"search"}"#,
            r#"not json"#,
        ] {
            let resp = app.clone().oneshot(check_request(body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json_body(resp).await["error"].is_string());
        }
    }

    #[tokio::test]
    async fn limit_check_store_failure_is_500() {
        let store = Arc::new(FaultyStore::new());
        store.fail_all(true);
        let app = build_router(state_with(store));
        let resp = app
            .oneshot(check_request(r#"{"client_id":"u1","action":"search"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn limits_listing() {
        let app = build_router(state_with(Arc::new(MemoryStore::new())));
        let resp = app
            .oneshot(Request::get("/api/limits").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_body(resp).await;
        assert_eq!(json["search"]["limit"], 3);
        assert_eq!(json["search"]["window_seconds"], 60);
    }

    #[tokio::test]
    async fn autocomplete_caps_limit() {
        let state = state_with(Arc::new(MemoryStore::new()));
        state
            .autocomplete
            .add_words(&["cat", "car", "cart", "dog"])
            .await
            .unwrap();
        let app = build_router(state);

        let resp = app
            .clone()
            .oneshot(
                Request::get("/api/autocomplete?q=CA&limit=50")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AutocompleteResponse =
            serde_json::from_value(json_body(resp).await).unwrap();
        assert_eq!(body.suggestions, vec!["car", "cart"]);

        let resp = app
            .oneshot(
                Request::get("/api/autocomplete?q=ca&limit=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reflects_store_reachability() {
        let store = Arc::new(FaultyStore::new());
        let app = build_router(state_with(store.clone()));

        let resp = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: HealthResponse = serde_json::from_value(json_body(resp).await).unwrap();
        assert_eq!(body.status, "ok");

        store.fail_all(true);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn metrics_endpoint_depends_on_exporter() {
        let app = build_router(state_with(Arc::new(MemoryStore::new())));
        let resp = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let mut state = state_with(Arc::new(MemoryStore::new()));
        state.prometheus_render = Some(Arc::new(|| "etymon_up 1\n".to_string()));
        let resp = build_router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"etymon_up 1\n");
    }
}
