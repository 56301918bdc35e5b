//! Voltio storefront library.
//!
//! JSON API for the EV catalog, session cart, checkout, customer accounts,
//! support tickets and the admin back-office. The binary in `main.rs` wires
//! this up with a `PostgreSQL` session store and Sentry; tests build the same
//! router around an in-memory session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::service::SignedCookie;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Build the application router with every layer except Sentry, which the
/// binary adds outermost.
///
/// # Layer Order (outermost first)
///
/// 1. `TraceLayer` (`http_request` span with method, uri, status, latency)
/// 2. Request ID
/// 3. HSTS (HTTPS deployments only)
/// 4. Security headers
/// 5. CORS
/// 6. Session
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S, SignedCookie>) -> Router
where
    S: SessionStore + Clone,
{
    let router = routes::routes()
        .layer(sessions)
        .layer(middleware::cors_layer(&state.config().cors_origins))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ));

    let router = if state.config().is_https() {
        router.layer(axum::middleware::from_fn(middleware::hsts_middleware))
    } else {
        router
    };

    router
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::{Body, to_bytes};
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::{SentryConfig, StorefrontConfig};

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/voltio"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("q8Zr2LxP0vNc7TfW4jHs9KbYd3GmA6Ue".repeat(2)),
            cors_origins: vec!["http://localhost:5173".to_string()],
            sentry: SentryConfig::default(),
        }
    }

    /// Router with an in-memory session store and a pool that never connects.
    /// Only paths that fail before touching the database can be exercised.
    fn test_app() -> Router {
        let config = config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/voltio")
            .unwrap();
        let sessions = middleware::build_session_layer(MemoryStore::default(), &config).unwrap();
        app(AppState::new(config, pool), sessions)
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([203, 0, 113, 9], 40000))));
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert!(!response.headers().contains_key("strict-transport-security"));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let mut req = request("GET", "/health", None);
        req.headers_mut()
            .insert("x-request-id", "edge-42".parse().unwrap());
        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-42");
    }

    #[tokio::test]
    async fn test_signed_in_routes_require_session() {
        for (method, uri) in [
            ("GET", "/api/auth/me"),
            ("GET", "/api/profile"),
            ("GET", "/api/orders"),
            ("GET", "/api/support/mine"),
            ("POST", "/api/orders/1/cancel"),
        ] {
            let response = test_app()
                .oneshot(request(method, uri, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_checkout_requires_session() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/checkout",
                Some(serde_json::json!({ "payment_method": "tarjeta" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Please sign in");
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        for uri in [
            "/api/admin/dashboard",
            "/api/admin/users",
            "/api/admin/orders",
            "/api/admin/config",
        ] {
            let response = test_app().oneshot(request("GET", uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_guest_ticket_needs_contact_details() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/support",
                Some(serde_json::json!({
                    "subject": "Autonomía",
                    "message": "¿Cuánto dura la batería en invierno?"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["fields"]["name"].is_string());
        assert!(body["fields"]["email"].is_string());
    }

    #[tokio::test]
    async fn test_catalog_rejects_inverted_ranges() {
        let response = test_app()
            .oneshot(request(
                "GET",
                "/api/products?min_price=5000&max_price=100",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["fields"]["max_price"].is_string());
    }

    #[tokio::test]
    async fn test_empty_cart_count_and_missing_line() {
        let response = test_app()
            .oneshot(request("GET", "/api/cart/count", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["count"], 0);

        let response = test_app()
            .oneshot(request(
                "PUT",
                "/api/cart/items/3",
                Some(serde_json::json!({ "quantity": 0 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_with_malformed_email() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": "not-an-email", "password": "x" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_is_rate_limited() {
        let app = test_app();
        let mut last = None;
        for _ in 0..6 {
            let response = app
                .clone()
                .oneshot(request(
                    "POST",
                    "/api/auth/login",
                    Some(serde_json::json!({ "email": "nope", "password": "x" })),
                ))
                .await
                .unwrap();
            last = Some(response);
        }
        let last = last.unwrap();
        assert_eq!(last.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(last.headers().contains_key("retry-after"));
        assert!(json_body(last).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_requests_get_json_errors() {
        let cases = [
            request(
                "POST",
                "/api/cart/items",
                Some(serde_json::json!({ "product_id": "abc" })),
            ),
            request("GET", "/api/products?sort=cheapest", None),
            request("GET", "/api/products/abc", None),
        ];
        for req in cases {
            let uri = req.uri().clone();
            let response = test_app().oneshot(req).await.unwrap();
            assert!(response.status().is_client_error(), "{uri}");
            assert_eq!(
                response.headers()["content-type"],
                "application/json",
                "{uri}"
            );
            assert!(json_body(response).await["error"].is_string(), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unparseable_json_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/support")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let response = test_app()
            .oneshot(request("POST", "/api/auth/logout", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_cors_preflight_for_configured_origin() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/cart")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(req).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );
        assert_eq!(response.headers()["access-control-allow-credentials"], "true");
    }
}
