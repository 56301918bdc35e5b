//! CORS for browser front-ends on other origins.
//!
//! Only origins listed in `VOLTIO_CORS_ORIGINS` may call the API, and they may
//! send the session cookie. With no origins configured, cross-origin requests
//! get no CORS headers at all.

use std::time::Duration;

use axum::http::{
    HeaderValue, Method,
    header::{ACCEPT, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer from configured origins. Unparseable entries are
/// skipped with a warning.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app(origins: &[&str]) -> Router {
        let origins: Vec<String> = origins.iter().map(|o| (*o).to_owned()).collect();
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(&origins))
    }

    async fn allow_origin(app: Router, origin: &str) -> Option<String> {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_owned())
    }

    #[tokio::test]
    async fn test_listed_origin_is_allowed() {
        let allowed = allow_origin(app(&["https://voltio.mx"]), "https://voltio.mx").await;
        assert_eq!(allowed.as_deref(), Some("https://voltio.mx"));
    }

    #[tokio::test]
    async fn test_unlisted_origin_is_not_allowed() {
        let allowed = allow_origin(app(&["https://voltio.mx"]), "https://evil.example").await;
        assert!(allowed.is_none());
    }

    #[tokio::test]
    async fn test_no_origins_configured() {
        assert!(allow_origin(app(&[]), "https://voltio.mx").await.is_none());
    }
}
