//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CORS (origins from `VOLTIO_CORS_ORIGINS`)
//! 6. Session layer (tower-sessions with `PostgreSQL` store)
//! 7. Rate limiting on auth routes (governor)

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use cors::cors_layer;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::{hsts_middleware, security_headers_middleware};
pub use session::{build_session_layer, create_session_layer};
