//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database ping)
//!
//! # Public
//! GET  /api/config                    - Public site configuration
//! GET  /api/categories                - Categories with active product counts
//! GET  /api/products                  - Catalog with filters, sort and paging
//! GET  /api/products/{id}             - Product detail
//! GET  /api/faq                       - Published FAQs
//! POST /api/support                   - Submit a support ticket
//!
//! # Cart (session)
//! GET    /api/cart                    - Priced cart
//! DELETE /api/cart                    - Clear cart
//! GET    /api/cart/count              - Units in cart
//! POST   /api/cart/items              - Add a product
//! PUT    /api/cart/items/{product_id} - Set quantity (0 removes)
//! DELETE /api/cart/items/{product_id} - Remove a line
//!
//! # Auth
//! POST /api/auth/register             - Create account and sign in
//! POST /api/auth/login                - Sign in
//! POST /api/auth/logout               - Sign out (cart is kept)
//! GET  /api/auth/me                   - Current user
//!
//! # Account (requires auth)
//! GET  /api/profile                   - Profile
//! PUT  /api/profile                   - Update profile
//! PUT  /api/profile/password          - Change password
//! POST /api/checkout                  - Place an order from the cart
//! GET  /api/orders                    - Order history
//! GET  /api/orders/{id}               - Order detail
//! POST /api/orders/{id}/cancel        - Cancel a pending order
//! GET  /api/support/mine              - My tickets
//!
//! # Back-office (requires admin)
//! /api/admin/...                      - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod faq;
pub mod orders;
pub mod products;
pub mod profile;
pub mod site;
pub mod support;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Liveness check.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Routes under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(site::router())
        .merge(products::router())
        .merge(faq::router())
        .merge(support::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(orders::router())
        .merge(profile::router())
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
}
