//! Back-office routes. Every handler takes [`RequireAdmin`].
//!
//! ```text
//! GET    /api/admin/dashboard
//! GET    /api/admin/users                  GET/PUT/DELETE /api/admin/users/{id}
//! GET    /api/admin/products               POST /api/admin/products
//! GET    /api/admin/products/{id}          PUT/DELETE /api/admin/products/{id}
//! GET    /api/admin/orders                 GET /api/admin/orders/{id}
//! PUT    /api/admin/orders/{id}/status
//! GET    /api/admin/support                GET /api/admin/support/{id}
//! POST   /api/admin/support/{id}/respond   PUT /api/admin/support/{id}/status
//! GET    /api/admin/faqs                   POST /api/admin/faqs
//! PUT    /api/admin/faqs/{id}              DELETE /api/admin/faqs/{id}
//! GET    /api/admin/config                 PUT /api/admin/config
//! ```
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

pub mod config;
pub mod dashboard;
pub mod faqs;
pub mod orders;
pub mod products;
pub mod support;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Response for delete requests that may soft-delete instead.
#[derive(Debug, Serialize)]
pub struct Removed<I, O> {
    pub id: I,
    pub outcome: O,
}

/// Trim a search box value, treating blank as absent.
fn search_term(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(users::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(support::router())
        .merge(faqs::router())
        .merge(config::router())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("   ".to_owned())), None);
        assert_eq!(search_term(Some(" tesla ".to_owned())), Some("tesla".to_owned()));
    }
}
