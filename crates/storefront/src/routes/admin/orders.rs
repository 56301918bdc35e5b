//! Order management.

use axum::{
    Router,
    extract::State,
    routing::{get, put},
};
use serde::Deserialize;
use tracing::instrument;

use voltio_core::catalog::{Page, Pagination};
use voltio_core::{OrderId, OrderStatus, UserId};

use super::search_term;
use crate::db::OrderRepository;
use crate::db::orders::OrderFilter;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub user_id: Option<UserId>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", put(update_status))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let filter = OrderFilter {
        status: query.status,
        search: search_term(query.search),
        user_id: query.user_id,
    };
    let page = OrderRepository::new(state.pool())
        .list(&filter, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, order_id = %id))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Move an order along its lifecycle. Cancelling restocks its items.
#[instrument(skip(admin, state), fields(admin_id = %admin.id, order_id = %id))]
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, change.status)
        .await?;

    add_breadcrumb(
        "admin",
        "Order status changed",
        Some(&[("status", order.status.as_str())]),
    );
    tracing::info!(order_id = %order.id, status = order.status.as_str(), "order status changed");
    Ok(Json(order))
}
