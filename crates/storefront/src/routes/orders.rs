//! Order history for the signed-in customer.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use voltio_core::OrderId;
use voltio_core::catalog::{Page, Pagination};

use crate::db::OrderRepository;
use crate::db::orders::OrderFilter;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/cancel", post(cancel))
}

/// The customer's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Page<Order>>> {
    let filter = OrderFilter {
        user_id: Some(user.id),
        ..OrderFilter::default()
    };
    let page = OrderRepository::new(state.pool())
        .list(&filter, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

/// Someone else's order is reported as missing.
#[instrument(skip(state, user), fields(user_id = %user.id, order_id = %id))]
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Cancel a pending order and put its units back in stock.
#[instrument(skip(state, user), fields(user_id = %user.id, order_id = %id))]
async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .cancel_for_user(id, user.id)
        .await?;
    tracing::info!(order_id = %order.id, "order cancelled by customer");
    Ok(Json(order))
}
