//! Dashboard route handler.

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use voltio_core::catalog::Pagination;

use crate::db::orders::{OrderFilter, OrderStats};
use crate::db::tickets::TicketCounts;
use crate::db::users::UserCounts;
use crate::db::{OrderRepository, ProductRepository, TicketRepository, UserRepository};
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::models::{Order, Product};
use crate::state::AppState;

/// Products at or below this stock level are flagged.
const LOW_STOCK_THRESHOLD: i32 = 5;
const LOW_STOCK_LIMIT: i64 = 10;
const RECENT_ORDERS: u32 = 5;

/// Headline numbers for the back-office home.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub users: UserCounts,
    pub orders: OrderStats,
    pub tickets: TicketCounts,
    pub active_products: i64,
    pub low_stock: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(index))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let pool = state.pool();
    let users = UserRepository::new(pool);
    let products = ProductRepository::new(pool);
    let orders = OrderRepository::new(pool);
    let tickets = TicketRepository::new(pool);
    let every_order = OrderFilter::default();
    let latest = Pagination::new(Some(1), Some(RECENT_ORDERS));

    let (user_counts, order_stats, ticket_counts, active_products, low_stock, recent) = tokio::try_join!(
        users.counts(),
        orders.stats(),
        tickets.counts(),
        products.count_active(),
        products.low_stock(LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT),
        orders.list(&every_order, latest),
    )?;

    Ok(Json(Dashboard {
        users: user_counts,
        orders: order_stats,
        tickets: ticket_counts,
        active_products,
        low_stock,
        recent_orders: recent.items,
    }))
}
