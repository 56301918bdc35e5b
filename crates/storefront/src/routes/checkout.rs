//! Checkout.

use axum::{Router, extract::State, http::StatusCode, routing::post};
use tower_sessions::Session;
use tracing::instrument;

use voltio_core::cart::Cart;

use super::cart::{load_cart, save_cart};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::{CheckoutRequest, Order};
use crate::services::{AuthService, CheckoutService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout", post(place_order))
}

/// Turn the session cart into an order. Blank shipping fields fall back to
/// the saved profile. The cart is emptied once the order exists.
#[instrument(skip(state, session, current, form), fields(user_id = %current.id))]
async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(form): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let user = AuthService::new(state.pool())
        .get_user(current.id)
        .await?;
    if !user.active {
        return Err(AppError::Forbidden("This account is disabled".to_string()));
    }

    let cart = load_cart(&session).await;
    let order = CheckoutService::new(state.pool(), state.site_config())
        .place_order(&user, &cart, form)
        .await?;

    if let Err(e) = save_cart(&session, &Cart::new()).await {
        tracing::error!(order_id = %order.id, "Failed to clear cart after checkout: {e}");
    }

    let order_id = order.id.to_string();
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", order_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(order)))
}
