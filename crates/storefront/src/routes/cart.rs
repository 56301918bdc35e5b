//! Session cart routes.
//!
//! The cart lives in the visitor's session as product IDs and quantities and
//! survives sign-in and sign-out. Every response re-prices it with current
//! product data.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use voltio_core::ProductId;
use voltio_core::cart::Cart;

use crate::db::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::models::session_keys;
use crate::services::CheckoutService;
use crate::services::checkout::CartView;
use crate::state::AppState;

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Quantity update payload.
#[derive(Debug, Deserialize)]
pub struct SetQuantity {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(show).delete(clear))
        .route("/cart/count", get(count))
        .route("/cart/items", post(add))
        .route("/cart/items/{product_id}", put(update).delete(remove))
}

/// Read the cart from the session. A missing or unreadable cart is empty.
pub(crate) async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Price the cart and persist it if lines for deleted products were pruned.
async fn priced(state: &AppState, session: &Session, mut cart: Cart) -> Result<Json<CartView>> {
    let before = cart.lines().len();
    let view = CheckoutService::new(state.pool(), state.site_config())
        .view(&mut cart)
        .await?;
    if cart.lines().len() != before {
        save_cart(session, &cart).await?;
    }
    Ok(Json(view))
}

#[instrument(skip(state, session))]
async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await;
    priced(&state, &session, cart).await
}

#[instrument(skip(session))]
async fn count(session: Session) -> Json<CartCount> {
    Json(CartCount {
        count: load_cart(&session).await.item_count(),
    })
}

/// Add units of an active product, merging with an existing line.
#[instrument(skip(state, session), fields(product_id = %item.product_id))]
async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(item): Json<AddItem>,
) -> Result<Json<CartView>> {
    let product = ProductRepository::new(state.pool())
        .get_active(item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", item.product_id)))?;

    let mut cart = load_cart(&session).await;
    cart.add(product.id, item.quantity, product.available_units())?;
    save_cart(&session, &cart).await?;

    let product_id = product.id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    priced(&state, &session, cart).await
}

/// Set the quantity of a line. Zero removes it.
#[instrument(skip(state, session), fields(product_id = %product_id))]
async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<SetQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;

    if body.quantity == 0 {
        cart.remove(product_id)?;
    } else {
        let stock = ProductRepository::new(state.pool())
            .get_active(product_id)
            .await?
            .map_or(0, |p| p.available_units());
        cart.set_quantity(product_id, body.quantity, stock)?;
    }

    save_cart(&session, &cart).await?;
    priced(&state, &session, cart).await
}

#[instrument(skip(state, session), fields(product_id = %product_id))]
async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    cart.remove(product_id)?;
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Removed from cart", None);
    priced(&state, &session, cart).await
}

#[instrument(skip(state, session))]
async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = Cart::new();
    save_cart(&session, &cart).await?;
    priced(&state, &session, cart).await
}
