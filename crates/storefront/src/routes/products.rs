//! Public catalog routes.

use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use voltio_core::ProductId;
use voltio_core::catalog::{CatalogQuery, Page};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::Product;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index))
        .route("/products/{id}", get(show))
}

/// Active products matching the filters.
#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Product>>> {
    query.validate()?;
    let page = ProductRepository::new(state.pool()).catalog(&query).await?;
    Ok(Json(page))
}

/// A single active product. Hidden products are reported as missing.
#[instrument(skip(state), fields(product_id = %id))]
async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
