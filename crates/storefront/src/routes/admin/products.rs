//! Catalog management.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use tracing::instrument;

use voltio_core::catalog::{Page, Pagination};
use voltio_core::{Category, ProductId};

use super::{Removed, search_term};
use crate::db::ProductRepository;
use crate::db::products::{ProductFilter, ProductRemoval};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductInput};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/{id}", get(show).put(update).delete(remove))
}

/// Every product, hidden ones included.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let filter = ProductFilter {
        search: search_term(query.search),
        category: query.category,
        active: query.active,
    };
    let page = ProductRepository::new(state.pool())
        .list(&filter, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, product_id = %id))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[instrument(skip(admin, state, input), fields(admin_id = %admin.id))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, name = %product.name, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(admin, state, input), fields(admin_id = %admin.id, product_id = %id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let input = input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;
    tracing::info!(product_id = %product.id, "product updated");
    Ok(Json(product))
}

/// Delete a product. Products that appear on orders are hidden instead so
/// order history keeps its references.
#[instrument(skip(admin, state), fields(admin_id = %admin.id, product_id = %id))]
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Removed<ProductId, ProductRemoval>>> {
    let outcome = ProductRepository::new(state.pool())
        .delete_or_deactivate(id)
        .await?;
    tracing::info!(product_id = %id, ?outcome, "product removed");
    Ok(Json(Removed { id, outcome }))
}
