//! Public site configuration and category listing.

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use voltio_core::Category;

use crate::db::ProductRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::models::PublicSiteConfig;
use crate::state::AppState;

/// A category with its display label and number of active products.
#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub label: &'static str,
    pub count: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(config))
        .route("/categories", get(categories))
}

/// Store name, contact details and pricing rules shown to shoppers.
#[instrument(skip(state))]
async fn config(State(state): State<AppState>) -> Result<Json<PublicSiteConfig>> {
    let config = state.site_config().get(state.pool()).await?;
    Ok(Json(PublicSiteConfig::from(config.as_ref())))
}

#[instrument(skip(state))]
async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>> {
    let counts = ProductRepository::new(state.pool())
        .category_counts()
        .await?;

    Ok(Json(
        counts
            .into_iter()
            .map(|c| CategorySummary {
                category: c.category,
                label: c.category.label(),
                count: c.count,
            })
            .collect(),
    ))
}
