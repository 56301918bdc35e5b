//! Public FAQ listing.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use crate::db::FaqRepository;
use crate::error::Result;
use crate::extract::{Json, Query};
use crate::models::Faq;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FaqQuery {
    pub category: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/faq", get(index))
}

#[instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> Result<Json<Vec<Faq>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let faqs = FaqRepository::new(state.pool())
        .list_published(category)
        .await?;
    Ok(Json(faqs))
}
