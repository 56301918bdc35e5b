//! FAQ management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use voltio_core::FaqId;

use crate::db::FaqRepository;
use crate::error::Result;
use crate::extract::{Json, Path};
use crate::middleware::RequireAdmin;
use crate::models::{Faq, FaqInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faqs", get(index).post(create))
        .route("/faqs/{id}", put(update).delete(remove))
}

/// All entries, drafts included.
#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Faq>>> {
    Ok(Json(FaqRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(admin, state, input), fields(admin_id = %admin.id))]
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<FaqInput>,
) -> Result<(StatusCode, Json<Faq>)> {
    let input = input.validate()?;
    let faq = FaqRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

#[instrument(skip(admin, state, input), fields(admin_id = %admin.id, faq_id = %id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
    Json(input): Json<FaqInput>,
) -> Result<Json<Faq>> {
    let input = input.validate()?;
    let faq = FaqRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(faq))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, faq_id = %id))]
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<FaqId>,
) -> Result<StatusCode> {
    FaqRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
