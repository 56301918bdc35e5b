//! Site configuration.

use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::models::SiteConfig;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(show).put(update))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<SiteConfig>> {
    let config = state.site_config().get(state.pool()).await?;
    Ok(Json(SiteConfig::clone(&config)))
}

/// Replace the configuration. Omitted fields fall back to their defaults.
#[instrument(skip(admin, state, config), fields(admin_id = %admin.id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(config): Json<SiteConfig>,
) -> Result<Json<SiteConfig>> {
    let config = config.validate()?;
    let saved = state.site_config().save(state.pool(), config).await?;
    Ok(Json(SiteConfig::clone(&saved)))
}
