//! Signed-in user's profile.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, ProfileUpdate, User, session_keys};
use crate::services::AuthService;
use crate::services::auth::PasswordChange;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(show).put(update))
        .route("/profile/password", put(change_password))
}

#[instrument(skip(state, current), fields(user_id = %current.id))]
async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(user))
}

/// Save name, phone and address. The session copy of the name is refreshed.
#[instrument(skip(state, session, current, form), fields(user_id = %current.id))]
async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(form): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    let profile = form.validate()?;
    let user = UserRepository::new(state.pool())
        .update_profile(current.id, &profile)
        .await?;

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state, current, form), fields(user_id = %current.id))]
async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(form): Json<PasswordChange>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(current.id, &form)
        .await?;
    tracing::info!(user_id = %current.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
