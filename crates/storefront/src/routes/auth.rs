//! Authentication route handlers.
//!
//! Sign-in state is a single HTTP-only session cookie. The cart stays in the
//! session across sign-in and sign-out.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::extract::Json;
use crate::middleware::{
    OptionalAuth, RequireAuth, auth_rate_limiter, clear_current_user, set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::services::auth::{Credentials, Registration};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// Create a customer account and sign it in.
#[instrument(skip(state, session, form))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool()).register(&form).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Account created", None);
    tracing::info!(user_id = %user.id, "account registered");

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<Credentials>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).login(&form).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);
    tracing::info!(user_id = %user.id, role = %user.role.as_str(), "signed in");

    Ok(Json(user))
}

/// Sign out. Succeeds even when nobody is signed in.
#[instrument(skip(session, user))]
async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<StatusCode> {
    if let Some(user) = user {
        clear_current_user(&session).await?;
        tracing::info!(user_id = %user.id, "signed out");
    }
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in account as currently stored.
#[instrument(skip(state, current), fields(user_id = %current.id))]
async fn me(State(state): State<AppState>, RequireAuth(current): RequireAuth) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(user))
}
