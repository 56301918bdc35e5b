//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a signed-in user or an administrator in
//! route handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// The account is reloaded on every request, so a deleted or deactivated
/// account is signed out at once. Rejects with 401 if nobody is signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        signed_in_user(parts, state)
            .await?
            .map(|user| Self(CurrentUser::from(&user)))
            .ok_or_else(sign_in_required)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed
/// in. A session whose account is gone reads as a guest.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = signed_in_user(parts, state).await?;
        Ok(Self(user.as_ref().map(CurrentUser::from)))
    }
}

/// Extractor that requires an active administrator.
///
/// The role is read from the database, not the session, so promotions and
/// demotions apply on the next request. Rejects with 401 when nobody is
/// signed in and 403 otherwise.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = signed_in_user(parts, state)
            .await?
            .ok_or_else(sign_in_required)?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden("Administrator access required".to_string()));
        }
        Ok(Self(user))
    }
}

fn sign_in_required() -> AppError {
    AppError::Unauthorized("Please sign in".to_string())
}

/// Only active accounts keep their session.
fn usable_account(found: Option<User>) -> Option<User> {
    found.filter(|user| user.active)
}

/// Load the account behind the session.
///
/// A missing or inactive account is removed from the session. A stale
/// snapshot (renamed, promoted, demoted) is rewritten in place.
async fn signed_in_user(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let Some(snapshot) = session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
    else {
        return Ok(None);
    };

    let found = UserRepository::new(state.pool())
        .get_by_id(snapshot.id)
        .await?;
    let Some(user) = usable_account(found) else {
        tracing::info!(user_id = %snapshot.id, "Signing out session of missing or inactive account");
        clear_current_user(session).await?;
        return Ok(None);
    };

    let fresh = CurrentUser::from(&user);
    if fresh != snapshot {
        session.insert(session_keys::CURRENT_USER, &fresh).await?;
    }
    Ok(Some(user))
}

/// Store the signed-in user in the session, rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout). The cart is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use voltio_core::{Email, UserId, UserRole};

    use super::*;

    fn account(active: bool) -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("rosa@example.com").unwrap(),
            name: "Rosa".to_string(),
            phone: None,
            street: None,
            city: None,
            postal_code: None,
            role: UserRole::Customer,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_active_account_keeps_session() {
        assert_eq!(usable_account(Some(account(true))).map(|u| u.id), Some(UserId::new(7)));
    }

    #[test]
    fn test_deactivated_or_deleted_account_is_signed_out() {
        assert!(usable_account(Some(account(false))).is_none());
        assert!(usable_account(None).is_none());
    }
}
