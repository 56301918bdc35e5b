//! Account management.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tracing::instrument;

use voltio_core::catalog::{Page, Pagination};
use voltio_core::validation::{self, FieldErrors};
use voltio_core::{UserId, UserRole};

use super::{Removed, search_term};
use crate::db::UserRepository;
use crate::db::users::{UserAdminUpdate, UserFilter, UserRemoval};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Admin edit payload. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UserEdit {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

impl UserEdit {
    fn validate(self) -> std::result::Result<UserAdminUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .and_then(|n| errors.check("name", validation::required(&n, 100)));
        errors.into_result()?;
        Ok(UserAdminUpdate {
            name,
            role: self.role,
            active: self.active,
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(index))
        .route("/users/{id}", get(show).put(update).delete(remove))
}

/// Reject edits that would lock the acting admin out of the back-office.
fn check_self_edit(admin: &User, id: UserId, update: &UserAdminUpdate) -> Result<()> {
    if admin.id != id {
        return Ok(());
    }
    if update.role.is_some_and(|r| !r.is_admin()) {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_string(),
        ));
    }
    if update.active == Some(false) {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Page<User>>> {
    let filter = UserFilter {
        search: search_term(query.search),
        role: query.role,
        active: query.active,
    };
    let page = UserRepository::new(state.pool())
        .list(&filter, Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(page))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id, user_id = %id))]
async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

#[instrument(skip(admin, state, edit), fields(admin_id = %admin.id, user_id = %id))]
async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(edit): Json<UserEdit>,
) -> Result<Json<User>> {
    let update = edit.validate()?;
    check_self_edit(&admin, id, &update)?;

    let user = UserRepository::new(state.pool())
        .admin_update(id, &update)
        .await?;
    tracing::info!(
        user_id = %user.id,
        role = %user.role,
        active = user.active,
        "account updated by admin"
    );
    Ok(Json(user))
}

/// Delete an account. Accounts with orders are deactivated instead.
#[instrument(skip(admin, state), fields(admin_id = %admin.id, user_id = %id))]
async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<Removed<UserId, UserRemoval>>> {
    if admin.id == id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let outcome = UserRepository::new(state.pool())
        .delete_or_deactivate(id)
        .await?;
    tracing::info!(user_id = %id, ?outcome, "account removed by admin");
    Ok(Json(Removed { id, outcome }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use voltio_core::Email;

    use super::*;

    fn admin() -> User {
        User {
            id: UserId::new(7),
            email: Email::parse("ana@voltio.mx").unwrap(),
            name: "Ana".to_owned(),
            phone: None,
            street: None,
            city: None,
            postal_code: None,
            role: UserRole::Admin,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_cannot_demote_or_deactivate_self() {
        let demote = UserAdminUpdate {
            role: Some(UserRole::Customer),
            ..UserAdminUpdate::default()
        };
        assert!(check_self_edit(&admin(), UserId::new(7), &demote).is_err());

        let deactivate = UserAdminUpdate {
            active: Some(false),
            ..UserAdminUpdate::default()
        };
        assert!(check_self_edit(&admin(), UserId::new(7), &deactivate).is_err());

        let rename = UserAdminUpdate {
            name: Some("Ana María".to_owned()),
            ..UserAdminUpdate::default()
        };
        assert!(check_self_edit(&admin(), UserId::new(7), &rename).is_ok());
    }

    #[test]
    fn test_admin_can_change_other_accounts() {
        let demote = UserAdminUpdate {
            role: Some(UserRole::Customer),
            active: Some(false),
            ..UserAdminUpdate::default()
        };
        assert!(check_self_edit(&admin(), UserId::new(8), &demote).is_ok());
    }

    #[test]
    fn test_edit_validates_name() {
        let edit = UserEdit {
            name: Some("   ".to_owned()),
            ..UserEdit::default()
        };
        assert!(edit.validate().unwrap_err().get("name").is_some());

        let edit = UserEdit {
            name: Some("  Beto ".to_owned()),
            ..UserEdit::default()
        };
        assert_eq!(edit.validate().unwrap().name.as_deref(), Some("Beto"));
    }
}
