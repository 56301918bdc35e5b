//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use voltio_core::catalog::{Page, Pagination, like_pattern};
use voltio_core::{Email, UserId, UserRole};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{User, ValidProfile};

const USER_COLUMNS: &str = "id, email, name, phone, street, city, postal_code, role, active, \
                            created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    name: String,
    phone: Option<String>,
    street: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    role: UserRole,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            phone: r.phone,
            street: r.street,
            city: r.city,
            postal_code: r.postal_code,
            role: r.role,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Admin user listing filters.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Matches name or email.
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

/// Fields an admin may change on another account.
#[derive(Debug, Clone, Default)]
pub struct UserAdminUpdate {
    pub name: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, sqlx::FromRow)]
pub struct UserCounts {
    pub total: i64,
    pub customers: i64,
    pub admins: i64,
    pub inactive: i64,
}

/// Outcome of an admin delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRemoval {
    Deleted,
    /// The account has orders, so it was deactivated instead.
    Deactivated,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO shop.user (email, name, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        Ok(row.into())
    }

    /// Get the stored password hash and active flag for a login attempt.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, Row>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.user WHERE LOWER(email) = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (r.user.into(), r.password_hash)))
    }

    /// Get a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM shop.user WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(hash)
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.user SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Save the user's own profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: UserId,
        profile: &ValidProfile,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.user
             SET name = $2, phone = $3, street = $4, city = $5, postal_code = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.phone)
        .bind(&profile.street)
        .bind(&profile.city)
        .bind(&profile.postal_code)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    /// Apply an admin edit. Unset fields keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn admin_update(
        &self,
        id: UserId,
        update: &UserAdminUpdate,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.user
             SET name = COALESCE($2, name),
                 role = COALESCE($3, role),
                 active = COALESCE($4, active),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&update.name)
        .bind(update.role)
        .bind(update.active)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    /// Set a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE shop.user SET role = $2, updated_at = NOW()
             WHERE LOWER(email) = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(role)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an account, or deactivate it when orders reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete_or_deactivate(&self, id: UserId) -> Result<UserRemoval, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_orders = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM shop.order WHERE user_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let (sql, removal) = if has_orders {
            (
                "UPDATE shop.user SET active = FALSE, updated_at = NOW() WHERE id = $1",
                UserRemoval::Deactivated,
            )
        } else {
            ("DELETE FROM shop.user WHERE id = $1", UserRemoval::Deleted)
        };

        let result = sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(removal)
    }

    /// List accounts for the admin panel, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &UserFilter,
        pagination: Pagination,
    ) -> Result<Page<User>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.user WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            total,
            pagination,
        ))
    }

    /// Account counts for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<UserCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, UserCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE role = 'cliente') AS customers,
                    COUNT(*) FILTER (WHERE role = 'admin') AS admins,
                    COUNT(*) FILTER (WHERE NOT active) AS inactive
             FROM shop.user",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role);
    }
    if let Some(active) = filter.active {
        builder.push(" AND active = ").push_bind(active);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_leaves_query_alone() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.user WHERE TRUE");
        push_filters(&mut builder, &UserFilter::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM shop.user WHERE TRUE");
    }

    #[test]
    fn test_all_filters_bind_in_order() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM shop.user WHERE TRUE");
        push_filters(
            &mut builder,
            &UserFilter {
                search: Some("ana".to_owned()),
                role: Some(UserRole::Admin),
                active: Some(true),
            },
        );
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM shop.user WHERE TRUE AND (name ILIKE $1 OR email ILIKE $2) \
             AND role = $3 AND active = $4"
        );
    }
}
