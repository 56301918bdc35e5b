//! Authentication service.
//!
//! Email and password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use voltio_core::validation::{self, FieldErrors};
use voltio_core::{UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Change-password form.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        self.create_account(form, UserRole::Customer).await
    }

    /// Create an account with an explicit role. Used by the operator CLI.
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_account(&self, form: &Registration, role: UserRole) -> Result<User, AuthError> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", validation::email(&form.email));
        errors.check("password", validation::password(&form.password));
        let name = errors.check("name", validation::required(&form.name, 100));

        let (Some(email), Some(name)) = (email, name) else {
            return Err(errors.into());
        };
        errors.into_result()?;

        let password_hash = hash_password(&form.password)?;

        self.users
            .create(&email, &name, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or the account has been deactivated.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        let email =
            validation::email(&credentials.email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&credentials.password, &password_hash)?;

        if !user.active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Change a signed-in user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if the current password is wrong or the
    /// new one is too weak.
    pub async fn change_password(
        &self,
        user_id: UserId,
        change: &PasswordChange,
    ) -> Result<(), AuthError> {
        let current_hash = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let mut errors = FieldErrors::new();
        if verify_password(&change.current_password, &current_hash).is_err() {
            errors.add("current_password", "current password is incorrect");
        }
        errors.check("new_password", validation::password(&change.new_password));
        if change.new_password == change.current_password {
            errors.add("new_password", "must differ from the current password");
        }
        errors.into_result()?;

        let new_hash = hash_password(&change.new_password)?;
        self.users.update_password(user_id, &new_hash).await?;
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("voltio2024").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("voltio2024", &hash).is_ok());
        assert!(matches!(
            verify_password("voltio2025", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("voltio2024").unwrap();
        let b = hash_password("voltio2024").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything1", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
