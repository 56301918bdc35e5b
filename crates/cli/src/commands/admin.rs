//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! voltio admin create -e ana@voltio.mx -n "Ana López" -p 'a-long-passphrase'
//!
//! # Promote an existing customer account
//! voltio admin promote -e beto@example.com
//! ```

use voltio_core::{Email, UserRole};
use voltio_storefront::db::UserRepository;
use voltio_storefront::services::AuthService;
use voltio_storefront::services::auth::Registration;

use super::{CommandError, connect};

/// Create an admin account with a password.
///
/// # Errors
///
/// Returns `CommandError::Auth` if the form is invalid or the email is taken.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), CommandError> {
    let pool = connect().await?;

    let form = Registration {
        email: email.to_owned(),
        password: password.to_owned(),
        name: name.to_owned(),
    };
    let user = AuthService::new(&pool)
        .create_account(&form, UserRole::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin account created");
    Ok(())
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for a malformed email and
/// `CommandError::Repository` if no account matches.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, UserRole::Admin)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Account promoted to admin");
    Ok(())
}
