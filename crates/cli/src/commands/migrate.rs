//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! voltio migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded into
//! the storefront crate at build time.

use super::{CommandError, connect};

/// Run the storefront migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    voltio_storefront::db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
