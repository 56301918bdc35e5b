//! Key/value settings stored as JSON documents.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Get a raw setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get_setting(pool: &PgPool, key: &str) -> Result<Option<JsonValue>, SettingsError> {
    let value = sqlx::query_scalar::<_, JsonValue>("SELECT value FROM shop.setting WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value)
}

/// Set a raw setting value.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn set_setting(pool: &PgPool, key: &str, value: &JsonValue) -> Result<(), SettingsError> {
    sqlx::query(
        "INSERT INTO shop.setting (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a setting decoded into `T`.
///
/// # Errors
///
/// Returns an error if the query fails or the stored JSON does not fit `T`.
pub async fn get_typed<T: DeserializeOwned>(
    pool: &PgPool,
    key: &str,
) -> Result<Option<T>, SettingsError> {
    match get_setting(pool, key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Store `value` under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the query fails.
pub async fn set_typed<T: Serialize + Sync>(
    pool: &PgPool,
    key: &str,
    value: &T,
) -> Result<(), SettingsError> {
    let json = serde_json::to_value(value)?;
    set_setting(pool, key, &json).await
}
