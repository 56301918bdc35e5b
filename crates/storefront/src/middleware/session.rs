//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. The session
//! cookie is signed with `VOLTIO_SESSION_SECRET`.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::{ConfigError, StorefrontConfig};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "voltio_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired session rows are purged.
pub const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Session layer backed by `PostgreSQL` with a signed cookie.
pub type StorefrontSessionLayer = SessionManagerLayer<PostgresStore, SignedCookie>;

/// Create the session layer with `PostgreSQL` store and start purging
/// expired rows every [`SESSION_CLEANUP_INTERVAL`].
///
/// The `tower_sessions.session` table is created by the storefront migrations.
/// Must be called inside a Tokio runtime.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the session secret cannot be used
/// as a signing key.
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> Result<StorefrontSessionLayer, ConfigError> {
    let store = PostgresStore::new(pool.clone());
    let layer = build_session_layer(store.clone(), config)?;
    spawn_session_cleanup(store, SESSION_CLEANUP_INTERVAL);
    Ok(layer)
}

/// Delete expired sessions in the background. The task ends, logging the
/// error, if a sweep fails.
pub fn spawn_session_cleanup<S>(store: S, every: Duration) -> JoinHandle<()>
where
    S: ExpiredDeletion,
{
    tokio::task::spawn(async move {
        if let Err(e) = store.continuously_delete_expired(every).await {
            tracing::error!("Expired session cleanup stopped: {e}");
        }
    })
}

/// Configure a session layer around any store.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` if the session secret cannot be used
/// as a signing key.
pub fn build_session_layer<S: SessionStore>(
    store: S,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, ConfigError> {
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|e| {
        ConfigError::InsecureSecret("VOLTIO_SESSION_SECRET".to_string(), e.to_string())
    })?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
