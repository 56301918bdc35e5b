//! Cached access to the site configuration document.
//!
//! Every cart view and checkout needs the pricing rules, so the document is
//! held in a `moka` cache (5 minute TTL) and refreshed on save.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::db::settings::{self, SettingsError};
use crate::models::SiteConfig;
use crate::models::site_config::SITE_CONFIG_KEY;

/// Cached site configuration.
#[derive(Clone)]
pub struct ConfigService {
    cache: Cache<&'static str, Arc<SiteConfig>>,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self { cache }
    }

    /// Current configuration. A missing document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the document cannot be loaded or decoded.
    pub async fn get(&self, pool: &PgPool) -> Result<Arc<SiteConfig>, SettingsError> {
        if let Some(config) = self.cache.get(SITE_CONFIG_KEY).await {
            return Ok(config);
        }

        let config = Arc::new(
            settings::get_typed::<SiteConfig>(pool, SITE_CONFIG_KEY)
                .await?
                .unwrap_or_default(),
        );
        self.cache.insert(SITE_CONFIG_KEY, Arc::clone(&config)).await;
        Ok(config)
    }

    /// Persist a validated configuration and refresh the cache.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the document cannot be saved.
    pub async fn save(&self, pool: &PgPool, config: SiteConfig) -> Result<Arc<SiteConfig>, SettingsError> {
        settings::set_typed(pool, SITE_CONFIG_KEY, &config).await?;

        let config = Arc::new(config);
        self.cache.insert(SITE_CONFIG_KEY, Arc::clone(&config)).await;
        tracing::info!(maintenance = config.maintenance_mode, "site configuration updated");
        Ok(config)
    }
}
