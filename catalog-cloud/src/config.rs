//! Cloud catalog configuration

use shared::models::GLOBAL_CATALOG_SLUG;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cloud catalog configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (in-memory store when absent)
    pub database_url: Option<String>,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Slug of the tenant holding the canonical catalog
    pub global_catalog_slug: String,
    /// Buffered events per live-update channel
    pub live_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            http_port: 8080,
            environment: "development".into(),
            global_catalog_slug: GLOBAL_CATALOG_SLUG.into(),
            live_channel_capacity: 256,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let defaults = Self::default();
        let environment = var("ENVIRONMENT").unwrap_or(defaults.environment);

        let database_url = var("DATABASE_URL").filter(|s| !s.is_empty());
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        Ok(Self {
            database_url,
            http_port: var("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            environment,
            global_catalog_slug: var("GLOBAL_CATALOG_SLUG")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.global_catalog_slug),
            live_channel_capacity: var("LIVE_CHANNEL_CAPACITY")
                .and_then(|c| c.parse().ok())
                .filter(|c| *c > 0)
                .unwrap_or(defaults.live_channel_capacity),
        })
    }
}
