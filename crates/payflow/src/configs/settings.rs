//! Layered application configuration.
//!
//! Values come from `config/development.toml` (or the file named by
//! `PAYFLOW_CONFIG_PATH`), overridden by `PAYFLOW__`-prefixed environment
//! variables, overridden by the four well-known deployment variables:
//! `DATABASE_URL`, `SECRET_KEY`, `WEBHOOK_SIGNING_SECRET`, `FRONTEND_URL`.

use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};
use payflow_env::logger::LogFormat;
use serde::Deserialize;

use crate::core::errors::{ApplicationError, ApplicationResult};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub secrets: Secrets,
    pub checkout: Checkout,
    pub log: Log,
    pub webhooks: WebhookDelivery,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// HTTP worker threads; the connection pool is sized to match.
    pub workers: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            workers: num_cpus::get(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: Secret<String>,
    pub pool_size: u32,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: Secret::default(),
            pool_size: 10,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Secrets {
    /// HS256 signing key for dashboard tokens; at least 32 bytes.
    pub secret_key: Secret<String>,
    /// Fallback webhook signing secret for merchants without one.
    pub webhook_signing_secret: Secret<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Checkout {
    /// Base URL of the hosted checkout front-end.
    pub frontend_url: String,
}

impl Default for Checkout {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    pub format: LogFormat,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WebhookDelivery {
    /// Number of dispatcher workers draining the outbox.
    pub workers: usize,
    pub poll_interval_ms: u64,
    pub batch_size: i64,
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self {
            workers: 4,
            poll_interval_ms: 1000,
            batch_size: 10,
        }
    }
}

impl Settings {
    pub fn new() -> ApplicationResult<Self> {
        let config_path = std::env::var("PAYFLOW_CONFIG_PATH")
            .unwrap_or_else(|_| "config/development.toml".to_string());

        let mut settings: Self = config::Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(config::Environment::with_prefix("PAYFLOW").separator("__"))
            .build()
            .change_context(ApplicationError::ConfigurationError)?
            .try_deserialize()
            .change_context(ApplicationError::ConfigurationError)?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            settings.database.url = url.into();
        }
        if let Ok(secret_key) = std::env::var("SECRET_KEY") {
            settings.secrets.secret_key = secret_key.into();
        }
        if let Ok(signing_secret) = std::env::var("WEBHOOK_SIGNING_SECRET") {
            settings.secrets.webhook_signing_secret = signing_secret.into();
        }
        if let Ok(frontend_url) = std::env::var("FRONTEND_URL") {
            settings.checkout.frontend_url = frontend_url;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ApplicationResult<()> {
        common_utils::fp_utils::when(self.database.url.peek().is_empty(), || {
            Err(report!(ApplicationError::InvalidConfigurationValueError(
                "database URL must not be empty".to_string(),
            )))
        })?;
        common_utils::fp_utils::when(self.secrets.secret_key.peek().len() < 32, || {
            Err(report!(ApplicationError::InvalidConfigurationValueError(
                "SECRET_KEY must be at least 32 bytes".to_string(),
            )))
        })?;
        common_utils::fp_utils::when(self.checkout.frontend_url.is_empty(), || {
            Err(report!(ApplicationError::InvalidConfigurationValueError(
                "frontend URL must not be empty".to_string(),
            )))
        })?;
        common_utils::fp_utils::when(self.webhooks.workers == 0, || {
            Err(report!(ApplicationError::InvalidConfigurationValueError(
                "webhook delivery needs at least one worker".to_string(),
            )))
        })
    }
}
