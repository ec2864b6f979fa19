//! # configs
//!
//! Runtime settings, loaded once at startup and passed down explicitly.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `config/{APP_ENV}.toml` (optional, `APP_ENV` defaults to `development`)
//! 4. environment variables such as `BLOB__DATABASE__URL` or `BLOB__SERVER__PORT`
//!
//! A `.env` file in the working directory is read before the environment is consulted.

pub mod telemetry;

use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const ENV_PREFIX: &str = "BLOB";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub log: LogSettings,
    pub purge: PurgeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "secret_string")]
    pub url: SecretString,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PurgeSettings {
    pub retention_hours: u32,
}

impl PurgeSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_hours) * 3600)
    }
}

fn secret_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// Built-in defaults. Everything has one except `database.url`, which is left empty
/// and rejected by [`Settings::validate`].
pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.cors_origins", Vec::<String>::new())?
        .set_default("database.url", "")?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("database.acquire_timeout_secs", 30)?
        .set_default("database.run_migrations", true)?
        .set_default("log.filter", "info")?
        .set_default("log.format", "json")?
        .set_default("purge.retention_hours", 24)?)
}

impl Settings {
    /// Loads and validates settings from every source.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(error = %err, "ignoring unreadable .env file");
            }
        }
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let builder = defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.server.port == 0 {
            return Err(invalid("server.port", "must be non-zero"));
        }
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(invalid("database.url", "must be set"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be at least 1"));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(invalid(
                "database.min_connections",
                format!("exceeds max_connections ({})", self.database.max_connections),
            ));
        }
        if self.purge.retention_hours == 0 {
            return Err(invalid("purge.retention_hours", "must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn with_url() -> ConfigBuilder<DefaultState> {
        defaults()
            .unwrap()
            .set_override("database.url", "postgres://localhost/blobs")
            .unwrap()
    }

    #[test]
    fn defaults_load_once_url_is_set() {
        let settings = Settings::from_builder(with_url()).unwrap();
        assert_eq!(settings.server.bind_addr(), "0.0.0.0:3000");
        assert_eq!(settings.log.format, LogFormat::Json);
        assert_eq!(settings.purge.retention(), Duration::from_secs(24 * 3600));
        assert_eq!(
            settings.database.url.expose_secret(),
            "postgres://localhost/blobs"
        );
    }

    #[test]
    fn missing_database_url_is_rejected() {
        let err = Settings::from_builder(defaults().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "database.url", .. }));
    }

    #[test]
    fn zero_retention_is_rejected() {
        let builder = with_url().set_override("purge.retention_hours", 0).unwrap();
        let err = Settings::from_builder(builder).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "purge.retention_hours",
                ..
            }
        ));
    }

    #[test]
    fn pool_bounds_are_checked() {
        let builder = with_url()
            .set_override("database.max_connections", 2)
            .unwrap()
            .set_override("database.min_connections", 5)
            .unwrap();
        assert!(Settings::from_builder(builder).is_err());
    }

    #[test]
    fn unknown_log_format_fails_to_load() {
        let builder = with_url().set_override("log.format", "xml").unwrap();
        assert!(matches!(
            Settings::from_builder(builder),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn secret_url_is_redacted_in_debug() {
        let settings = Settings::from_builder(with_url()).unwrap();
        assert!(!format!("{settings:?}").contains("postgres://localhost/blobs"));
    }
}
