use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "CATALOG_ENV";
const CONFIG_DIR_ENV: &str = "CATALOG_CONFIG_DIR";
const ENV_PREFIX: &str = "CATALOG";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub library: LibrarySettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    ///
    /// Environment variables use the `CATALOG_` prefix and `__` between nested
    /// keys, e.g. `CATALOG_STORAGE__DATA_DIR=/var/lib/catalog`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = environment.parse()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Catalog-level settings.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LibrarySettings {
    /// Display name; the library falls back to its own default when unset.
    #[serde(default)]
    pub name: Option<String>,
}

/// Where the catalog's storage slots live.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "StorageSettings::default_data_dir")]
    pub data_dir: PathBuf,
}

impl StorageSettings {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("data")
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    /// Append-only `{id},{name}` registration log.
    #[serde(default = "AdminSettings::default_registrations_path")]
    pub registrations_path: PathBuf,
}

impl AdminSettings {
    fn default_registrations_path() -> PathBuf {
        PathBuf::from("data/users.txt")
    }
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            registrations_path: Self::default_registrations_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_storage_lives_under_data() {
        let settings = Settings::default();
        assert_eq!(settings.storage.data_dir, PathBuf::from("data"));
        assert_eq!(
            settings.admin.registrations_path,
            PathBuf::from("data/users.txt")
        );
    }

    #[test]
    fn library_name_is_unset_by_default() {
        assert!(Settings::default().library.name.is_none());
    }

    #[test]
    fn environment_parses_known_names() {
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn sections_deserialize_with_defaults() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "server": { "port": 9090 },
            "library": { "name": "City Central Digital Library" },
            "telemetry": { "log_format": "json" }
        }))
        .unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(
            settings.library.name.as_deref(),
            Some("City Central Digital Library")
        );
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
        assert_eq!(settings.telemetry.filter, "info");
    }
}
