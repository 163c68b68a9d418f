//! Service configuration.
//!
//! Resolved once at startup from, in increasing precedence: built-in defaults,
//! an optional TOML file, `MEI_*` environment variables, and command-line
//! flags (applied by the binary).

use std::path::{Path, PathBuf};

use mei_core::calculations::{FREE_LIMIT, QuotaConfig};
use mei_core::db::DbConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub quota: QuotaSettings,
    pub billing: BillingConfig,
    pub auth: AuthConfig,
    pub brackets: BracketsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSettings {
    pub free_limit: u32,
    /// Unset means "meter only when billing is configured".
    pub metering_enabled: Option<bool>,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            free_limit: FREE_LIMIT,
            metering_enabled: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub stripe_secret_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the authenticated subject, set by the identity layer
    /// in front of this service.
    pub user_header: String,
    pub email_header: String,
    /// Bearer token for `/api/admin`. Admin routes reject everything when
    /// unset.
    pub admin_token: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
            email_header: "x-user-email".to_string(),
            admin_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketsConfig {
    /// CSV with tax years to append to the built-in table.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults, or `path` when given, with the process environment applied.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from `MEI_*` variables (and `STRIPE_SECRET_KEY`)
    /// looked up through `var`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("MEI_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("MEI_PORT") {
            self.server.port = parse_var("MEI_PORT", &port)?;
        }
        if let Some(backend) = get("MEI_DATABASE_BACKEND") {
            self.database.backend = backend;
        }
        if let Some(url) = get("MEI_DATABASE_URL") {
            self.database.connection_string = url;
        }
        if let Some(limit) = get("MEI_FREE_LIMIT") {
            self.quota.free_limit = parse_var("MEI_FREE_LIMIT", &limit)?;
        }
        if let Some(enabled) = get("MEI_METERING_ENABLED") {
            self.quota.metering_enabled = Some(parse_var("MEI_METERING_ENABLED", &enabled)?);
        }
        if let Some(token) = get("MEI_ADMIN_TOKEN") {
            self.auth.admin_token = Some(token);
        }
        if let Some(file) = get("MEI_BRACKETS_FILE") {
            self.brackets.file = Some(PathBuf::from(file));
        }
        if let Some(level) = get("MEI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(key) = get("STRIPE_SECRET_KEY") {
            self.billing.stripe_secret_key = Some(key);
        }
        Ok(())
    }

    /// Metering is on iff a billing key is configured, unless
    /// `quota.metering_enabled` says otherwise.
    pub fn quota_config(&self) -> QuotaConfig {
        let billing_configured = self
            .billing
            .stripe_secret_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());

        QuotaConfig {
            free_limit: self.quota.free_limit,
            metering_enabled: self.quota.metering_enabled.unwrap_or(billing_configured),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    // =========================================================================
    // file parsing
    // =========================================================================

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.user_header, "x-user-id");
        assert_eq!(config.quota.free_limit, 10);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [database]
            url = "calcula-mei.db"

            [quota]
            free_limit = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, "calcula-mei.db");
        assert_eq!(config.quota.free_limit, 3);
        assert_eq!(config.quota.metering_enabled, None);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let result = AppConfig::from_toml("[server]\nport = \"eighty\"");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = AppConfig::from_file(Path::new("/definitely/not/here.toml"));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    // =========================================================================
    // environment overrides
    // =========================================================================

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();

        config
            .apply_env(env(&[
                ("MEI_HOST", "127.0.0.1"),
                ("MEI_PORT", "3000"),
                ("MEI_DATABASE_URL", "/var/lib/mei.db"),
                ("MEI_FREE_LIMIT", "5"),
                ("MEI_ADMIN_TOKEN", "s3cret"),
                ("MEI_BRACKETS_FILE", "brackets.csv"),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.connection_string, "/var/lib/mei.db");
        assert_eq!(config.quota.free_limit, 5);
        assert_eq!(config.auth.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.brackets.file, Some(PathBuf::from("brackets.csv")));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();

        config.apply_env(env(&[("MEI_HOST", ""), ("STRIPE_SECRET_KEY", "  ")])).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.billing.stripe_secret_key, None);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = AppConfig::default();

        let result = config.apply_env(env(&[("MEI_PORT", "http")]));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "MEI_PORT", .. })
        ));
    }

    // =========================================================================
    // quota resolution
    // =========================================================================

    #[test]
    fn metering_off_without_billing_key() {
        let config = AppConfig::default();

        assert!(!config.quota_config().metering_enabled);
    }

    #[test]
    fn metering_on_with_billing_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("STRIPE_SECRET_KEY", "sk_test_123")])).unwrap();

        let quota = config.quota_config();

        assert!(quota.metering_enabled);
        assert_eq!(quota.free_limit, FREE_LIMIT);
    }

    #[test]
    fn explicit_setting_beats_billing_detection() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("MEI_METERING_ENABLED", "true"), ("MEI_FREE_LIMIT", "2")]))
            .unwrap();

        assert_eq!(
            config.quota_config(),
            QuotaConfig {
                free_limit: 2,
                metering_enabled: true,
            }
        );
    }
}
