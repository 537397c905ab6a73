//! Application configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session token configuration.
    pub auth: AuthConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub access_secret: String,
    /// HMAC secret for refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
    /// Mark session cookies `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,
    /// Email addresses that are granted the admin role on registration.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory uploaded files are written to.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// URL prefix uploaded files are served under.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_access_ttl() -> i64 {
    60 * 60
}

const fn default_refresh_ttl() -> i64 {
    7 * 24 * 60 * 60
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_storage_url() -> String {
    "/files".to_string()
}

const fn default_max_file_size() -> usize {
    10 * 1024 * 1024
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `BOROHUB_ENV`)
    /// 4. Environment variables with `BOROHUB__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("BOROHUB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BOROHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = config::Config::builder()
            .set_override("server.url", "http://localhost:3000")
            .unwrap()
            .set_override("database.url", "postgres://localhost/borohub")
            .unwrap()
            .set_override("auth.access_secret", "a")
            .unwrap()
            .set_override("auth.refresh_secret", "r")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.access_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_ttl_secs, 604_800);
        assert!(!config.auth.secure_cookies);
        assert!(config.auth.admin_emails.is_empty());
        assert_eq!(config.storage.base_url, "/files");
    }
}
