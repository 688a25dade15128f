//! Configuration loading

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Secret used when none is configured; startup warns about it.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
/// Secrets shorter than this are reported as insecure
pub const MIN_SECRET_LENGTH: usize = 32;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body limit, applies to uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// URL prefix uploaded files are served under
    #[serde(default = "default_public_url_prefix")]
    pub public_url_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            public_url_prefix: default_public_url_prefix(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Paths under the API prefix that need no token
    #[serde(default = "artacore_auth::gate::default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default)]
    pub allow_registration: bool,
    /// `"role"` or `"flat"`
    #[serde(default = "default_policy")]
    pub policy: String,
    #[serde(default = "default_admin_email")]
    pub bootstrap_admin_email: String,
    #[serde(default = "default_admin_password")]
    pub bootstrap_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            public_prefixes: artacore_auth::gate::default_public_prefixes(),
            api_prefix: default_api_prefix(),
            allow_registration: false,
            policy: default_policy(),
            bootstrap_admin_email: default_admin_email(),
            bootstrap_admin_password: default_admin_password(),
        }
    }
}

impl AuthConfig {
    /// True if the signing secret is the built-in default or too short
    pub fn has_insecure_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET || self.jwt_secret.len() < MIN_SECRET_LENGTH
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.bootstrap_admin_password == default_admin_password()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `"pretty"` or `"json"`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024 // 50 MiB
}

fn default_db_path() -> String {
    "./data/artacore.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_storage_path() -> String {
    "./data/uploads".to_string()
}

fn default_public_url_prefix() -> String {
    "/uploads".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_api_prefix() -> String {
    artacore_auth::gate::DEFAULT_API_PREFIX.to_string()
}

fn default_policy() -> String {
    "role".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from file, falling back to defaults if it is absent
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        if !self.auth.api_prefix.starts_with('/') {
            bail!("auth.api_prefix must start with '/'");
        }
        if artacore_auth::policy_from_name(&self.auth.policy).is_none() {
            bail!(
                "auth.policy must be \"role\" or \"flat\", got {:?}",
                self.auth.policy
            );
        }
        if self.storage.public_url_prefix.trim_matches('/').is_empty() {
            bail!("storage.public_url_prefix must name a path below '/'");
        }
        if self
            .storage
            .public_url_prefix
            .starts_with(self.auth.api_prefix.as_str())
        {
            bail!("storage.public_url_prefix must be outside auth.api_prefix");
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            );
        }
        Ok(())
    }
}
