use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub blob: BlobConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for request bodies, asset uploads included.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-screen request budget on the device API.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Key required in `X-API-Key` on every admin route.
    #[serde(default)]
    pub admin_api_key: String,

    /// Only enable behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

/// Where asset bytes live.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// `local` (files on disk served under `/blobs`) or `http` (remote store).
    #[serde(default = "default_blob_provider")]
    pub provider: String,

    #[serde(default = "default_blob_local_dir")]
    pub local_dir: String,

    /// Base URL local blobs are published under.
    #[serde(default = "default_blob_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub remote_base_url: String,

    /// Bearer token for the remote store.
    #[serde(default)]
    pub token: String,

    #[serde(default = "default_blob_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: i32,

    #[serde(default = "default_tile_jpeg_quality")]
    pub tile_jpeg_quality: u8,

    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: i32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            tile_jpeg_quality: default_tile_jpeg_quality(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

impl From<&ContentConfig> for domain::services::ContentSettings {
    fn from(config: &ContentConfig) -> Self {
        Self {
            tile_jpeg_quality: config.tile_jpeg_quality,
            max_duration_secs: config.max_duration_secs,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_body_size() -> usize {
    50 * 1_048_576
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    120
}
fn default_blob_provider() -> String {
    "local".to_string()
}
fn default_blob_local_dir() -> String {
    "data/blobs".to_string()
}
fn default_blob_public_base_url() -> String {
    "http://localhost:8080/blobs".to_string()
}
fn default_blob_timeout_ms() -> u64 {
    30_000
}
fn default_duration_secs() -> i32 {
    10
}
fn default_tile_jpeg_quality() -> u8 {
    domain::services::image_split::DEFAULT_TILE_QUALITY
}
fn default_max_duration_secs() -> i32 {
    domain::models::playlist::MAX_DURATION_SECS
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with SIGNAGE__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SIGNAGE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 60
            max_body_size = 52428800

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 120
            admin_api_key = "test-admin-key"

            [blob]
            provider = "local"
            local_dir = "data/blobs"
            public_base_url = "http://localhost:8080/blobs"
            timeout_ms = 30000

            [content]
            default_duration_secs = 10
            tile_jpeg_quality = 90
            max_duration_secs = 86400
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Validation is left to the caller so partial configs can be inspected
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SIGNAGE__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.security.admin_api_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "SIGNAGE__SECURITY__ADMIN_API_KEY environment variable must be set".to_string(),
            ));
        }

        if !(1..=100).contains(&self.content.tile_jpeg_quality) {
            return Err(ConfigValidationError::InvalidValue(
                "content.tile_jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.content.max_duration_secs < 1
            || !(1..=self.content.max_duration_secs).contains(&self.content.default_duration_secs)
        {
            return Err(ConfigValidationError::InvalidValue(
                "content.default_duration_secs must be between 1 and content.max_duration_secs"
                    .to_string(),
            ));
        }

        match self.blob.provider.as_str() {
            "local" => {
                if self.blob.local_dir.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "blob.local_dir is required for the local provider".to_string(),
                    ));
                }
            }
            "http" => {
                if self.blob.remote_base_url.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "blob.remote_base_url is required for the http provider".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "Unknown blob provider '{}'. Expected local or http",
                    other
                )));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
