//! Configuration types for image-zip-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Download behavior configuration (archive directory, timeout, chunking)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory where task archives are written (default: "tmp_zip")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Connect and per-read timeout for each URL (default: 20 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Progress chunk size in bytes (default: 1024)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            timeout: default_timeout(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Archive retention sweep configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Run the sweep at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Archives older than this are deleted (default: 3600 seconds)
    #[serde(default = "default_ttl", with = "duration_serde")]
    pub ttl: Duration,

    /// Time between sweeps (default: 600 seconds)
    #[serde(default = "default_cleanup_interval", with = "duration_serde")]
    pub interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: default_ttl(),
            interval: default_cleanup_interval(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Bounded wait of one progress poll (default: 100 ms)
    #[serde(default = "default_poll_interval", with = "millis_serde")]
    pub poll_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            poll_interval: default_poll_interval(),
        }
    }
}

/// Login gate configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require a session or API key on task routes (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Login user name (default: "admin")
    #[serde(default = "default_username")]
    pub username: String,

    /// Login password (default: "password")
    #[serde(default = "default_password")]
    pub password: String,

    /// Optional API key accepted in the X-Api-Key header instead of a session
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            username: default_username(),
            password: default_password(),
            api_key: None,
        }
    }
}

/// Main configuration for ImageDownloader
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Archive retention settings
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// API server settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Login settings
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from process environment variables over the defaults
    ///
    /// Recognized variables: `TMP_DIR`, `ZIP_TTL_SECONDS`,
    /// `CLEANUP_INTERVAL_SECONDS`, `DOWNLOAD_TIMEOUT_SECONDS`, `CHUNK_SIZE`,
    /// `HOST`, `PORT`, `APP_USERNAME`, `APP_PASSWORD`, `API_KEY`,
    /// `AUTH_ENABLED`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup over the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(dir) = lookup("TMP_DIR") {
            config.download.temp_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "DOWNLOAD_TIMEOUT_SECONDS")? {
            config.download.timeout = Duration::from_secs(secs);
        }
        if let Some(size) = parse_var::<usize>(&lookup, "CHUNK_SIZE")? {
            config.download.chunk_size = size;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "ZIP_TTL_SECONDS")? {
            config.cleanup.ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CLEANUP_INTERVAL_SECONDS")? {
            config.cleanup.interval = Duration::from_secs(secs);
        }

        let host = parse_var::<std::net::IpAddr>(&lookup, "HOST")?
            .unwrap_or(config.api.bind_address.ip());
        let port = parse_var::<u16>(&lookup, "PORT")?.unwrap_or(config.api.bind_address.port());
        config.api.bind_address = SocketAddr::new(host, port);

        if let Some(username) = lookup("APP_USERNAME") {
            config.auth.username = username;
        }
        if let Some(password) = lookup("APP_PASSWORD") {
            config.auth.password = password;
        }
        if let Some(key) = lookup("API_KEY").filter(|k| !k.is_empty()) {
            config.auth.api_key = Some(key);
        }
        if let Some(enabled) = parse_var::<bool>(&lookup, "AUTH_ENABLED")? {
            config.auth.enabled = enabled;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.chunk_size == 0 {
            return Err(Error::Config {
                message: "chunk size must be greater than zero".to_string(),
                key: Some("chunk_size".to_string()),
            });
        }
        if self.download.timeout.is_zero() {
            return Err(Error::Config {
                message: "download timeout must be greater than zero".to_string(),
                key: Some("timeout".to_string()),
            });
        }
        if self.cleanup.enabled && self.cleanup.interval.is_zero() {
            return Err(Error::Config {
                message: "cleanup interval must be greater than zero".to_string(),
                key: Some("cleanup.interval".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| Error::Config {
            message: format!("invalid value '{raw}' for {key}: {e}"),
            key: Some(key.to_string()),
        }),
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("tmp_zip")
}

fn default_timeout() -> Duration {
    crate::fetcher::DEFAULT_TIMEOUT
}

fn default_chunk_size() -> usize {
    crate::fetcher::DEFAULT_CHUNK_SIZE
}

fn default_ttl() -> Duration {
    Duration::from_secs(3600)
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(600)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds)
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
