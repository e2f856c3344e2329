//! Configuration types for the document pipeline
//!
//! [`Config`] is a plain serde tree with defaults for every field. Deployments build it from
//! environment variables through [`Config::from_env`]; tests feed [`Config::from_lookup`] a map.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Local and remote file storage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the staging store; inputs live under `input/`, outputs under `output/`
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Remote object store used for authenticated fetches and output publishing
    #[serde(default)]
    pub remote: Option<RemoteStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            remote: None,
        }
    }
}

impl StorageConfig {
    /// Directory holding staged input files
    pub fn input_dir(&self) -> PathBuf {
        self.store_dir.join("input")
    }

    /// Directory holding rendered outputs
    pub fn output_dir(&self) -> PathBuf {
        self.store_dir.join("output")
    }
}

/// Supabase-style object store credentials
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteStorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,

    /// Service or anon key sent as bearer token and `apikey` header
    pub service_key: String,

    /// Bucket holding task files (default: "files")
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

/// Task store location
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "./eduhelpify.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Generation provider settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API key for the generation service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (default: "gemini-2.0-flash")
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Upper bound for a single generation call (default: 1000 seconds)
    #[serde(default = "default_generation_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Sampling temperature (default: 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff (default: 0.95)
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Top-k sampling cutoff (default: 40)
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Maximum tokens in the response (default: 8192)
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_generation_base_url(),
            timeout: default_generation_timeout(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Input acquisition bounds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Number of input files fetched at once (default: 4)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Timeout for one remote fetch (default: 60 seconds)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    pub fetch_timeout: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Sender identity for completion emails
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Display name (default: "EduHelpify Team")
    #[serde(default = "default_sender_name")]
    pub name: String,

    /// From address
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            name: default_sender_name(),
            email: None,
        }
    }
}

/// One email vendor in the failover chain
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationProviderConfig {
    /// MailerSend `/v1/email`
    MailerSend {
        /// API token
        api_key: String,
        /// API base URL
        #[serde(default = "default_mailersend_base_url")]
        base_url: String,
    },
    /// Resend `/emails`
    Resend {
        /// API token
        api_key: String,
        /// API base URL
        #[serde(default = "default_resend_base_url")]
        base_url: String,
    },
}

/// Completion notification settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Sender identity
    #[serde(default)]
    pub sender: SenderConfig,

    /// Providers, tried in order until one accepts the message
    #[serde(default)]
    pub providers: Vec<NotificationProviderConfig>,

    /// Timeout for one provider call (default: 30 seconds)
    #[serde(default = "default_notification_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            sender: SenderConfig::default(),
            providers: Vec::new(),
            timeout: default_notification_timeout(),
        }
    }
}

/// HTTP surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging settings used by the server binary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Staging directories and remote object store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Task store
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Generation provider
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Input acquisition
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Completion emails
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Build configuration from the process environment, loading `.env` first
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let first = |keys: &[&str]| keys.iter().find_map(|key| get(key));

        let mut config = Config::default();

        if let Some(dir) = get("STORE_LOCATION") {
            config.storage.store_dir = PathBuf::from(dir);
        }
        if let (Some(url), Some(service_key)) = (
            first(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"]),
            first(&[
                "SUPABASE_SERVICE_KEY",
                "SUPABASE_KEY",
                "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            ]),
        ) {
            config.storage.remote = Some(RemoteStorageConfig {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                bucket: get("SUPABASE_BUCKET").unwrap_or_else(default_bucket),
            });
        }

        if let Some(path) = get("DATABASE_PATH") {
            config.persistence.database_path = PathBuf::from(path);
        }

        config.generation.api_key = get("GOOGLE_API_KEY");
        if let Some(model) = get("GEMINI_MODEL") {
            config.generation.model = model;
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            config.generation.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_var::<u64>(&get, "GENERATION_TIMEOUT_SECS")? {
            config.generation.timeout = Duration::from_secs(secs);
        }

        if let Some(n) = parse_var::<usize>(&get, "MAX_CONCURRENT_FETCHES")? {
            config.acquisition.max_concurrent_fetches = n;
        }
        if let Some(secs) = parse_var::<u64>(&get, "FETCH_TIMEOUT_SECS")? {
            config.acquisition.fetch_timeout = Duration::from_secs(secs);
        }

        if let Some(name) = get("SENDER_NAME") {
            config.notifications.sender.name = name;
        }
        config.notifications.sender.email = get("SENDER_EMAIL");
        if let Some(secs) = parse_var::<u64>(&get, "NOTIFICATION_TIMEOUT_SECS")? {
            config.notifications.timeout = Duration::from_secs(secs);
        }
        let mailersend_base =
            get("MAILERSEND_BASE_URL").unwrap_or_else(default_mailersend_base_url);
        for key in ["MAILERSEND_API_KEY", "MAILERSEND_SECONDARY_API_KEY"] {
            if let Some(api_key) = get(key) {
                config
                    .notifications
                    .providers
                    .push(NotificationProviderConfig::MailerSend {
                        api_key,
                        base_url: mailersend_base.clone(),
                    });
            }
        }
        if let Some(api_key) = get("RESEND_API_KEY") {
            config
                .notifications
                .providers
                .push(NotificationProviderConfig::Resend {
                    api_key,
                    base_url: get("RESEND_BASE_URL").unwrap_or_else(default_resend_base_url),
                });
        }

        if let Some(addr) = parse_var::<SocketAddr>(&get, "BIND_ADDRESS")? {
            config.server.bind_address = addr;
        } else if let Some(port) = parse_var::<u16>(&get, "PORT")? {
            config.server.bind_address = SocketAddr::from(([0, 0, 0, 0], port));
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(level) = get("RUST_LOG") {
            config.logging.level = level;
        }
        if let Some(format) = get("LOG_FORMAT") {
            config.logging.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(Error::Config {
                        message: format!("unknown log format '{}'", other),
                        key: Some("LOG_FORMAT".to_string()),
                    });
                }
            };
        }

        Ok(config)
    }

    /// Check that the configuration can drive the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.generation.api_key.is_none() {
            return Err(Error::Config {
                message: "generation API key is not set".to_string(),
                key: Some("GOOGLE_API_KEY".to_string()),
            });
        }
        if self.generation.timeout.is_zero() {
            return Err(Error::Config {
                message: "generation timeout must be positive".to_string(),
                key: Some("GENERATION_TIMEOUT_SECS".to_string()),
            });
        }
        if self.acquisition.max_concurrent_fetches == 0 {
            return Err(Error::Config {
                message: "max_concurrent_fetches must be at least 1".to_string(),
                key: Some("MAX_CONCURRENT_FETCHES".to_string()),
            });
        }
        if !self.notifications.providers.is_empty() && self.notifications.sender.email.is_none()
        {
            return Err(Error::Config {
                message: "notification providers are configured but no sender email is set"
                    .to_string(),
                key: Some("SENDER_EMAIL".to_string()),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| Error::Config {
            message: format!("invalid value '{}': {}", raw, e),
            key: Some(key.to_string()),
        }),
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./store")
}

fn default_bucket() -> String {
    "files".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./eduhelpify.db")
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_generation_timeout() -> Duration {
    Duration::from_secs(1000)
}

fn default_temperature() -> f32 {
    1.0
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    40
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_sender_name() -> String {
    "EduHelpify Team".to_string()
}

fn default_mailersend_base_url() -> String {
    "https://api.mailersend.com".to_string()
}

fn default_resend_base_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_notification_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

// Durations are written as whole seconds
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
