//! Configuration types for folio-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Environment variable consulted when no email is passed explicitly
pub const EMAIL_ENV: &str = "FOLIO_DL_EMAIL";
/// Environment variable consulted when no password is passed explicitly
pub const PASSWORD_ENV: &str = "FOLIO_DL_PASSWORD";

/// Passphrase shared by every encrypted page of every publication
pub const DEFAULT_PAGE_PASSPHRASE: &str = "\"F0rd*t3h%3p1c&h0nkY!\"";

/// Vendor API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; endpoints are addressed as `<base_url>/<endpoint>/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Platform tag sent when creating anonymous users (default: "iphone-retina")
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Vendor prefix of product identifiers (default: "com.futurenet")
    #[serde(default = "default_product_prefix")]
    pub product_prefix: String,

    /// Timeout applied to every API request (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            platform: default_platform(),
            product_prefix: default_product_prefix(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 250 ms)
    #[serde(default = "default_initial_delay", with = "duration_ms")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 5 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Polling behaviour while the server authorizes a credential login
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginPollConfig {
    /// Delay after the first non-authorized status (default: 250 ms)
    #[serde(default = "default_poll_initial_interval", with = "duration_ms")]
    pub initial_interval: Duration,

    /// Upper bound for the delay between polls (default: 2 seconds)
    #[serde(default = "default_poll_max_interval", with = "duration_ms")]
    pub max_interval: Duration,

    /// Growth factor applied to the delay after each poll (default: 1.5)
    #[serde(default = "default_poll_multiplier")]
    pub backoff_multiplier: f64,

    /// Total time allowed for authorization (default: 30 seconds)
    #[serde(default = "default_poll_timeout", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for LoginPollConfig {
    fn default() -> Self {
        Self {
            initial_interval: default_poll_initial_interval(),
            max_interval: default_poll_max_interval(),
            backoff_multiplier: default_poll_multiplier(),
            timeout: default_poll_timeout(),
        }
    }
}

/// Where and how reconstructed issues are written
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: current directory)
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Issues reconstructed at the same time in a batch (default: 2)
    #[serde(default = "default_max_concurrent_issues")]
    pub max_concurrent_issues: usize,

    /// Attempts per issue in a batch, retrying only transient failures (default: 1)
    #[serde(default = "default_issue_attempts")]
    pub issue_attempts: u32,

    /// Passphrase used to decrypt archive pages
    #[serde(default = "default_passphrase")]
    pub passphrase: String,

    /// Path to the qpdf executable (auto-detected if None)
    #[serde(default)]
    pub qpdf_path: Option<PathBuf>,

    /// Upper bound on one archive download, body included (default: 10 minutes)
    #[serde(default = "default_download_timeout", with = "duration_ms")]
    pub download_timeout: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            max_concurrent_issues: default_max_concurrent_issues(),
            issue_attempts: default_issue_attempts(),
            passphrase: default_passphrase(),
            qpdf_path: None,
            download_timeout: default_download_timeout(),
        }
    }
}

/// Main configuration for folio-dl
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Display name of the publication to work with (default: "Edge")
    #[serde(default = "default_magazine")]
    pub magazine: String,

    /// Vendor API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Retries of anonymous session bootstrap when the server hands out an unusable identifier
    #[serde(default)]
    pub bootstrap: RetryConfig,

    /// Login authorization polling
    #[serde(default)]
    pub login: LoginPollConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            magazine: default_magazine(),
            api: ApiConfig::default(),
            bootstrap: RetryConfig::default(),
            login: LoginPollConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                format!("failed to read {}: {}", path.display(), e),
                "config_file",
            )
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::config(
                format!("failed to parse {}: {}", path.display(), e),
                "config_file",
            )
        })
    }
}

/// Account credentials for upgrading an anonymous session
#[derive(Clone)]
pub struct Credentials {
    /// Account email address
    pub email: String,
    /// Account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolve credentials from explicit values, falling back to the environment
    ///
    /// Explicit values are used only when both are present; otherwise both are read
    /// from [`EMAIL_ENV`] and [`PASSWORD_ENV`].
    pub fn resolve(email: Option<&str>, password: Option<&str>) -> Result<Self> {
        if let (Some(email), Some(password)) = (email, password)
            && !email.is_empty()
            && !password.is_empty()
        {
            return Ok(Self {
                email: email.to_string(),
                password: password.to_string(),
            });
        }

        let email = std::env::var(EMAIL_ENV).unwrap_or_default();
        let password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        if email.is_empty() || password.is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok(Self { email, password })
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.futr.efs.foliocloud.net".to_string()
}

fn default_platform() -> String {
    "iphone-retina".to_string()
}

fn default_product_prefix() -> String {
    "com.futurenet".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(250)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_poll_initial_interval() -> Duration {
    Duration::from_millis(250)
}

fn default_poll_max_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_poll_multiplier() -> f64 {
    1.5
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_concurrent_issues() -> usize {
    2
}

fn default_issue_attempts() -> u32 {
    1
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_passphrase() -> String {
    DEFAULT_PAGE_PASSPHRASE.to_string()
}

fn default_magazine() -> String {
    "Edge".to_string()
}

// Duration serialization helper (milliseconds)
mod duration_ms {
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
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
