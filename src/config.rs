//! Client configuration.
//!
//! Resolution order (later sources override earlier ones):
//! 1. Built-in defaults (`http://127.0.0.1:9091/transmission/rpc`, 30s timeout)
//! 2. `<config dir>/transmission-rpc/config.json`, if present
//! 3. `TRANSMISSION_RPC_*` environment variables

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Default daemon endpoint.
pub const DEFAULT_URL: &str = "http://127.0.0.1:9091/transmission/rpc";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_URL: &str = "TRANSMISSION_RPC_URL";
const ENV_USERNAME: &str = "TRANSMISSION_RPC_USERNAME";
const ENV_PASSWORD: &str = "TRANSMISSION_RPC_PASSWORD";
const ENV_TOKEN: &str = "TRANSMISSION_RPC_TOKEN";
const ENV_TIMEOUT_SECS: &str = "TRANSMISSION_RPC_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The endpoint is not a valid absolute URL.
    #[error("Invalid RPC URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The timeout is not a positive integer number of seconds.
    #[error("Invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),

    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Credentials handed to the HTTP transport. Opaque to the RPC layer.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP Basic authentication.
    Basic {
        username: String,
        password: Option<String>,
    },
    /// Bearer token authentication.
    Bearer(String),
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer(token.into())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, password } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &password.as_ref().map(|_| "<redacted>"))
                .finish(),
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// RPC endpoint URL.
    pub url: Url,
    /// Optional credentials for the transport.
    pub credentials: Option<Credentials>,
    /// Default per-call timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a configuration for the given endpoint with default settings.
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url(url)?,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Attach credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the default per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut raw = RawConfig::default();

        if let Some(path) = default_config_path() {
            if path.exists() {
                raw.merge(RawConfig::from_file(&path)?);
            }
        }

        raw.merge(RawConfig::from_lookup(|key| std::env::var(key).ok()));
        raw.resolve()
    }

    /// Load configuration from an explicit file, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut raw = RawConfig::from_file(path)?;
        raw.merge(RawConfig::from_lookup(|key| std::env::var(key).ok()));
        raw.resolve()
    }
}

/// Resolve the default config file path.
///
/// `$XDG_CONFIG_HOME/transmission-rpc/config.json` on Linux,
/// `~/Library/Application Support/transmission-rpc/config.json` on macOS.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("transmission-rpc").join("config.json"))
}

/// Unresolved settings from a single source.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    #[serde(default, deserialize_with = "timeout_from_json")]
    timeout_secs: Option<String>,
}

impl RawConfig {
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            url: lookup(ENV_URL),
            username: lookup(ENV_USERNAME),
            password: lookup(ENV_PASSWORD),
            token: lookup(ENV_TOKEN),
            timeout_secs: lookup(ENV_TIMEOUT_SECS),
        }
    }

    fn merge(&mut self, other: RawConfig) {
        self.url = other.url.or(self.url.take());
        self.username = other.username.or(self.username.take());
        self.password = other.password.or(self.password.take());
        self.token = other.token.or(self.token.take());
        self.timeout_secs = other.timeout_secs.or(self.timeout_secs.take());
    }

    fn resolve(self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::new(self.url.as_deref().unwrap_or(DEFAULT_URL))?;

        if let Some(value) = self.timeout_secs {
            let secs: u64 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(value.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(value));
            }
            config.timeout = Duration::from_secs(secs);
        }

        // A token wins over username/password when both are configured
        config.credentials = match (self.token, self.username) {
            (Some(token), _) => Some(Credentials::Bearer(token)),
            (None, Some(username)) => Some(Credentials::Basic {
                username,
                password: self.password,
            }),
            (None, None) => None,
        };

        Ok(config)
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Accept `timeout_secs` as either a JSON number or a string.
fn timeout_from_json<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
