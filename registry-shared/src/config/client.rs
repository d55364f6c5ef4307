use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

#[cfg(not(target_arch = "wasm32"))]
use std::{env, fs, path::Path};

/// Base URL of the hosted registry API.
pub const DEFAULT_API_BASE_URL: &str = "https://puskesmas-backend-api.fly.dev/api/v1";

const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while resolving a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported configuration format; use 'yaml' or 'json'")]
    UnsupportedFormat,
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid {name} value: {reason}")]
    InvalidValue { name: &'static str, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for talking to the registry API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of every API endpoint, including the version segment.
    pub api_base_url: Url,

    /// Timeout applied to the login request.
    pub login_timeout_secs: u64,

    /// Timeout applied to every other request.
    pub request_timeout_secs: u64,

    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,

    /// Where the command-line client keeps its session between runs.
    pub session_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice: the default base URL is a valid literal.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default API URL is valid"),
            login_timeout_secs: DEFAULT_LOGIN_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            session_path: None,
        }
    }

    /// Timeout for the login call.
    #[must_use]
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    /// Timeout for all other calls.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve `path` against the API base URL, keeping the base path intact.
    ///
    /// # Errors
    /// Returns an error if the joined string is not a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
    }

    /// Check the resolved values.
    ///
    /// # Errors
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            errors.push(format!(
                "API base URL must use http or https, got '{}'",
                self.api_base_url.scheme()
            ));
        }
        if self.login_timeout_secs == 0 {
            errors.push("Login timeout must be greater than 0.".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("Request timeout must be greater than 0.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ClientConfig {
    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// File values win over environment variables; environment variables only
    /// fill fields that are still at their default. `base_url_override` wins
    /// over both.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an environment
    /// variable is malformed, or the resolved configuration is invalid.
    pub fn load_config(
        config_path: Option<PathBuf>,
        base_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => defaults.clone(),
        };

        if config.api_base_url == defaults.api_base_url {
            if let Ok(value) = env::var("REGISTRY_API_BASE_URL") {
                config.api_base_url =
                    Url::parse(&value).map_err(|err| ConfigError::InvalidValue {
                        name: "REGISTRY_API_BASE_URL",
                        reason: err.to_string(),
                    })?;
            }
        }
        if config.login_timeout_secs == defaults.login_timeout_secs {
            if let Some(secs) = env_secs("REGISTRY_LOGIN_TIMEOUT_SECS")? {
                config.login_timeout_secs = secs;
            }
        }
        if config.request_timeout_secs == defaults.request_timeout_secs {
            if let Some(secs) = env_secs("REGISTRY_REQUEST_TIMEOUT_SECS")? {
                config.request_timeout_secs = secs;
            }
        }
        if config.log_level == defaults.log_level {
            if let Ok(level) = env::var("REGISTRY_LOG_LEVEL") {
                config.log_level = level;
            }
        }
        if config.session_path.is_none() {
            if let Ok(path) = env::var("REGISTRY_SESSION_PATH") {
                config.session_path = Some(PathBuf::from(path));
            }
        }

        if let Some(url) = base_url_override {
            config.api_base_url = url;
        }

        config
            .validate()
            .map_err(|errors| ConfigError::Invalid(errors.join(" ")))?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))
            }
            _ => Err(ConfigError::UnsupportedFormat),
        }
    }

    /// Session file location: the configured path, or the platform config dir.
    #[must_use]
    pub fn resolved_session_path(&self) -> PathBuf {
        self.session_path.clone().unwrap_or_else(|| {
            directories::BaseDirs::new()
                .map(|dirs| dirs.config_dir().join("clinic-registry").join("session.json"))
                .unwrap_or_else(|| PathBuf::from("./session.json"))
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_secs(name: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name,
                reason: "must be a whole number of seconds".to_string(),
            }),
        Err(_) => Ok(None),
    }
}
