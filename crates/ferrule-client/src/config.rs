//! Client configuration.
//!
//! Values come from code, a YAML file or the environment. YAML content may
//! reference environment variables as `${VAR}` or `${VAR:-default}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable names.
pub mod vars {
    pub const FERRULE_ERROR_IS_ACCEPTABLE: &str = "FERRULE_ERROR_IS_ACCEPTABLE";
    pub const FERRULE_LOG_ERRORS: &str = "FERRULE_LOG_ERRORS";
}

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnvValue { var: String, value: String },
}

/// How a [`Client`](crate::Client) treats responses and builds requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Return 4xx/5xx responses instead of failing with `HttpStatus`.
    pub error_is_acceptable: bool,
    /// Log error statuses at error/info level rather than debug.
    pub log_errors: bool,
    /// Protocol version stamped on every request the client builds.
    pub protocol_version: String,
    /// Headers set on every request before the caller's own.
    pub default_headers: IndexMap<String, Vec<String>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            error_is_acceptable: false,
            log_errors: true,
            protocol_version: "1.1".to_string(),
            default_headers: IndexMap::new(),
        }
    }
}

impl ClientConfig {
    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parse YAML content, expanding environment references first.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: ClientConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `FERRULE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `FERRULE_*` environment variables on top of this config.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        self.validate()?;
        if let Some(value) = env_bool(vars::FERRULE_ERROR_IS_ACCEPTABLE)? {
            self.error_is_acceptable = value;
        }
        if let Some(value) = env_bool(vars::FERRULE_LOG_ERRORS)? {
            self.log_errors = value;
        }
        Ok(self)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })
    }

    /// Check values that would produce malformed requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol_version.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "protocol_version must not be empty".to_string(),
            });
        }
        if let Some(name) = self.default_headers.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: format!("default header name {name:?} is empty"),
            });
        }
        Ok(())
    }
}

fn env_bool(var: &str) -> Result<Option<bool>, ConfigError> {
    let Ok(value) = env::var(var) else {
        return Ok(None);
    };
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnvValue {
            var: var.to_string(),
            value,
        }),
    }
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| {
        ConfigError::ValidationError {
            message: e.to_string(),
        }
    })?;

    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    for cap in re.captures_iter(content) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];
        let default = cap.get(2).map(|m| m.as_str());

        let value = match env::var(var_name) {
            Ok(v) => v,
            Err(_) => match default {
                Some(d) => d.to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            },
        };

        result.push_str(&content[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&content[last..]);

    Ok(result)
}
