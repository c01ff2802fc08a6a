//! # Configuration Management
//!
//! Centralized configuration for the sniffer.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Example
//! ```toml
//! [pipeline]
//! matching_timeout = 3000
//! error_policy = "propagate"
//!
//! [[matchers]]
//! name = "easytier"
//! directive = "easytier_config_server"
//! ```

use crate::error::{Result, SniffError};
use crate::protocol::directive::parse_directive;
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnifferConfig {
    /// Matching pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Matchers in evaluation order
    #[serde(default = "default_matchers")]
    pub matchers: Vec<MatcherEntry>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            matchers: default_matchers(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_matchers() -> Vec<MatcherEntry> {
    vec![MatcherEntry {
        name: String::from("easytier"),
        directive: String::from(crate::protocol::matcher::DIRECTIVE),
    }]
}

impl SnifferConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| SniffError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| SniffError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| SniffError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("EASYTIER_SNIFF_MATCHING_TIMEOUT_MS") {
            let val = raw.parse::<u64>().map_err(|e| {
                SniffError::ConfigError(format!("Invalid EASYTIER_SNIFF_MATCHING_TIMEOUT_MS: {e}"))
            })?;
            config.pipeline.matching_timeout = Duration::from_millis(val);
        }

        if let Ok(policy) = std::env::var("EASYTIER_SNIFF_ERROR_POLICY") {
            config.pipeline.error_policy = policy.parse()?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SniffError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| SniffError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.pipeline.validate());

        if self.matchers.is_empty() {
            errors.push("At least one matcher must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for entry in &self.matchers {
            errors.extend(entry.validate());
            if !entry.name.is_empty() && !seen.insert(entry.name.as_str()) {
                errors.push(format!("Duplicate matcher name: '{}'", entry.name));
            }
        }

        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SniffError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// What the pipeline does when a matcher fails with an I/O error or timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop matching and return the error to the caller
    #[default]
    Propagate,
    /// Treat the failure as "not this protocol" and try the next matcher
    NoMatch,
}

impl std::str::FromStr for ErrorPolicy {
    type Err = SniffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(ErrorPolicy::Propagate),
            "no_match" | "nomatch" => Ok(ErrorPolicy::NoMatch),
            other => Err(SniffError::ConfigError(format!(
                "Invalid error policy: '{other}' (expected 'propagate' or 'no_match')"
            ))),
        }
    }
}

/// Matching pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Deadline for one matcher evaluation of a flow
    #[serde(default = "default_matching_timeout", with = "duration_serde")]
    pub matching_timeout: Duration,

    /// Treatment of matcher I/O failures
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

fn default_matching_timeout() -> Duration {
    timeout::DEFAULT_MATCHING_TIMEOUT
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            matching_timeout: timeout::DEFAULT_MATCHING_TIMEOUT,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.matching_timeout < timeout::MIN_MATCHING_TIMEOUT {
            errors.push("Matching timeout too short (minimum: 10ms)".to_string());
        } else if self.matching_timeout > timeout::MAX_MATCHING_TIMEOUT {
            errors.push("Matching timeout too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// One named matcher in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatcherEntry {
    /// Label reported when this matcher claims a flow
    pub name: String,

    /// Declarative matcher form, e.g. `easytier_config_server`
    pub directive: String,
}

impl MatcherEntry {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("Matcher name cannot be empty".to_string());
        }

        if let Err(e) = parse_directive(&self.directive) {
            errors.push(format!("Matcher '{}': {e}", self.name));
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("easytier-sniff"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_policy_from_str() {
        assert_eq!("propagate".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Propagate);
        assert_eq!(" NO_MATCH ".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::NoMatch);
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = SnifferConfig::from_toml("[pipeline]\nmatching_timeout = 500\n").unwrap();
        assert_eq!(config.pipeline.matching_timeout, Duration::from_millis(500));
        assert_eq!(config.pipeline.error_policy, ErrorPolicy::Propagate);
        assert_eq!(config.matchers, default_matchers());
    }
}
