// crates/landandbay-harness/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Explicit settings passed into every harness helper.
// Purpose: Replace process-wide defaults with a typed, validated struct.
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! [`HarnessConfig`] carries the region, terraform binary, retry budget,
//! cleanup policy, and directory layout used by a test run. It is loaded from
//! TOML (optional) and validated before use. Helpers receive it by reference so
//! parallel tests never share mutable state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default AWS region for provisioned test resources.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Terraform binary name used unless overridden. Never auto-detected.
pub const DEFAULT_TERRAFORM_BINARY: &str = "terraform";
/// Default delay between terraform retries in seconds.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;
/// Maximum retry count accepted for a single terraform command.
pub const MAX_RETRIES: u32 = 20;
/// Maximum delay between retries in seconds.
pub const MAX_RETRY_INTERVAL_SECS: u64 = 600;
/// Maximum config file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// ============================================================================
// SECTION: Types
// ============================================================================

/// What happens to provisioned resources when a deployment guard goes out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Run `terraform destroy` on every exit path.
    #[default]
    Destroy,
    /// Leave resources in place for debugging.
    Keep,
}

/// Settings for a harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HarnessConfig {
    /// AWS region for all provisioned resources and describe calls.
    pub region: String,
    /// Terraform binary name or path.
    pub terraform_binary: String,
    /// Retry count passed through to every terraform command.
    pub max_retries: u32,
    /// Seconds to wait between terraform retries.
    pub retry_interval_secs: u64,
    /// Teardown behavior for deployment guards.
    pub cleanup: CleanupPolicy,
    /// Skip every test that provisions live resources.
    pub short_mode: bool,
    /// Directory holding the individual terraform modules.
    pub modules_root: PathBuf,
    /// Root terraform directory used by full-stack scenarios.
    pub root_dir: PathBuf,
    /// Optional JSON-lines file receiving lifecycle events.
    pub event_log: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            terraform_binary: DEFAULT_TERRAFORM_BINARY.to_string(),
            max_retries: 0,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
            cleanup: CleanupPolicy::Destroy,
            short_mode: false,
            modules_root: PathBuf::from("../terraform/modules"),
            root_dir: PathBuf::from("../terraform"),
            event_log: None,
        }
    }
}

impl HarnessConfig {
    /// Parses and validates configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is too large, or
    /// fails validation.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let metadata = fs::metadata(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a field is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }
        if !self
            .region
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
        {
            return Err(ConfigError::Invalid(format!(
                "region {} must contain only lowercase letters, digits, and '-'",
                self.region
            )));
        }
        if self.terraform_binary.trim().is_empty() {
            return Err(ConfigError::Invalid("terraform_binary must not be empty".to_string()));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "max_retries must be at most {MAX_RETRIES}"
            )));
        }
        if self.retry_interval_secs > MAX_RETRY_INTERVAL_SECS {
            return Err(ConfigError::Invalid(format!(
                "retry_interval_secs must be at most {MAX_RETRY_INTERVAL_SECS}"
            )));
        }
        Ok(())
    }

    /// Returns the delay between terraform retries.
    #[must_use]
    pub const fn time_between_retries(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
