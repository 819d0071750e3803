// system-tests/src/config/env.rs
// ============================================================================
// Module: Suite Environment
// Description: Environment-backed overrides for the infrastructure suites.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: landandbay-harness
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8, empty values, and unparseable numbers fail
//! closed. Unset keys keep the value from the TOML file or the defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use landandbay_harness::CleanupPolicy;
use landandbay_harness::HarnessConfig;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for suite configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteEnv {
    /// Optional TOML config file applied before the other overrides.
    Config,
    /// AWS region override.
    Region,
    /// Terraform binary name or path.
    TerraformBinary,
    /// Terraform retry budget (non-negative integer).
    MaxRetries,
    /// Seconds between terraform retries (non-negative integer).
    RetryIntervalSeconds,
    /// Keep provisioned resources after each test (`true`/`false` or `1`/`0`).
    KeepResources,
    /// Skip every resource-creating test (`true`/`false` or `1`/`0`).
    Short,
    /// Optional artifact root override.
    RunRoot,
    /// Directory holding the terraform modules.
    ModulesRoot,
    /// Root terraform directory for full-stack scenarios.
    RootDir,
    /// Optional JSON-lines file receiving lifecycle events.
    EventLog,
}

impl SuiteEnv {
    /// Every recognized key.
    pub const ALL: [Self; 11] = [
        Self::Config,
        Self::Region,
        Self::TerraformBinary,
        Self::MaxRetries,
        Self::RetryIntervalSeconds,
        Self::KeepResources,
        Self::Short,
        Self::RunRoot,
        Self::ModulesRoot,
        Self::RootDir,
        Self::EventLog,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "LANDANDBAY_TEST_CONFIG",
            Self::Region => "LANDANDBAY_TEST_REGION",
            Self::TerraformBinary => "LANDANDBAY_TEST_TERRAFORM_BINARY",
            Self::MaxRetries => "LANDANDBAY_TEST_MAX_RETRIES",
            Self::RetryIntervalSeconds => "LANDANDBAY_TEST_RETRY_INTERVAL_SEC",
            Self::KeepResources => "LANDANDBAY_TEST_KEEP_RESOURCES",
            Self::Short => "LANDANDBAY_TEST_SHORT",
            Self::RunRoot => "LANDANDBAY_TEST_RUN_ROOT",
            Self::ModulesRoot => "LANDANDBAY_TEST_MODULES_ROOT",
            Self::RootDir => "LANDANDBAY_TEST_ROOT_DIR",
            Self::EventLog => "LANDANDBAY_TEST_EVENT_LOG",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Resolved configuration for one suite run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuiteConfig {
    /// Validated harness settings passed into every helper.
    pub harness: HarnessConfig,
    /// Optional artifact root override.
    pub run_root: Option<PathBuf>,
}

impl SuiteConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is
    /// empty, fails to parse, or the merged configuration fails validation.
    pub fn load() -> Result<Self, String> {
        Self::load_with(read_env_strict)
    }

    /// Loads configuration through `read`, which returns the raw value of a
    /// named variable.
    ///
    /// # Errors
    ///
    /// Returns an error when `read` fails, a value is empty or malformed, the
    /// config file cannot be loaded, or the merged configuration is invalid.
    pub fn load_with<F>(read: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Result<Option<String>, String>,
    {
        let value = |key: SuiteEnv| -> Result<Option<String>, String> {
            let name = key.as_str();
            reject_empty(name, read(name)?)
        };

        let mut harness = match value(SuiteEnv::Config)? {
            Some(path) => HarnessConfig::load_file(Path::new(&path))
                .map_err(|err| format!("{}: {err}", SuiteEnv::Config.as_str()))?,
            None => HarnessConfig::default(),
        };

        if let Some(region) = value(SuiteEnv::Region)? {
            harness.region = region;
        }
        if let Some(binary) = value(SuiteEnv::TerraformBinary)? {
            harness.terraform_binary = binary;
        }
        if let Some(raw) = value(SuiteEnv::MaxRetries)? {
            harness.max_retries = parse_count(SuiteEnv::MaxRetries.as_str(), &raw)?;
        }
        if let Some(raw) = value(SuiteEnv::RetryIntervalSeconds)? {
            harness.retry_interval_secs =
                parse_count(SuiteEnv::RetryIntervalSeconds.as_str(), &raw)?;
        }
        if let Some(keep) = parse_bool_env(
            SuiteEnv::KeepResources.as_str(),
            value(SuiteEnv::KeepResources)?,
        )? {
            harness.cleanup = if keep { CleanupPolicy::Keep } else { CleanupPolicy::Destroy };
        }
        if let Some(short) = parse_bool_env(SuiteEnv::Short.as_str(), value(SuiteEnv::Short)?)? {
            harness.short_mode = short;
        }
        if let Some(dir) = value(SuiteEnv::ModulesRoot)? {
            harness.modules_root = PathBuf::from(dir);
        }
        if let Some(dir) = value(SuiteEnv::RootDir)? {
            harness.root_dir = PathBuf::from(dir);
        }
        if let Some(path) = value(SuiteEnv::EventLog)? {
            harness.event_log = Some(PathBuf::from(path));
        }
        let run_root = value(SuiteEnv::RunRoot)?.map(PathBuf::from);

        harness.validate().map_err(|err| err.to_string())?;
        Ok(Self {
            harness,
            run_root,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Rejects values that are set but empty or whitespace.
fn reject_empty(name: &str, raw: Option<String>) -> Result<Option<String>, String> {
    match raw {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

/// Parses a non-negative integer.
///
/// # Errors
///
/// Returns an error when the value is not a non-negative integer in range.
fn parse_count<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.trim().parse().map_err(|_| format!("{name} must be a non-negative integer"))
}

/// Parses an optional boolean literal.
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
fn parse_bool_env(name: &str, raw: Option<String>) -> Result<Option<bool>, String> {
    let Some(value) = raw else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(Some(true));
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(Some(false));
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
