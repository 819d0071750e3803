// crates/landandbay-harness/src/terraform.rs
// ============================================================================
// Module: Terraform Driver
// Description: Runs terraform subcommands with injected variables and retries.
// Purpose: Provide the init/apply/output/destroy steps every scenario uses.
// Dependencies: serde_json, tempfile, thiserror
// ============================================================================

//! ## Overview
//! [`Terraform`] owns a set of [`TerraformOptions`] and a temporary
//! `.tfvars.json` file holding the merged variables. Every subcommand runs
//! with `-no-color`, non-interactive input, and the options' environment.
//!
//! A failed command is re-run only when its combined output contains one of
//! the configured retryable substrings; each attempt is reported through the
//! [`EventSink`]. Any other failure is returned immediately.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::HarnessConfig;
use crate::events::EventLevel;
use crate::events::EventSink;
use crate::events::HarnessEvent;
use crate::ids::TestContext;
use crate::vars::ModuleKind;
use crate::vars::VarMap;
use crate::vars::module_vars;
use crate::vars::root_vars;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Output substrings that mark a failure as transient.
pub const DEFAULT_RETRYABLE_ERRORS: [&str; 9] = [
    "RequestError: send request failed",
    "Error installing provider",
    "Failed to query available provider packages",
    "timeout while waiting for plugin to start",
    "ThrottlingException",
    "RequestLimitExceeded",
    "Client.Timeout exceeded while awaiting headers",
    "connection reset by peer",
    "TLS handshake timeout",
];

/// Number of trailing output lines kept in error details.
const DETAIL_LINES: usize = 20;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terraform driver failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerraformError {
    /// The terraform binary could not be started.
    #[error("failed to run {binary}: {error}")]
    Spawn {
        /// Binary that failed to start.
        binary: String,
        /// Underlying I/O error.
        error: String,
    },
    /// A subcommand exited unsuccessfully with a non-retryable error.
    #[error("terraform {command} failed ({status}): {detail}")]
    Failed {
        /// Subcommand name.
        command: &'static str,
        /// Exit status description.
        status: String,
        /// Tail of the command output.
        detail: String,
    },
    /// A subcommand kept failing with retryable errors.
    #[error("terraform {command} failed after {attempts} attempts: {detail}")]
    RetriesExhausted {
        /// Subcommand name.
        command: &'static str,
        /// Attempts made.
        attempts: u32,
        /// Tail of the last attempt's output.
        detail: String,
    },
    /// The variable file could not be written.
    #[error("failed to write var file: {0}")]
    VarFile(String),
    /// An output was not valid JSON.
    #[error("output {name} is not valid json: {error}")]
    OutputParse {
        /// Output name.
        name: String,
        /// Parser error.
        error: String,
    },
    /// An output had an unexpected JSON type.
    #[error("output {name} is not a {expected}")]
    OutputType {
        /// Output name.
        name: String,
        /// Expected shape.
        expected: &'static str,
    },
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Settings for one terraform working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformOptions {
    /// Directory holding the configuration to apply.
    pub terraform_dir: PathBuf,
    /// Binary invoked for every subcommand.
    pub terraform_binary: String,
    /// Variables written to the `.tfvars.json` file.
    pub vars: VarMap,
    /// Extra environment for every subcommand.
    pub env_vars: BTreeMap<String, String>,
    /// Additional attempts for retryable failures.
    pub max_retries: u32,
    /// Pause between attempts.
    pub time_between_retries: Duration,
    /// Output substrings that make a failure retryable.
    pub retryable_errors: Vec<String>,
    /// Resource prefix attached to lifecycle events.
    pub prefix: Option<String>,
}

impl TerraformOptions {
    /// Creates options for a directory with the configured binary and retry
    /// budget and no variables.
    #[must_use]
    pub fn new(terraform_dir: impl Into<PathBuf>, region: &str, config: &HarnessConfig) -> Self {
        let env_vars = BTreeMap::from([
            ("AWS_DEFAULT_REGION".to_string(), region.to_string()),
            ("TF_IN_AUTOMATION".to_string(), "1".to_string()),
            ("TF_INPUT".to_string(), "0".to_string()),
        ]);
        Self {
            terraform_dir: terraform_dir.into(),
            terraform_binary: config.terraform_binary.clone(),
            vars: VarMap::new(),
            env_vars,
            max_retries: config.max_retries,
            time_between_retries: config.time_between_retries(),
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|pattern| (*pattern).to_string())
                .collect(),
            prefix: None,
        }
    }

    /// Options for a single module in the context's working directory.
    #[must_use]
    pub fn for_module(
        kind: ModuleKind,
        ctx: &TestContext,
        overrides: VarMap,
        config: &HarnessConfig,
    ) -> Self {
        Self {
            vars: module_vars(kind, ctx, overrides),
            prefix: Some(ctx.prefix().to_string()),
            ..Self::new(ctx.working_dir(), ctx.region(), config)
        }
    }

    /// Options for the root configuration in the context's working directory.
    #[must_use]
    pub fn for_root(ctx: &TestContext, overrides: VarMap, config: &HarnessConfig) -> Self {
        Self {
            vars: root_vars(ctx, overrides),
            prefix: Some(ctx.prefix().to_string()),
            ..Self::new(ctx.working_dir(), ctx.region(), config)
        }
    }

    /// Replaces the variables.
    #[must_use]
    pub fn with_vars(mut self, vars: VarMap) -> Self {
        self.vars = vars;
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// SECTION: Driver
// ============================================================================

/// Terraform command runner for one working directory.
pub struct Terraform {
    /// Command settings.
    options: TerraformOptions,
    /// Lifecycle event sink.
    sink: Arc<dyn EventSink>,
    /// Variable file passed with `-var-file`; removed on drop.
    var_file: NamedTempFile,
}

impl Terraform {
    /// Creates a driver and writes its variable file.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::VarFile`] when the file cannot be written.
    pub fn new(
        options: TerraformOptions,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TerraformError> {
        let var_file = write_var_file(&options.vars)?;
        Ok(Self {
            options,
            sink,
            var_file,
        })
    }

    /// Returns the driver's options.
    #[must_use]
    pub const fn options(&self) -> &TerraformOptions {
        &self.options
    }

    /// Returns the path of the variable file.
    #[must_use]
    pub fn var_file_path(&self) -> &Path {
        self.var_file.path()
    }

    /// Runs `terraform init`.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the command fails.
    pub fn init(&self) -> Result<String, TerraformError> {
        self.run("init", &["init", "-input=false", "-no-color"])
    }

    /// Runs `terraform apply` with the variable file.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the command fails.
    pub fn apply(&self) -> Result<String, TerraformError> {
        let var_file = self.var_file_arg();
        self.run("apply", &["apply", "-input=false", "-auto-approve", "-no-color", &var_file])
    }

    /// Runs `init` then `apply`.
    ///
    /// # Errors
    ///
    /// Returns the first failing command's [`TerraformError`].
    pub fn init_and_apply(&self) -> Result<String, TerraformError> {
        self.init()?;
        self.apply()
    }

    /// Checks the configuration without a backend or cloud credentials.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when either command fails.
    pub fn validate(&self) -> Result<String, TerraformError> {
        self.run("init", &["init", "-backend=false", "-input=false", "-no-color"])?;
        self.run("validate", &["validate", "-no-color"])
    }

    /// Runs `terraform destroy` with the variable file.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the command fails.
    pub fn destroy(&self) -> Result<String, TerraformError> {
        let var_file = self.var_file_arg();
        self.run("destroy", &["destroy", "-input=false", "-auto-approve", "-no-color", &var_file])
    }

    /// Returns an output as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the command fails or prints invalid JSON.
    pub fn output_json(&self, name: &str) -> Result<Value, TerraformError> {
        let stdout = self.run("output", &["output", "-no-color", "-json", name])?;
        serde_json::from_str(stdout.trim()).map_err(|err| TerraformError::OutputParse {
            name: name.to_string(),
            error: err.to_string(),
        })
    }

    /// Returns a scalar output rendered as text.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::OutputType`] for lists, maps, and null.
    pub fn output(&self, name: &str) -> Result<String, TerraformError> {
        let value = self.output_json(name)?;
        scalar_text(&value).ok_or_else(|| TerraformError::OutputType {
            name: name.to_string(),
            expected: "scalar",
        })
    }

    /// Returns a list output. A null output is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::OutputType`] unless the output is null or a
    /// list of scalars.
    pub fn output_list(&self, name: &str) -> Result<Vec<String>, TerraformError> {
        let type_error = || TerraformError::OutputType {
            name: name.to_string(),
            expected: "list of scalars",
        };
        match self.output_json(name)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => {
                items.iter().map(|item| scalar_text(item).ok_or_else(type_error)).collect()
            }
            _ => Err(type_error()),
        }
    }

    /// Returns a map output with scalar values.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::OutputType`] unless the output is an object of
    /// scalars.
    pub fn output_map(&self, name: &str) -> Result<BTreeMap<String, String>, TerraformError> {
        let type_error = || TerraformError::OutputType {
            name: name.to_string(),
            expected: "map of scalars",
        };
        match self.output_json(name)? {
            Value::Object(entries) => entries
                .iter()
                .map(|(key, value)| {
                    scalar_text(value).map(|text| (key.clone(), text)).ok_or_else(type_error)
                })
                .collect(),
            _ => Err(type_error()),
        }
    }

    /// Records a lifecycle event tagged with this driver's directory and prefix.
    pub(crate) fn record(&self, event: HarnessEvent) {
        self.sink.record(&event.with_prefix(self.options.prefix.as_deref()));
    }

    /// Builds an event for this driver's directory.
    pub(crate) fn event(&self, name: &'static str) -> HarnessEvent {
        HarnessEvent::new(name, &self.options.terraform_dir)
    }

    /// Returns the `-var-file=<path>` argument.
    fn var_file_arg(&self) -> String {
        format!("-var-file={}", self.var_file.path().display())
    }

    /// Runs a subcommand, retrying retryable failures.
    fn run(&self, command: &'static str, args: &[&str]) -> Result<String, TerraformError> {
        let max_attempts = self.options.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            self.record(
                self.event("terraform_started").with_command(command).with_attempt(attempt),
            );
            let output = Command::new(&self.options.terraform_binary)
                .args(args)
                .current_dir(&self.options.terraform_dir)
                .envs(&self.options.env_vars)
                .output()
                .map_err(|err| TerraformError::Spawn {
                    binary: self.options.terraform_binary.clone(),
                    error: err.to_string(),
                })?;
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            if output.status.success() {
                self.record(
                    self.event("terraform_succeeded").with_command(command).with_attempt(attempt),
                );
                return Ok(stdout);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            let combined = format!("{stdout}\n{stderr}");
            let detail = tail_lines(&combined, DETAIL_LINES);
            let retryable = self
                .options
                .retryable_errors
                .iter()
                .any(|pattern| combined.contains(pattern.as_str()));
            if retryable && attempt < max_attempts {
                self.record(
                    self.event("terraform_retrying")
                        .with_level(EventLevel::Warn)
                        .with_command(command)
                        .with_attempt(attempt)
                        .with_detail(detail),
                );
                std::thread::sleep(self.options.time_between_retries);
                attempt += 1;
                continue;
            }
            self.record(
                self.event("terraform_failed")
                    .with_level(EventLevel::Error)
                    .with_command(command)
                    .with_attempt(attempt)
                    .with_detail(detail.clone()),
            );
            if retryable {
                return Err(TerraformError::RetriesExhausted {
                    command,
                    attempts: attempt,
                    detail,
                });
            }
            let status = output.status.code().map_or_else(
                || "terminated by signal".to_string(),
                |code| format!("exit code {code}"),
            );
            return Err(TerraformError::Failed {
                command,
                status,
                detail,
            });
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes variables to a temporary `.tfvars.json` file.
fn write_var_file(vars: &VarMap) -> Result<NamedTempFile, TerraformError> {
    let mut file = tempfile::Builder::new()
        .prefix("landandbay-")
        .suffix(".tfvars.json")
        .tempfile()
        .map_err(|err| TerraformError::VarFile(err.to_string()))?;
    let payload =
        serde_json::to_vec_pretty(vars).map_err(|err| TerraformError::VarFile(err.to_string()))?;
    file.write_all(&payload).map_err(|err| TerraformError::VarFile(err.to_string()))?;
    file.flush().map_err(|err| TerraformError::VarFile(err.to_string()))?;
    Ok(file)
}

/// Renders a JSON scalar as text.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns the last `count` non-empty lines of `text`.
fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
