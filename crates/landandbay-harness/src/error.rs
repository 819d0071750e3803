// crates/landandbay-harness/src/error.rs
// ============================================================================
// Module: Harness Errors
// Description: Umbrella error for harness operations.
// Purpose: Let suites propagate any harness failure with `?`.
// Dependencies: thiserror
// ============================================================================

//! Umbrella error type for harness operations.

use crate::config::ConfigError;
use crate::inspect::InspectError;
use crate::module::ModuleError;
use crate::probe::ProbeError;
use crate::terraform::TerraformError;
use crate::validate::ValidationError;

/// Any failure surfaced by the harness.
///
/// Transient cloud errors and genuine misconfiguration are reported the same
/// way; the only retry path is the terraform retry budget.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Configuration load or validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Terraform command failure.
    #[error(transparent)]
    Terraform(#[from] TerraformError),
    /// Describe call failure or unexpected cardinality.
    #[error(transparent)]
    Inspect(#[from] InspectError),
    /// Module layout failure.
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// Assertion helper failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// HTTP readiness probe failure.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}
