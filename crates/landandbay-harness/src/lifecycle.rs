// crates/landandbay-harness/src/lifecycle.rs
// ============================================================================
// Module: Deployment Lifecycle
// Description: Scope guard pairing a terraform apply with its destroy.
// Purpose: Tear provisioned resources down on every exit path of a test.
// Dependencies: (crate-internal)
// ============================================================================

//! ## Overview
//! [`Deployment::apply`] builds the guard before running `init` and `apply`,
//! so a failed apply still destroys whatever it managed to create. Dropping
//! the guard runs `terraform destroy` unless it was already destroyed
//! explicitly or the cleanup policy is [`CleanupPolicy::Keep`].
//!
//! A destroy failure inside `Drop` cannot be propagated. It is recorded as a
//! `destroy_failed` error event and written to stderr, and is not retried.
//! Call [`Deployment::destroy`] to observe the teardown result directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io;
use std::io::Write;

use crate::config::CleanupPolicy;
use crate::error::HarnessError;
use crate::events::EventLevel;
use crate::terraform::Terraform;
use crate::terraform::TerraformError;

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Applied terraform configuration that is destroyed when dropped.
pub struct Deployment {
    /// Driver for the applied directory.
    terraform: Terraform,
    /// Teardown policy.
    cleanup: CleanupPolicy,
    /// Set once teardown has run or been skipped.
    finished: bool,
}

impl Deployment {
    /// Runs `init` and `apply`, returning the guard on success.
    ///
    /// The guard exists before `apply` starts, so its teardown also runs when
    /// the apply fails part way.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Terraform`] when `init` or `apply` fails.
    pub fn apply(terraform: Terraform, cleanup: CleanupPolicy) -> Result<Self, HarnessError> {
        let deployment = Self {
            terraform,
            cleanup,
            finished: false,
        };
        deployment.terraform.record(deployment.terraform.event("apply_started"));
        deployment.terraform.init_and_apply()?;
        deployment.terraform.record(deployment.terraform.event("apply_succeeded"));
        Ok(deployment)
    }

    /// Returns the underlying driver.
    #[must_use]
    pub const fn terraform(&self) -> &Terraform {
        &self.terraform
    }

    /// Returns a scalar output.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the output is missing or not a scalar.
    pub fn output(&self, name: &str) -> Result<String, TerraformError> {
        self.terraform.output(name)
    }

    /// Returns a list output.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the output is missing or not a list.
    pub fn output_list(&self, name: &str) -> Result<Vec<String>, TerraformError> {
        self.terraform.output_list(name)
    }

    /// Returns a map output.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError`] when the output is missing or not a map.
    pub fn output_map(&self, name: &str) -> Result<BTreeMap<String, String>, TerraformError> {
        self.terraform.output_map(name)
    }

    /// Tears the deployment down now and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Terraform`] when `destroy` fails. The guard is
    /// spent either way and does not retry on drop.
    pub fn destroy(mut self) -> Result<(), HarnessError> {
        self.finished = true;
        self.teardown().map_err(HarnessError::from)
    }

    /// Runs the teardown policy.
    fn teardown(&self) -> Result<(), TerraformError> {
        match self.cleanup {
            CleanupPolicy::Keep => {
                self.terraform.record(
                    self.terraform
                        .event("destroy_skipped")
                        .with_level(EventLevel::Warn)
                        .with_detail("cleanup policy is keep"),
                );
                Ok(())
            }
            CleanupPolicy::Destroy => {
                self.terraform.record(self.terraform.event("destroy_started"));
                match self.terraform.destroy() {
                    Ok(_) => {
                        self.terraform.record(self.terraform.event("destroy_succeeded"));
                        Ok(())
                    }
                    Err(err) => {
                        self.terraform.record(
                            self.terraform
                                .event("destroy_failed")
                                .with_level(EventLevel::Error)
                                .with_detail(err.to_string()),
                        );
                        Err(err)
                    }
                }
            }
        }
    }
}

impl Drop for Deployment {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(err) = self.teardown() {
            let dir = self.terraform.options().terraform_dir.display().to_string();
            let _ = writeln!(
                io::stderr(),
                "landandbay: destroy failed for {dir}; resources may have leaked: {err}"
            );
        }
    }
}
