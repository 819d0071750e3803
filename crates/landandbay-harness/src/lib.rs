// crates/landandbay-harness/src/lib.rs
// ============================================================================
// Module: Land and Bay Harness Library
// Description: Shared harness for infrastructure integration tests.
// Purpose: Compose terraform variables, drive the apply/destroy lifecycle,
//          inspect provisioned AWS resources, and validate their shape.
// Dependencies: aws-config, aws-sdk-ec2, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! `landandbay-harness` is the library behind the Land and Bay infrastructure
//! system tests. A test builds a [`TestContext`], composes a [`VarMap`] for a
//! [`ModuleKind`], wraps a [`Terraform`] driver in a [`Deployment`] guard so
//! teardown always runs, then inspects resources through an [`Ec2Inspector`]
//! and checks them with the pure helpers in [`validate`].
//!
//! Every helper takes its settings from an explicit [`HarnessConfig`]; there is
//! no process-wide configuration state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod inspect;
pub mod lifecycle;
pub mod module;
pub mod network;
pub mod probe;
pub mod terraform;
pub mod validate;
pub mod vars;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use config::CleanupPolicy;
pub use config::ConfigError;
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use events::EventSink;
pub use events::HarnessEvent;
pub use ids::RunToken;
pub use ids::TestContext;
pub use inspect::AwsEc2Inspector;
pub use inspect::Ec2Inspector;
pub use inspect::InspectError;
pub use inspect::StaticEc2Inspector;
pub use lifecycle::Deployment;
pub use module::ModuleError;
pub use probe::ProbeError;
pub use terraform::Terraform;
pub use terraform::TerraformError;
pub use terraform::TerraformOptions;
pub use validate::ValidationError;
pub use vars::ModuleKind;
pub use vars::VarMap;
pub use vars::VarValue;
