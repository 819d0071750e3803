// system-tests/src/config/mod.rs
// ============================================================================
// Module: Suite Configuration
// Description: Layered configuration for the live infrastructure suites.
// Purpose: Merge defaults, an optional TOML file, and environment overrides.
// Dependencies: landandbay-harness
// ============================================================================

//! ## Overview
//! Suite configuration starts from [`landandbay_harness::HarnessConfig`]
//! defaults, applies an optional TOML file, then applies `LANDANDBAY_TEST_*`
//! environment overrides. The merged result is validated once.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod env;

// ============================================================================
// SECTION: Tests
// ============================================================================


// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::SuiteConfig;
pub use env::SuiteEnv;
pub use env::read_env_strict;
