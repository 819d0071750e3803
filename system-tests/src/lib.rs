// system-tests/src/lib.rs
// ============================================================================
// Module: Land and Bay System Tests Library
// Description: Shared configuration for the live infrastructure suites.
// Purpose: Resolve one validated harness configuration per suite run.
// Dependencies: landandbay-harness
// ============================================================================

//! ## Overview
//! This crate hosts the configuration loader used by the suite binaries in
//! `system-tests/tests`. Suites provision real AWS resources and only build
//! with the `system-tests` feature enabled.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
