// crates/landandbay-harness/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers and fixtures for harness integration tests.
// ============================================================================
//! ## Overview
//! Result-based assertions, a deterministic test context, and the fake
//! terraform binary used by the driver tests.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only helpers; not every test binary uses every helper."
)]


use std::error::Error;
use std::fmt;

use landandbay_harness::RunToken;
use landandbay_harness::TestContext;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across harness integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Box::new(TestError {
            message: message.into(),
        }))
    }
}

// ========================================================================
// Fixtures
// ========================================================================

/// Returns a context with the fixed token `123` in `us-east-1`.
pub fn fixed_context(working_dir: &str) -> TestContext {
    let token = RunToken::parse("123").expect("fixed token");
    TestContext::with_token(working_dir, "us-east-1", &token)
}
