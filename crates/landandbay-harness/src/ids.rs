// crates/landandbay-harness/src/ids.rs
// ============================================================================
// Module: Run Identity
// Description: Uniqueness tokens and per-test naming context.
// Purpose: Namespace provisioned resources so parallel tests do not collide.
// Dependencies: rand
// ============================================================================

//! ## Overview
//! A [`RunToken`] is issued from a process-scoped random seed plus a monotonic
//! counter, so tokens never repeat within a process and collide across
//! processes only with probability 2^-32 per pair. A [`TestContext`] derives the
//! test's unique id and resource prefix from a token and is immutable after
//! construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::config::ConfigError;
use crate::config::HarnessConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Project name leading every resource prefix.
pub const PROJECT_NAME: &str = "landandbay";
/// Maximum accepted token length.
const MAX_TOKEN_LENGTH: usize = 16;
/// Mask keeping issued tokens at 32 bits (8 hex characters).
const TOKEN_MASK: u64 = 0xFFFF_FFFF;

// ============================================================================
// SECTION: Run Token
// ============================================================================

/// Process-scoped token generator.
struct TokenGenerator {
    /// Random seed drawn once per process.
    seed: u64,
    /// Tokens issued so far.
    counter: AtomicU64,
}

impl TokenGenerator {
    /// Returns the process-wide generator.
    fn global() -> &'static Self {
        static GENERATOR: OnceLock<TokenGenerator> = OnceLock::new();
        GENERATOR.get_or_init(|| Self {
            seed: OsRng.next_u64(),
            counter: AtomicU64::new(0),
        })
    }

    /// Issues the next token value.
    fn next(&self) -> u64 {
        let issued = self.counter.fetch_add(1, Ordering::Relaxed);
        self.seed.wrapping_add(issued) & TOKEN_MASK
    }
}

/// Uniqueness token embedded in resource names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunToken(String);

impl RunToken {
    /// Issues a fresh token.
    #[must_use]
    pub fn issue() -> Self {
        Self(format!("{:08x}", TokenGenerator::global().next()))
    }

    /// Parses an externally supplied token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless the token is 1 to 16 lowercase
    /// ASCII letters or digits.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.is_empty() || raw.len() > MAX_TOKEN_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "run token must be 1 to {MAX_TOKEN_LENGTH} characters"
            )));
        }
        if !raw.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()) {
            return Err(ConfigError::Invalid(
                "run token must contain only lowercase letters and digits".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Test Context
// ============================================================================

/// Per-test naming and placement context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    /// Terraform working directory for the scenario.
    working_dir: PathBuf,
    /// AWS region.
    region: String,
    /// Resource name prefix (`landandbay-test-<token>`).
    prefix: String,
    /// Unique id (`test-<token>`).
    unique_id: String,
}

impl TestContext {
    /// Creates a context with a freshly issued token.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>, config: &HarnessConfig) -> Self {
        Self::with_token(working_dir, &config.region, &RunToken::issue())
    }

    /// Creates a context from an explicit token.
    #[must_use]
    pub fn with_token(working_dir: impl Into<PathBuf>, region: &str, token: &RunToken) -> Self {
        let unique_id = format!("test-{token}");
        Self {
            working_dir: working_dir.into(),
            region: region.to_string(),
            prefix: format!("{PROJECT_NAME}-{unique_id}"),
            unique_id,
        }
    }

    /// Returns the terraform working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns the AWS region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the resource name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns `<prefix>-<suffix>`.
    #[must_use]
    pub fn resource_name(&self, suffix: &str) -> String {
        format!("{}-{suffix}", self.prefix)
    }

    /// Returns the throwaway domain name for the test.
    #[must_use]
    pub fn domain_name(&self) -> String {
        format!("{}.example.com", self.unique_id)
    }

    /// Returns a placeholder ACM certificate ARN for the test.
    #[must_use]
    pub fn acm_certificate_arn(&self) -> String {
        format!("arn:aws:acm:{}:123456789012:certificate/{}", self.region, self.unique_id)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
