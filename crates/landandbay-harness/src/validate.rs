// crates/landandbay-harness/src/validate.rs
// ============================================================================
// Module: Resource Assertions
// Description: Pure checks for names, tags, and security group rules.
// Purpose: Turn resource records into pass/fail results with precise reasons.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every check here is pure and returns `Result<(), ValidationError>`, so
//! suites choose how a failure surfaces. Tag checks use subset semantics:
//! extra tags on the resource are ignored and every missing key or value
//! mismatch is reported, not just the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use crate::inspect::IpPermissionRecord;
use crate::network::Ipv4Cidr;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// One problem found by [`validate_resource_tags`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagProblem {
    /// The expected key is absent.
    Missing {
        /// Tag key.
        key: String,
    },
    /// The key is present with a different value.
    Mismatch {
        /// Tag key.
        key: String,
        /// Expected value.
        expected: String,
        /// Observed value.
        actual: String,
    },
}

impl fmt::Display for TagProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing {
                key,
            } => write!(f, "expected tag {key} not found"),
            Self::Mismatch {
                key,
                expected,
                actual,
            } => write!(f, "tag {key} is '{actual}', expected '{expected}'"),
        }
    }
}

/// Assertion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Name does not start with the prefix.
    #[error("resource {name} should start with prefix {prefix}")]
    MissingPrefix {
        /// Checked name.
        name: String,
        /// Required prefix.
        prefix: String,
    },
    /// Name does not end with the suffix.
    #[error("resource {name} should end with suffix {suffix}")]
    MissingSuffix {
        /// Checked name.
        name: String,
        /// Required suffix.
        suffix: String,
    },
    /// One or more expected tags are missing or differ.
    #[error("tag check failed: {}", join_problems(.0))]
    Tags(Vec<TagProblem>),
    /// No rule matches the shape.
    #[error("no {direction} rule matches {shape}")]
    RuleNotFound {
        /// `ingress` or `egress`, as labelled by the caller.
        direction: &'static str,
        /// Expected shape.
        shape: RuleShape,
    },
    /// A required CIDR is missing from the matching rules.
    #[error("rule {shape} does not allow {cidr}")]
    CidrMissing {
        /// Rule shape.
        shape: RuleShape,
        /// Required CIDR.
        cidr: String,
    },
    /// A forbidden CIDR is allowed by the matching rules.
    #[error("rule {shape} must not allow {cidr}")]
    CidrForbidden {
        /// Rule shape.
        shape: RuleShape,
        /// Forbidden CIDR.
        cidr: String,
    },
    /// A rule CIDR is not contained in any allowed block.
    #[error("rule {shape} allows {cidr} outside the permitted blocks")]
    CidrOutsideAllowed {
        /// Rule shape.
        shape: RuleShape,
        /// Offending CIDR.
        cidr: String,
    },
}

/// Joins tag problems for display.
fn join_problems(problems: &[TagProblem]) -> String {
    problems.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Naming and Tags
// ============================================================================

/// Checks a resource name against the run prefix and an optional suffix.
///
/// # Errors
///
/// Returns [`ValidationError::MissingPrefix`] or
/// [`ValidationError::MissingSuffix`]. An empty suffix is not checked.
pub fn validate_resource_naming(
    name: &str,
    prefix: &str,
    suffix: &str,
) -> Result<(), ValidationError> {
    if !name.starts_with(prefix) {
        return Err(ValidationError::MissingPrefix {
            name: name.to_string(),
            prefix: prefix.to_string(),
        });
    }
    if !suffix.is_empty() && !name.ends_with(suffix) {
        return Err(ValidationError::MissingSuffix {
            name: name.to_string(),
            suffix: suffix.to_string(),
        });
    }
    Ok(())
}

/// Checks that every expected tag is present with the expected value.
///
/// # Errors
///
/// Returns [`ValidationError::Tags`] listing each missing key and mismatch.
pub fn validate_resource_tags(
    actual: &BTreeMap<String, String>,
    expected: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    let problems: Vec<TagProblem> = expected
        .iter()
        .filter_map(|(key, expected_value)| match actual.get(key) {
            None => Some(TagProblem::Missing {
                key: key.clone(),
            }),
            Some(actual_value) if actual_value != expected_value => Some(TagProblem::Mismatch {
                key: key.clone(),
                expected: expected_value.clone(),
                actual: actual_value.clone(),
            }),
            Some(_) => None,
        })
        .collect();
    if problems.is_empty() { Ok(()) } else { Err(ValidationError::Tags(problems)) }
}

// ============================================================================
// SECTION: Rule Shapes
// ============================================================================

/// Protocol and port range identifying a security group rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleShape {
    /// IP protocol (`tcp`, `udp`, `-1`).
    pub protocol: String,
    /// First port, absent for all-protocol rules.
    pub from_port: Option<i32>,
    /// Last port, absent for all-protocol rules.
    pub to_port: Option<i32>,
}

impl RuleShape {
    /// TCP rule for a single port.
    #[must_use]
    pub fn tcp(port: i32) -> Self {
        Self::tcp_range(port, port)
    }

    /// TCP rule for a port range.
    #[must_use]
    pub fn tcp_range(from_port: i32, to_port: i32) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: Some(from_port),
            to_port: Some(to_port),
        }
    }

    /// Rule covering all protocols and ports.
    #[must_use]
    pub fn all_traffic() -> Self {
        Self {
            protocol: "-1".to_string(),
            from_port: None,
            to_port: None,
        }
    }

    /// Returns true when `permission` has this shape. All-traffic rules match
    /// on protocol alone because EC2 reports their ports as absent or `-1`.
    #[must_use]
    pub fn matches(&self, permission: &IpPermissionRecord) -> bool {
        if permission.protocol != self.protocol {
            return false;
        }
        if self.protocol == "-1" {
            return true;
        }
        permission.from_port == self.from_port && permission.to_port == self.to_port
    }
}

impl fmt::Display for RuleShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.from_port, self.to_port) {
            (Some(from), Some(to)) if from == to => write!(f, "{}/{from}", self.protocol),
            (Some(from), Some(to)) => write!(f, "{}/{from}-{to}", self.protocol),
            _ => write!(f, "{}/all", self.protocol),
        }
    }
}

/// Returns every permission with the given shape.
#[must_use]
pub fn find_rules<'a>(
    permissions: &'a [IpPermissionRecord],
    shape: &RuleShape,
) -> Vec<&'a IpPermissionRecord> {
    permissions.iter().filter(|permission| shape.matches(permission)).collect()
}

/// Returns true when any permission has the given shape.
#[must_use]
pub fn has_rule(permissions: &[IpPermissionRecord], shape: &RuleShape) -> bool {
    permissions.iter().any(|permission| shape.matches(permission))
}

/// Returns the CIDRs of every matching permission, in order, without
/// duplicates.
#[must_use]
pub fn rule_cidrs(permissions: &[IpPermissionRecord], shape: &RuleShape) -> Vec<String> {
    let mut cidrs: Vec<String> = Vec::new();
    for permission in find_rules(permissions, shape) {
        for cidr in &permission.cidr_blocks {
            if !cidrs.contains(cidr) {
                cidrs.push(cidr.clone());
            }
        }
    }
    cidrs
}

/// Returns the referenced security groups of every matching permission.
#[must_use]
pub fn rule_source_groups(permissions: &[IpPermissionRecord], shape: &RuleShape) -> Vec<String> {
    let mut groups: Vec<String> = Vec::new();
    for permission in find_rules(permissions, shape) {
        for group in &permission.source_group_ids {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
    }
    groups
}

// ============================================================================
// SECTION: Rule Validation
// ============================================================================

/// CIDR expectations for [`validate_rule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CidrExpectation {
    /// CIDRs that must appear verbatim.
    pub must_include: Vec<String>,
    /// CIDRs that must not appear verbatim.
    pub must_exclude: Vec<String>,
    /// When set, every rule CIDR must lie inside one of these blocks.
    pub within: Option<Vec<Ipv4Cidr>>,
}

impl CidrExpectation {
    /// Requires the given CIDRs.
    #[must_use]
    pub fn including<I, S>(cidrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            must_include: cidrs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds forbidden CIDRs.
    #[must_use]
    pub fn excluding<I, S>(mut self, cidrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.must_exclude.extend(cidrs.into_iter().map(Into::into));
        self
    }

    /// Restricts every rule CIDR to the given blocks.
    #[must_use]
    pub fn within(mut self, blocks: Vec<Ipv4Cidr>) -> Self {
        self.within = Some(blocks);
        self
    }
}

/// Checks that a rule with `shape` exists and that its CIDRs meet `expect`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found: a missing rule, a missing or
/// forbidden CIDR, or a CIDR outside the permitted blocks.
pub fn validate_rule(
    direction: &'static str,
    permissions: &[IpPermissionRecord],
    shape: &RuleShape,
    expect: &CidrExpectation,
) -> Result<(), ValidationError> {
    if !has_rule(permissions, shape) {
        return Err(ValidationError::RuleNotFound {
            direction,
            shape: shape.clone(),
        });
    }
    let cidrs = rule_cidrs(permissions, shape);
    if let Some(cidr) = expect.must_include.iter().find(|cidr| !cidrs.contains(cidr)) {
        return Err(ValidationError::CidrMissing {
            shape: shape.clone(),
            cidr: cidr.clone(),
        });
    }
    if let Some(cidr) = expect.must_exclude.iter().find(|cidr| cidrs.contains(cidr)) {
        return Err(ValidationError::CidrForbidden {
            shape: shape.clone(),
            cidr: cidr.clone(),
        });
    }
    if let Some(blocks) = &expect.within {
        for cidr in &cidrs {
            let inside = Ipv4Cidr::parse(cidr)
                .is_ok_and(|parsed| blocks.iter().any(|block| block.contains(&parsed)));
            if !inside {
                return Err(ValidationError::CidrOutsideAllowed {
                    shape: shape.clone(),
                    cidr: cidr.clone(),
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
