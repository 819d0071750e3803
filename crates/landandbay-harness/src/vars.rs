// crates/landandbay-harness/src/vars.rs
// ============================================================================
// Module: Terraform Variables
// Description: Variable values, ordered variable maps, and per-module defaults.
// Purpose: Compose the variables each scenario hands to terraform.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Variables flow through a three-level override chain:
//! [`module_defaults`] for the target module, then scenario defaults (for
//! example [`default_database_test_vars`]), then caller overrides. Each level
//! is a [`VarMap`] and later maps win on key conflicts; keys absent from the
//! defaults are added.
//!
//! The module is selected by an explicit [`ModuleKind`]. The legacy
//! path-substring detection remains available through
//! [`module_vars_for_path`], whose unrecognized paths silently fall back to the
//! generic default set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::TestContext;

// ============================================================================
// SECTION: Values
// ============================================================================

/// A single terraform variable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    /// String value.
    String(String),
    /// Whole-number value.
    Integer(i64),
    /// Boolean value.
    Bool(bool),
    /// Ordered list of strings.
    List(Vec<String>),
    /// String-keyed map of strings (for example `tags`).
    Map(BTreeMap<String, String>),
}

impl VarValue {
    /// Returns the string payload, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the list payload, if this is a list value.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<&str> for VarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for VarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for VarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for VarValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u16> for VarValue {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for VarValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for VarValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for VarValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for VarValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for VarValue {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|value| (*value).to_string()).collect())
    }
}

impl From<BTreeMap<String, String>> for VarValue {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self::Map(values)
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::List(values) => write!(f, "[{}]", values.join(", ")),
            Self::Map(values) => {
                let entries: Vec<String> =
                    values.iter().map(|(key, value)| format!("{key} = {value}")).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
        }
    }
}

// ============================================================================
// SECTION: Variable Map
// ============================================================================

/// Ordered mapping of terraform variable names to values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarMap(BTreeMap<String, VarValue>);

impl VarMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a value, returning the previous value for the key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<VarValue>,
    ) -> Option<VarValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<VarValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&VarValue> {
        self.0.get(key)
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<VarValue> {
        self.0.remove(key)
    }

    /// Returns true when the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, VarValue> {
        self.0.iter()
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies `overrides` on top of this map. Override values win and new keys
    /// are added.
    pub fn merge(&mut self, overrides: Self) {
        self.0.extend(overrides.0);
    }

    /// Consuming form of [`Self::merge`].
    #[must_use]
    pub fn merged(mut self, overrides: Self) -> Self {
        self.merge(overrides);
        self
    }
}

impl<K: Into<String>, V: Into<VarValue>> FromIterator<(K, V)> for VarMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
    }
}

impl IntoIterator for VarMap {
    type Item = (String, VarValue);
    type IntoIter = btree_map::IntoIter<String, VarValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a VarMap {
    type Item = (&'a String, &'a VarValue);
    type IntoIter = btree_map::Iter<'a, String, VarValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds a [`VarMap`] from `key => value` pairs.
///
/// ```
/// let vars = landandbay_harness::vars! {
///     "create_vpc" => true,
///     "db_allocated_storage" => 20,
/// };
/// assert_eq!(vars.len(), 2);
/// ```
#[macro_export]
macro_rules! vars {
    () => { $crate::vars::VarMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::vars::VarMap::new();
        $( map.insert($key, $value); )+
        map
    }};
}

// ============================================================================
// SECTION: Module Kinds
// ============================================================================

/// Independently applicable terraform module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// VPC, subnets, gateways, and endpoints.
    Networking,
    /// RDS `PostgreSQL` instance with subnet and parameter groups.
    Database,
    /// ECR, ECS, IAM roles, and the bastion host.
    Compute,
    /// Security groups and WAF.
    Security,
    /// Any module without a dedicated default set.
    Other,
}

impl ModuleKind {
    /// Modules with a dedicated default set.
    pub const KNOWN: [Self; 4] = [Self::Networking, Self::Database, Self::Compute, Self::Security];

    /// Returns the module directory name under the modules root.
    #[must_use]
    pub const fn dir_name(self) -> Option<&'static str> {
        match self {
            Self::Networking => Some("networking"),
            Self::Database => Some("database"),
            Self::Compute => Some("compute"),
            Self::Security => Some("security"),
            Self::Other => None,
        }
    }

    /// Returns true when the module's variable schema includes `aws_region`.
    #[must_use]
    pub const fn requires_region(self) -> bool {
        !matches!(self, Self::Security)
    }

    /// Detects the module from a path by substring, checking `/security`,
    /// `/networking`, `/database`, then `/compute`. Unrecognized paths yield
    /// [`ModuleKind::Other`] rather than an error.
    #[must_use]
    pub fn from_module_path(path: &str) -> Self {
        let path = path.replace('\\', "/");
        if path.contains("/security") {
            Self::Security
        } else if path.contains("/networking") {
            Self::Networking
        } else if path.contains("/database") {
            Self::Database
        } else if path.contains("/compute") {
            Self::Compute
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name().unwrap_or("other"))
    }
}

// ============================================================================
// SECTION: Placeholder Dependencies
// ============================================================================

/// Placeholder VPC id for modules applied without the networking module.
pub const PLACEHOLDER_VPC_ID: &str = "vpc-12345678";
/// Placeholder subnet ids for modules applied without the networking module.
pub const PLACEHOLDER_SUBNET_IDS: [&str; 2] = ["subnet-12345", "subnet-67890"];
/// Placeholder public subnet id for the compute module.
pub const PLACEHOLDER_PUBLIC_SUBNET_ID: &str = "subnet-public";
/// Database subnet CIDRs handed to the security module.
pub const DATABASE_SUBNET_CIDRS: [&str; 2] = ["10.0.5.0/24", "10.0.6.0/24"];
/// Default bastion ingress CIDR.
pub const DEFAULT_BASTION_CIDR: &str = "10.0.0.0/8";
/// Instance class used by every database scenario.
pub const DB_INSTANCE_CLASS: &str = "db.t4g.micro";
/// Minimum allocated storage in GiB.
pub const DB_ALLOCATED_STORAGE: i64 = 20;
/// Password used by module-level database scenarios.
pub const DB_PASSWORD: &str = "testpassword123!";
/// Application container port.
pub const CONTAINER_PORT: u16 = 8000;
/// Fake account id used in placeholder ARNs.
const ACCOUNT_ID: &str = "123456789012";

/// Returns a placeholder ELB target group ARN.
fn target_group_arn(region: &str, name: &str) -> String {
    format!(
        "arn:aws:elasticloadbalancing:{region}:{ACCOUNT_ID}:targetgroup/{name}/1234567890123456"
    )
}

/// Returns a placeholder Secrets Manager ARN.
fn secret_arn(region: &str, name: &str) -> String {
    format!("arn:aws:secretsmanager:{region}:{ACCOUNT_ID}:secret:{name}")
}

/// Returns a placeholder KMS key ARN.
fn kms_key_arn(region: &str) -> String {
    format!("arn:aws:kms:{region}:{ACCOUNT_ID}:key/12345678-1234-1234-1234-123456789012")
}

// ============================================================================
// SECTION: Module Defaults
// ============================================================================

/// Returns the fixed default set for a module.
#[must_use]
pub fn module_defaults(kind: ModuleKind, ctx: &TestContext) -> VarMap {
    let region = ctx.region();
    match kind {
        ModuleKind::Security => vars! {
            "prefix" => ctx.prefix(),
            "vpc_id" => PLACEHOLDER_VPC_ID,
            "allowed_bastion_cidrs" => [DEFAULT_BASTION_CIDR],
            "database_subnet_cidrs" => DATABASE_SUBNET_CIDRS,
        },
        ModuleKind::Networking => vars! {
            "prefix" => ctx.prefix(),
            "aws_region" => region,
            "create_vpc" => true,
            "create_public_subnets" => true,
            "create_private_subnets" => true,
            "create_db_subnets" => true,
        },
        ModuleKind::Database => vars! {
            "prefix" => ctx.prefix(),
            "aws_region" => region,
            "db_subnet_ids" => PLACEHOLDER_SUBNET_IDS,
            "db_security_group_id" => "sg-db123",
            "db_allocated_storage" => DB_ALLOCATED_STORAGE,
            "db_instance_class" => DB_INSTANCE_CLASS,
            "db_password" => DB_PASSWORD,
            "db_name" => "testdb",
            "db_username" => "testuser",
            "app_db_username" => "appuser",
        },
        ModuleKind::Compute => vars! {
            "prefix" => ctx.prefix(),
            "aws_region" => region,
            "private_subnet_ids" => PLACEHOLDER_SUBNET_IDS,
            "public_subnet_id" => PLACEHOLDER_PUBLIC_SUBNET_ID,
            "app_security_group_id" => "sg-app123",
            "bastion_security_group_id" => "sg-bastion123",
            "db_url_secret_arn" => secret_arn(region, "test-db-url"),
            "secret_key_secret_arn" => secret_arn(region, "test-secret-key"),
            "secrets_kms_key_arn" => kms_key_arn(region),
            "bastion_key_name" => "test-key",
            "bastion_public_key" => "",
            "create_new_key_pair" => false,
            "container_port" => CONTAINER_PORT,
            "domain_name" => ctx.domain_name(),
            "enable_ssr" => false,
            "health_check_path" => "/api/health/",
            "api_target_group_arn" => target_group_arn(region, "test-api"),
            "ssr_target_group_arn" => target_group_arn(region, "test-ssr"),
        },
        ModuleKind::Other => vars! {
            "prefix" => ctx.prefix(),
            "aws_region" => region,
        },
    }
}

/// Returns the module defaults merged with caller overrides.
#[must_use]
pub fn module_vars(kind: ModuleKind, ctx: &TestContext, overrides: VarMap) -> VarMap {
    module_defaults(kind, ctx).merged(overrides)
}

/// Path-keyed form of [`module_vars`]. A typo in `module_path` silently
/// degrades to the generic default set.
#[must_use]
pub fn module_vars_for_path(module_path: &str, ctx: &TestContext, overrides: VarMap) -> VarMap {
    module_vars(ModuleKind::from_module_path(module_path), ctx, overrides)
}

/// Returns the defaults for the root (full-stack) configuration.
#[must_use]
pub fn root_defaults(ctx: &TestContext) -> VarMap {
    vars! {
        "prefix" => ctx.prefix(),
        "aws_region" => ctx.region(),
        "create_vpc" => true,
        "create_public_subnets" => true,
        "create_private_subnets" => true,
        "create_db_subnets" => true,
        // SSR stays off unless a scenario needs it.
        "enable_ssr" => false,
        "db_allocated_storage" => DB_ALLOCATED_STORAGE,
        "db_instance_class" => DB_INSTANCE_CLASS,
        "route53_zone_id" => "Z123456789",
        "domain_name" => ctx.domain_name(),
        "acm_certificate_arn" => ctx.acm_certificate_arn(),
        "alert_email" => "test@example.com",
        "db_password" => DB_PASSWORD,
        "app_db_password" => "apppassword123!",
    }
}

/// Returns the root defaults merged with caller overrides.
#[must_use]
pub fn root_vars(ctx: &TestContext, overrides: VarMap) -> VarMap {
    root_defaults(ctx).merged(overrides)
}

// ============================================================================
// SECTION: Scenario Defaults
// ============================================================================

/// Scenario defaults shared by the security module tests.
#[must_use]
pub fn security_test_vars() -> VarMap {
    vars! {
        "vpc_id" => PLACEHOLDER_VPC_ID,
        "allowed_bastion_cidrs" => [DEFAULT_BASTION_CIDR],
        "database_subnet_cidrs" => DATABASE_SUBNET_CIDRS,
    }
}

/// Scenario defaults shared by the database module tests.
#[must_use]
pub fn default_database_test_vars() -> VarMap {
    vars! {
        "db_subnet_ids" => ["subnet-db1", "subnet-db2"],
        "db_security_group_id" => "sg-database123",
        "db_allocated_storage" => DB_ALLOCATED_STORAGE,
        "db_engine_version" => "16.9",
        "db_instance_class" => DB_INSTANCE_CLASS,
        "db_name" => "testdb",
        "db_username" => "testuser",
        "db_password" => DB_PASSWORD,
        "app_db_username" => "appuser",
        "use_secrets_manager" => false,
        "db_backup_retention_period" => 7,
        "auto_setup_database" => false,
    }
}

/// Scenario defaults shared by the compute module tests.
#[must_use]
pub fn default_compute_test_vars(ctx: &TestContext) -> VarMap {
    module_defaults(ModuleKind::Compute, ctx).merged(vars! {
        "health_check_path" => "/health/",
    })
}

/// Scenario defaults shared by the full-stack tests, layered over the CIDR
/// table.
#[must_use]
pub fn full_stack_test_vars(ctx: &TestContext) -> VarMap {
    crate::network::integration_test_vars().merged(vars! {
        "enable_ssr" => false,
        "route53_zone_id" => "Z123456789",
        "domain_name" => ctx.domain_name(),
        "acm_certificate_arn" => ctx.acm_certificate_arn(),
        "alert_email" => "test@example.com",
        "db_password" => "SuperSecurePassword123!",
        "app_db_password" => "AppPassword123!",
        "bastion_key_name" => "test-key",
        "create_new_key_pair" => false,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
