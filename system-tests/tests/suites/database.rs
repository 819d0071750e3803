// system-tests/tests/suites/database.rs
// ============================================================================
// Module: Database Module Tests
// Description: Provision the RDS module and check its outputs.
// Purpose: Verify instance naming, groups, and configuration variants.
// Dependencies: system-tests helpers, landandbay-harness
// ============================================================================

//! ## Overview
//! The database module runs against placeholder subnet and security group
//! ids. Checks are made on terraform outputs.

use helpers::artifacts::TestReporter;
use helpers::harness::Suite;
use helpers::harness::SuiteResult;
use helpers::harness::ensure;
use landandbay_harness::Deployment;
use landandbay_harness::ModuleKind;
use landandbay_harness::TestContext;
use landandbay_harness::VarMap;
use landandbay_harness::validate::validate_resource_naming;
use landandbay_harness::vars::default_database_test_vars;

use crate::helpers;

/// Applies the database module with the scenario defaults plus `overrides`.
fn deploy(
    suite: &Suite,
    ctx: &TestContext,
    overrides: VarMap,
    reporter: &mut TestReporter,
) -> SuiteResult<Deployment> {
    let vars = default_database_test_vars().merged(overrides);
    suite.deploy_module(ModuleKind::Database, ctx, vars, reporter)
}

/// Returns the instance id after checking it is present.
fn instance_id(deployment: &Deployment) -> SuiteResult<String> {
    let id = deployment.output("db_instance_id")?;
    ensure(!id.is_empty(), "db_instance_id is empty")?;
    Ok(id)
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_creates_rds_instance() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_creates_rds_instance")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let id = instance_id(&deployment)?;
    ensure(id == ctx.resource_name("postgres"), format!("instance id is {id}"))?;
    let endpoint = deployment.output("db_instance_endpoint")?;
    ensure(!endpoint.is_empty(), "db_instance_endpoint is empty")?;
    let name = deployment.output("db_instance_name")?;
    ensure(name == "testdb", format!("database name is {name}"))?;
    let port = deployment.output("db_instance_port")?;
    ensure(port == "5432", format!("database port is {port}"))?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{id} listening on {port}")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_creates_subnet_group() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_creates_subnet_group")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let group = deployment.output("db_subnet_group_name")?;
    ensure(group == ctx.resource_name("db-subnet-group"), format!("subnet group is {group}"))?;

    deployment.destroy()?;
    reporter.pass(vec![group])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_creates_parameter_group() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_creates_parameter_group")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let group = deployment.output("db_parameter_group_name")?;
    ensure(group == ctx.resource_name("postgres16"), format!("parameter group is {group}"))?;

    deployment.destroy()?;
    reporter.pass(vec![group])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_integrates_secrets_manager() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_integrates_secrets_manager")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let overrides = VarMap::new()
        .with("use_secrets_manager", true)
        .with("db_backup_retention_period", 14);
    let deployment = deploy(&suite, &ctx, overrides, &mut reporter)?;

    let id = instance_id(&deployment)?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{id} created with secrets manager credentials")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_accepts_extended_backup_retention() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_accepts_extended_backup_retention")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let overrides = VarMap::new().with("db_backup_retention_period", 30);
    let deployment = deploy(&suite, &ctx, overrides, &mut reporter)?;

    let id = instance_id(&deployment)?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{id} created with 30 day retention")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_applies_with_default_encryption() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_applies_with_default_encryption")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let id = instance_id(&deployment)?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{id} created with module encryption defaults")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_runs_postgis_setup() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_runs_postgis_setup")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let overrides = VarMap::new().with("auto_setup_database", true);
    let deployment = deploy(&suite, &ctx, overrides, &mut reporter)?;

    let id = instance_id(&deployment)?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{id} created with database setup enabled")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_names_resources_with_prefix() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_names_resources_with_prefix")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Database)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    for (output, suffix) in [
        ("db_instance_id", "postgres"),
        ("db_subnet_group_name", "db-subnet-group"),
        ("db_parameter_group_name", "postgres16"),
    ] {
        validate_resource_naming(&deployment.output(output)?, ctx.prefix(), suffix)?;
    }

    deployment.destroy()?;
    reporter.pass(vec![format!("names carry prefix {}", ctx.prefix())])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn database_module_accepts_storage_sizes() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("database_module_accepts_storage_sizes")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let mut notes = Vec::new();
    for (storage, label) in [(20, "minimum"), (100, "medium"), (1000, "large")] {
        let ctx = suite.module_context(ModuleKind::Database)?;
        let overrides = VarMap::new().with("db_allocated_storage", storage);
        let deployment = deploy(&suite, &ctx, overrides, &mut reporter)?;
        let id = instance_id(&deployment)?;
        deployment.destroy()?;
        notes.push(format!("{label} storage ({storage} GiB): {id}"));
    }

    reporter.pass(notes)?;
    Ok(())
}
