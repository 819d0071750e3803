// system-tests/tests/suites/compute.rs
// ============================================================================
// Module: Compute Module Tests
// Description: Provision ECR, ECS, IAM, and the bastion host.
// Purpose: Verify names, task definitions, and bastion placement.
// Dependencies: system-tests helpers, landandbay-harness
// ============================================================================

//! ## Overview
//! The compute module is applied with placeholder network, target group, and
//! secret ARNs. The bastion test inspects the running instance through EC2.

use helpers::artifacts::TestReporter;
use helpers::harness::Suite;
use helpers::harness::SuiteResult;
use helpers::harness::ensure;
use landandbay_harness::Deployment;
use landandbay_harness::Ec2Inspector;
use landandbay_harness::ModuleKind;
use landandbay_harness::TestContext;
use landandbay_harness::VarMap;
use landandbay_harness::vars;
use landandbay_harness::vars::PLACEHOLDER_PUBLIC_SUBNET_ID;
use landandbay_harness::vars::default_compute_test_vars;

use crate::helpers;

/// Instance type the bastion module provisions.
const BASTION_INSTANCE_TYPE: &str = "t4g.nano";

/// Applies the compute module with the scenario defaults plus `overrides`.
fn deploy(
    suite: &Suite,
    ctx: &TestContext,
    overrides: VarMap,
    reporter: &mut TestReporter,
) -> SuiteResult<Deployment> {
    let vars = default_compute_test_vars(ctx).merged(overrides);
    suite.deploy_module(ModuleKind::Compute, ctx, vars, reporter)
}

/// Applies the compute module and checks that a task definition was registered.
fn check_task_definition(
    suite: &Suite,
    reporter: &mut TestReporter,
    overrides: VarMap,
) -> SuiteResult<String> {
    let ctx = suite.module_context(ModuleKind::Compute)?;
    let deployment = deploy(suite, &ctx, overrides, reporter)?;
    let arn = deployment.output("ecs_task_definition_arn")?;
    ensure(arn.contains(":task-definition/"), format!("not a task definition arn: {arn}"))?;
    deployment.destroy()?;
    Ok(arn)
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_creates_ecr_repositories() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_creates_ecr_repositories")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Compute)?;
    let overrides = vars! {
        "health_check_path" => "/api/health/",
        "task_cpu" => 256,
        "task_memory" => 512,
        "desired_count" => 1,
    };
    let deployment = deploy(&suite, &ctx, overrides, &mut reporter)?;

    for (output, suffix) in [("api_ecr_repository_url", "api"), ("ssr_ecr_repository_url", "ssr")] {
        let url = deployment.output(output)?;
        let expected = ctx.resource_name(suffix);
        ensure(url.contains(&expected), format!("{output} {url} does not name {expected}"))?;
    }

    deployment.destroy()?;
    reporter.pass(vec!["api and ssr repositories created".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_creates_ecs_cluster() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_creates_ecs_cluster")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Compute)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let cluster = deployment.output("ecs_cluster_name")?;
    ensure(cluster == ctx.resource_name("cluster"), format!("cluster is named {cluster}"))?;

    deployment.destroy()?;
    reporter.pass(vec![cluster])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_creates_iam_roles() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_creates_iam_roles")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Compute)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let execution = deployment.output("ecs_task_execution_role_arn")?;
    ensure(execution.contains("ecsTaskExecutionRole"), format!("execution role is {execution}"))?;
    let task = deployment.output("ecs_task_role_arn")?;
    ensure(task.contains("ecsTaskRole"), format!("task role is {task}"))?;

    deployment.destroy()?;
    reporter.pass(vec![execution, task])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_registers_task_definition_without_ssr() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_registers_task_definition_without_ssr")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let overrides = vars! { "enable_ssr" => false, "task_cpu" => 256, "task_memory" => 512 };
    let arn = check_task_definition(&suite, &mut reporter, overrides)?;

    reporter.pass(vec![arn])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_registers_task_definition_with_ssr() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_registers_task_definition_with_ssr")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let overrides = vars! { "enable_ssr" => true, "task_cpu" => 512, "task_memory" => 1024 };
    let arn = check_task_definition(&suite, &mut reporter, overrides)?;

    reporter.pass(vec![arn])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_creates_bastion_host() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_creates_bastion_host")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Compute)?;
    let deployment = deploy(&suite, &ctx, VarMap::new(), &mut reporter)?;

    let instance_id = deployment.output("bastion_instance_id")?;
    let instance = suite.inspector().await.describe_instance(&instance_id).await?;
    ensure(instance.is_running(), format!("bastion is {}", instance.state))?;
    ensure(
        instance.instance_type == BASTION_INSTANCE_TYPE,
        format!("bastion type is {}", instance.instance_type),
    )?;
    ensure(
        instance.subnet_id == PLACEHOLDER_PUBLIC_SUBNET_ID,
        format!("bastion is in {}", instance.subnet_id),
    )?;
    if let Some(device) = instance.block_devices.first() {
        ensure(device.volume_id.is_some(), format!("{} has no EBS volume", device.device_name))?;
    }

    deployment.destroy()?;
    reporter.pass(vec![format!("{instance_id} running in {}", instance.subnet_id)])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn compute_module_accepts_cpu_memory_combinations() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("compute_module_accepts_cpu_memory_combinations")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let mut notes = Vec::new();
    for (cpu, memory) in [(256, 512), (256, 1024), (512, 1024), (1024, 2048)] {
        let overrides = vars! { "task_cpu" => cpu, "task_memory" => memory };
        let arn = check_task_definition(&suite, &mut reporter, overrides)?;
        notes.push(format!("{cpu} cpu / {memory} MiB: {arn}"));
    }

    reporter.pass(notes)?;
    Ok(())
}
