// system-tests/tests/suites/networking.rs
// ============================================================================
// Module: Networking Module Tests
// Description: Provision the networking module and inspect the VPC it builds.
// Purpose: Verify subnet layout, gateway attachment, and naming.
// Dependencies: system-tests helpers, landandbay-harness
// ============================================================================

//! ## Overview
//! Each test applies the networking module with the fixed CIDR table, reads
//! its outputs, and checks the resulting resources through EC2 describe
//! calls. Every deployment is destroyed on every exit path.

use helpers::harness::Suite;
use helpers::harness::SuiteResult;
use helpers::harness::ensure;
use landandbay_harness::Ec2Inspector;
use landandbay_harness::ModuleKind;
use landandbay_harness::inspect::ResourceKind;
use landandbay_harness::inspect::validate_aws_resource;
use landandbay_harness::network::networking_test_vars;
use landandbay_harness::network::vpc_cidr_blocks;
use landandbay_harness::validate::validate_resource_naming;
use landandbay_harness::vars;

use crate::helpers;

/// Checks that `subnet_ids` are available subnets with the expected layout.
async fn check_subnets(
    inspector: &dyn Ec2Inspector,
    subnet_ids: &[String],
    cidr_keys: [&str; 2],
    region: &str,
    public: bool,
) -> SuiteResult {
    ensure(subnet_ids.len() == 2, format!("expected 2 subnets, found {}", subnet_ids.len()))?;
    let cidrs = vpc_cidr_blocks();
    for ((subnet_id, cidr_key), zone) in subnet_ids.iter().zip(cidr_keys).zip(["a", "b"]) {
        let subnet = inspector.describe_subnet(subnet_id).await?;
        ensure(subnet.is_available(), format!("subnet {subnet_id} is {}", subnet.state))?;
        ensure(
            subnet.map_public_ip_on_launch == public,
            format!("subnet {subnet_id} map_public_ip_on_launch should be {public}"),
        )?;
        let expected_cidr = cidrs[cidr_key];
        ensure(
            subnet.cidr_block == expected_cidr,
            format!("subnet {subnet_id} has cidr {}, expected {expected_cidr}", subnet.cidr_block),
        )?;
        if public {
            let expected_zone = format!("{region}{zone}");
            let zone = &subnet.availability_zone;
            ensure(
                *zone == expected_zone,
                format!("subnet {subnet_id} is in {zone}, expected {expected_zone}"),
            )?;
        }
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_creates_vpc() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_creates_vpc")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let deployment =
        suite.deploy_module(ModuleKind::Networking, &ctx, networking_test_vars(), &mut reporter)?;

    let vpc_id = deployment.output("vpc_id")?;
    ensure(!vpc_id.is_empty(), "vpc_id output is empty")?;
    let inspector = suite.inspector().await;
    validate_aws_resource(&inspector, ResourceKind::Vpc, &vpc_id).await?;
    let vpc = inspector.describe_vpc(&vpc_id).await?;
    let expected = vpc_cidr_blocks()["vpc_cidr"];
    ensure(vpc.cidr_block == expected, format!("vpc cidr {} != {expected}", vpc.cidr_block))?;

    deployment.destroy()?;
    reporter.pass(vec![format!("vpc {vpc_id} available with {expected}")])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_creates_public_subnets() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_creates_public_subnets")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let overrides = networking_test_vars().with("create_public_subnets", true);
    let deployment = suite.deploy_module(ModuleKind::Networking, &ctx, overrides, &mut reporter)?;

    let subnet_ids = deployment.output_list("public_subnet_ids")?;
    let inspector = suite.inspector().await;
    check_subnets(
        &inspector,
        &subnet_ids,
        ["public_subnet_a_cidr", "public_subnet_b_cidr"],
        ctx.region(),
        true,
    )
    .await?;

    deployment.destroy()?;
    reporter.pass(vec!["public subnets span zones a and b and map public IPs".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_creates_private_subnets() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_creates_private_subnets")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let overrides = networking_test_vars().with("create_private_subnets", true);
    let deployment = suite.deploy_module(ModuleKind::Networking, &ctx, overrides, &mut reporter)?;

    let subnet_ids = deployment.output_list("private_subnet_ids")?;
    let inspector = suite.inspector().await;
    check_subnets(
        &inspector,
        &subnet_ids,
        ["private_subnet_a_cidr", "private_subnet_b_cidr"],
        ctx.region(),
        false,
    )
    .await?;

    deployment.destroy()?;
    reporter.pass(vec!["private app subnets do not map public IPs".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_creates_database_subnets() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_creates_database_subnets")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let overrides = networking_test_vars().with("create_db_subnets", true);
    let deployment = suite.deploy_module(ModuleKind::Networking, &ctx, overrides, &mut reporter)?;

    let subnet_ids = deployment.output_list("private_db_subnet_ids")?;
    let inspector = suite.inspector().await;
    check_subnets(
        &inspector,
        &subnet_ids,
        ["private_db_subnet_a_cidr", "private_db_subnet_b_cidr"],
        ctx.region(),
        false,
    )
    .await?;

    deployment.destroy()?;
    reporter.pass(vec!["database subnets match the CIDR table".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_attaches_internet_gateway() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_attaches_internet_gateway")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let deployment =
        suite.deploy_module(ModuleKind::Networking, &ctx, networking_test_vars(), &mut reporter)?;

    let vpc_id = deployment.output("vpc_id")?;
    let gateways = suite.inspector().await.describe_internet_gateways_for_vpc(&vpc_id).await?;
    ensure(gateways.len() == 1, format!("expected 1 internet gateway, found {}", gateways.len()))?;
    let gateway = &gateways[0];
    ensure(gateway.attachments.len() == 1, "gateway should have exactly one attachment")?;
    ensure(gateway.is_attached_to(&vpc_id), format!("gateway is not attached to {vpc_id}"))?;
    let state = gateway.attachments[0].state.as_str();
    ensure(
        matches!(state, "attached" | "available"),
        format!("gateway attachment state is {state}"),
    )?;

    deployment.destroy()?;
    reporter.pass(vec![format!("{} attached to {vpc_id}", gateway.internet_gateway_id)])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_creates_vpc_endpoints() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_creates_vpc_endpoints")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let overrides = networking_test_vars().merged(vars! {
        "create_vpc_endpoints" => true,
        "create_private_subnets" => true,
    });
    let deployment = suite.deploy_module(ModuleKind::Networking, &ctx, overrides, &mut reporter)?;

    // Endpoint describe calls are not part of the inspector; a successful
    // apply with a VPC is the check.
    let vpc_id = deployment.output("vpc_id")?;
    ensure(!vpc_id.is_empty(), "vpc_id output is empty")?;

    deployment.destroy()?;
    reporter.pass(vec!["apply with interface and gateway endpoints succeeded".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_skips_disabled_components() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_skips_disabled_components")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let overrides = networking_test_vars().merged(vars! {
        "create_public_subnets" => false,
        "create_private_subnets" => false,
        "create_db_subnets" => false,
        "create_vpc_endpoints" => false,
    });
    let deployment = suite.deploy_module(ModuleKind::Networking, &ctx, overrides, &mut reporter)?;

    let vpc_id = deployment.output("vpc_id")?;
    ensure(!vpc_id.is_empty(), "vpc_id output is empty")?;
    for output in ["public_subnet_ids", "private_subnet_ids", "private_db_subnet_ids"] {
        let ids = deployment.output_list(output)?;
        ensure(ids.is_empty(), format!("{output} should be empty, found {}", ids.len()))?;
    }

    deployment.destroy()?;
    reporter.pass(vec!["only the VPC and gateway were created".to_string()])?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn networking_module_names_resources_with_prefix() -> SuiteResult {
    let suite = Suite::load()?;
    let mut reporter = suite.reporter("networking_module_names_resources_with_prefix")?;
    if suite.skip_if_short(&mut reporter)? {
        return Ok(());
    }
    let ctx = suite.module_context(ModuleKind::Networking)?;
    let deployment =
        suite.deploy_module(ModuleKind::Networking, &ctx, networking_test_vars(), &mut reporter)?;

    let inspector = suite.inspector().await;
    let vpc = inspector.describe_vpc(&deployment.output("vpc_id")?).await?;
    if let Some(name) = vpc.tags.get("Name") {
        validate_resource_naming(name, ctx.prefix(), "vpc")?;
    }
    for subnet_id in deployment.output_list("public_subnet_ids")? {
        let subnet = inspector.describe_subnet(&subnet_id).await?;
        if let Some(name) = subnet.tags.get("Name") {
            ensure(name.starts_with(ctx.prefix()), format!("subnet name {name} lacks prefix"))?;
        }
    }

    deployment.destroy()?;
    reporter.pass(vec![format!("names carry prefix {}", ctx.prefix())])?;
    Ok(())
}
