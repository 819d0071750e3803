// crates/landandbay-harness/src/inspect/fixture.rs
// ============================================================================
// Module: Static EC2 Inspector
// Description: In-memory inspector serving canned records.
// Purpose: Exercise inspection and validation paths without cloud access.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! Records are matched by id with the same cardinality rule as the live
//! inspector, so registering a record twice reproduces an ambiguous lookup.

use async_trait::async_trait;

use super::Ec2Inspector;
use super::InspectError;
use super::InstanceRecord;
use super::InternetGatewayRecord;
use super::ResourceKind;
use super::SecurityGroupRecord;
use super::SubnetRecord;
use super::VpcRecord;
use super::exactly_one;

/// Inspector answering from registered records.
#[derive(Debug, Clone, Default)]
pub struct StaticEc2Inspector {
    /// Registered VPCs.
    vpcs: Vec<VpcRecord>,
    /// Registered subnets.
    subnets: Vec<SubnetRecord>,
    /// Registered security groups.
    security_groups: Vec<SecurityGroupRecord>,
    /// Registered internet gateways.
    internet_gateways: Vec<InternetGatewayRecord>,
    /// Registered instances.
    instances: Vec<InstanceRecord>,
}

impl StaticEc2Inspector {
    /// Creates an empty inspector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a VPC.
    #[must_use]
    pub fn with_vpc(mut self, vpc: VpcRecord) -> Self {
        self.vpcs.push(vpc);
        self
    }

    /// Registers a subnet.
    #[must_use]
    pub fn with_subnet(mut self, subnet: SubnetRecord) -> Self {
        self.subnets.push(subnet);
        self
    }

    /// Registers a security group.
    #[must_use]
    pub fn with_security_group(mut self, group: SecurityGroupRecord) -> Self {
        self.security_groups.push(group);
        self
    }

    /// Registers an internet gateway.
    #[must_use]
    pub fn with_internet_gateway(mut self, gateway: InternetGatewayRecord) -> Self {
        self.internet_gateways.push(gateway);
        self
    }

    /// Registers an instance.
    #[must_use]
    pub fn with_instance(mut self, instance: InstanceRecord) -> Self {
        self.instances.push(instance);
        self
    }
}

/// Clones every record whose id matches.
fn matching<T: Clone>(records: &[T], id: &str, id_of: impl Fn(&T) -> &str) -> Vec<T> {
    records.iter().filter(|record| id_of(record) == id).cloned().collect()
}

#[async_trait]
impl Ec2Inspector for StaticEc2Inspector {
    async fn describe_vpc(&self, vpc_id: &str) -> Result<VpcRecord, InspectError> {
        let found = matching(&self.vpcs, vpc_id, |vpc| vpc.vpc_id.as_str());
        exactly_one(ResourceKind::Vpc, vpc_id, found)
    }

    async fn describe_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, InspectError> {
        let found = matching(&self.subnets, subnet_id, |subnet| subnet.subnet_id.as_str());
        exactly_one(ResourceKind::Subnet, subnet_id, found)
    }

    async fn describe_security_group(
        &self,
        group_id: &str,
    ) -> Result<SecurityGroupRecord, InspectError> {
        let found = matching(&self.security_groups, group_id, |group| group.group_id.as_str());
        exactly_one(ResourceKind::SecurityGroup, group_id, found)
    }

    async fn describe_internet_gateways_for_vpc(
        &self,
        vpc_id: &str,
    ) -> Result<Vec<InternetGatewayRecord>, InspectError> {
        Ok(self
            .internet_gateways
            .iter()
            .filter(|gateway| gateway.is_attached_to(vpc_id))
            .cloned()
            .collect())
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceRecord, InspectError> {
        let found =
            matching(&self.instances, instance_id, |instance| instance.instance_id.as_str());
        exactly_one(ResourceKind::Instance, instance_id, found)
    }
}
