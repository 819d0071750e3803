// crates/landandbay-harness/src/inspect/aws.rs
// ============================================================================
// Module: AWS EC2 Inspector
// Description: Describe calls against the EC2 API.
// Purpose: Back the inspector trait with the AWS SDK.
// Dependencies: aws-config, aws-sdk-ec2
// ============================================================================

//! ## Overview
//! Credentials and endpoint come from the default `aws_config` provider chain;
//! the region is always set explicitly from configuration. Each lookup issues
//! a single describe call with no polling or eventual-consistency retry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::types::IpPermission;
use aws_sdk_ec2::types::Tag;

use super::BlockDeviceRecord;
use super::Ec2Inspector;
use super::GatewayAttachmentRecord;
use super::InspectError;
use super::InstanceRecord;
use super::InternetGatewayRecord;
use super::IpPermissionRecord;
use super::ResourceKind;
use super::SecurityGroupRecord;
use super::SubnetRecord;
use super::Tags;
use super::VpcRecord;
use super::exactly_one;

// ============================================================================
// SECTION: Inspector
// ============================================================================

/// EC2 inspector backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsEc2Inspector {
    /// EC2 client bound to one region.
    client: Client,
}

impl AwsEc2Inspector {
    /// Loads shared AWS configuration for `region` and builds a client.
    pub async fn connect(region: &str) -> Self {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&shared_config),
        }
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl Ec2Inspector for AwsEc2Inspector {
    async fn describe_vpc(&self, vpc_id: &str) -> Result<VpcRecord, InspectError> {
        let kind = ResourceKind::Vpc;
        let output = self
            .client
            .describe_vpcs()
            .vpc_ids(vpc_id)
            .send()
            .await
            .map_err(|err| api_error(kind, vpc_id, &DisplayErrorContext(&err)))?;
        let records = output
            .vpcs()
            .iter()
            .map(|vpc| VpcRecord {
                vpc_id: owned(vpc.vpc_id()),
                cidr_block: owned(vpc.cidr_block()),
                state: vpc.state().map(|state| state.as_str().to_string()).unwrap_or_default(),
                tags: tags(vpc.tags()),
            })
            .collect();
        exactly_one(kind, vpc_id, records)
    }

    async fn describe_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, InspectError> {
        let kind = ResourceKind::Subnet;
        let output = self
            .client
            .describe_subnets()
            .subnet_ids(subnet_id)
            .send()
            .await
            .map_err(|err| api_error(kind, subnet_id, &DisplayErrorContext(&err)))?;
        let records = output
            .subnets()
            .iter()
            .map(|subnet| SubnetRecord {
                subnet_id: owned(subnet.subnet_id()),
                vpc_id: owned(subnet.vpc_id()),
                cidr_block: owned(subnet.cidr_block()),
                availability_zone: owned(subnet.availability_zone()),
                state: subnet.state().map(|state| state.as_str().to_string()).unwrap_or_default(),
                map_public_ip_on_launch: subnet.map_public_ip_on_launch().unwrap_or(false),
                tags: tags(subnet.tags()),
            })
            .collect();
        exactly_one(kind, subnet_id, records)
    }

    async fn describe_security_group(
        &self,
        group_id: &str,
    ) -> Result<SecurityGroupRecord, InspectError> {
        let kind = ResourceKind::SecurityGroup;
        let output = self
            .client
            .describe_security_groups()
            .group_ids(group_id)
            .send()
            .await
            .map_err(|err| api_error(kind, group_id, &DisplayErrorContext(&err)))?;
        let records = output
            .security_groups()
            .iter()
            .map(|group| SecurityGroupRecord {
                group_id: owned(group.group_id()),
                group_name: owned(group.group_name()),
                description: owned(group.description()),
                vpc_id: owned(group.vpc_id()),
                ingress: group.ip_permissions().iter().map(permission).collect(),
                egress: group.ip_permissions_egress().iter().map(permission).collect(),
                tags: tags(group.tags()),
            })
            .collect();
        exactly_one(kind, group_id, records)
    }

    async fn describe_internet_gateways_for_vpc(
        &self,
        vpc_id: &str,
    ) -> Result<Vec<InternetGatewayRecord>, InspectError> {
        let kind = ResourceKind::InternetGateway;
        let filter = Filter::builder().name("attachment.vpc-id").values(vpc_id).build();
        let output = self
            .client
            .describe_internet_gateways()
            .filters(filter)
            .send()
            .await
            .map_err(|err| api_error(kind, vpc_id, &DisplayErrorContext(&err)))?;
        Ok(output
            .internet_gateways()
            .iter()
            .map(|gateway| InternetGatewayRecord {
                internet_gateway_id: owned(gateway.internet_gateway_id()),
                attachments: gateway
                    .attachments()
                    .iter()
                    .map(|attachment| GatewayAttachmentRecord {
                        vpc_id: owned(attachment.vpc_id()),
                        state: attachment
                            .state()
                            .map(|state| state.as_str().to_string())
                            .unwrap_or_default(),
                    })
                    .collect(),
                tags: tags(gateway.tags()),
            })
            .collect())
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceRecord, InspectError> {
        let kind = ResourceKind::Instance;
        let output = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|err| api_error(kind, instance_id, &DisplayErrorContext(&err)))?;
        let records = output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .map(|instance| InstanceRecord {
                instance_id: owned(instance.instance_id()),
                instance_type: instance
                    .instance_type()
                    .map(|instance_type| instance_type.as_str().to_string())
                    .unwrap_or_default(),
                state: instance
                    .state()
                    .and_then(|state| state.name())
                    .map(|name| name.as_str().to_string())
                    .unwrap_or_default(),
                subnet_id: owned(instance.subnet_id()),
                vpc_id: owned(instance.vpc_id()),
                public_ip_address: instance.public_ip_address().map(str::to_string),
                private_ip_address: instance.private_ip_address().map(str::to_string),
                key_name: instance.key_name().map(str::to_string),
                security_group_ids: instance
                    .security_groups()
                    .iter()
                    .filter_map(|group| group.group_id().map(str::to_string))
                    .collect(),
                block_devices: instance
                    .block_device_mappings()
                    .iter()
                    .map(|mapping| BlockDeviceRecord {
                        device_name: owned(mapping.device_name()),
                        volume_id: mapping
                            .ebs()
                            .and_then(|ebs| ebs.volume_id())
                            .map(str::to_string),
                        delete_on_termination: mapping
                            .ebs()
                            .and_then(|ebs| ebs.delete_on_termination())
                            .unwrap_or(false),
                    })
                    .collect(),
                tags: tags(instance.tags()),
            })
            .collect();
        exactly_one(kind, instance_id, records)
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Builds an API error from a displayable client error.
fn api_error(kind: ResourceKind, id: &str, err: &dyn std::fmt::Display) -> InspectError {
    InspectError::Api {
        kind,
        id: id.to_string(),
        message: err.to_string(),
    }
}

/// Copies an optional SDK string, defaulting to empty.
fn owned(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Converts SDK tags, skipping entries without a key.
fn tags(tags: &[Tag]) -> Tags {
    tags.iter()
        .filter_map(|tag| {
            tag.key().map(|key| (key.to_string(), tag.value().unwrap_or_default().to_string()))
        })
        .collect()
}

/// Converts an SDK permission.
fn permission(permission: &IpPermission) -> IpPermissionRecord {
    IpPermissionRecord {
        protocol: owned(permission.ip_protocol()),
        from_port: permission.from_port(),
        to_port: permission.to_port(),
        cidr_blocks: permission
            .ip_ranges()
            .iter()
            .filter_map(|range| range.cidr_ip().map(str::to_string))
            .collect(),
        source_group_ids: permission
            .user_id_group_pairs()
            .iter()
            .filter_map(|pair| pair.group_id().map(str::to_string))
            .collect(),
    }
}
