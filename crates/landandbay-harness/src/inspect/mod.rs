// crates/landandbay-harness/src/inspect/mod.rs
// ============================================================================
// Module: Resource Inspection
// Description: Owned EC2 resource records and the describe-call seam.
// Purpose: Read the authoritative state of provisioned resources by id.
// Dependencies: async-trait, serde, thiserror
// ============================================================================

//! ## Overview
//! The [`Ec2Inspector`] trait issues one read-only describe call per lookup
//! and converts the response into SDK-independent records. Lookups by id must
//! return exactly one resource; zero or several matches are reported as
//! [`InspectError::Cardinality`] instead of being silently narrowed.
//!
//! [`AwsEc2Inspector`] talks to the EC2 API. [`StaticEc2Inspector`] serves
//! records from memory for offline tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

mod aws;
mod fixture;

pub use aws::AwsEc2Inspector;
pub use fixture::StaticEc2Inspector;

/// Resource tags keyed by tag name.
pub type Tags = BTreeMap<String, String>;

// ============================================================================
// SECTION: Records
// ============================================================================

/// VPC state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VpcRecord {
    /// VPC id.
    pub vpc_id: String,
    /// Primary IPv4 CIDR block.
    pub cidr_block: String,
    /// Lifecycle state (`pending`, `available`).
    pub state: String,
    /// Resource tags.
    pub tags: Tags,
}

/// Subnet state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubnetRecord {
    /// Subnet id.
    pub subnet_id: String,
    /// Owning VPC id.
    pub vpc_id: String,
    /// IPv4 CIDR block.
    pub cidr_block: String,
    /// Availability zone name.
    pub availability_zone: String,
    /// Lifecycle state (`pending`, `available`).
    pub state: String,
    /// Whether instances receive a public IP on launch.
    pub map_public_ip_on_launch: bool,
    /// Resource tags.
    pub tags: Tags,
}

impl SubnetRecord {
    /// Returns true when the subnet is available.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state == "available"
    }
}

/// One ingress or egress rule of a security group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpPermissionRecord {
    /// IP protocol (`tcp`, `udp`, `icmp`, or `-1` for all).
    pub protocol: String,
    /// First port of the range, absent for all-protocol rules.
    pub from_port: Option<i32>,
    /// Last port of the range, absent for all-protocol rules.
    pub to_port: Option<i32>,
    /// IPv4 source or destination CIDRs.
    pub cidr_blocks: Vec<String>,
    /// Referenced security group ids.
    pub source_group_ids: Vec<String>,
}

/// Security group state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityGroupRecord {
    /// Group id.
    pub group_id: String,
    /// Group name.
    pub group_name: String,
    /// Group description.
    pub description: String,
    /// Owning VPC id.
    pub vpc_id: String,
    /// Inbound rules.
    pub ingress: Vec<IpPermissionRecord>,
    /// Outbound rules.
    pub egress: Vec<IpPermissionRecord>,
    /// Resource tags.
    pub tags: Tags,
}

/// Internet gateway attachment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GatewayAttachmentRecord {
    /// Attached VPC id.
    pub vpc_id: String,
    /// Attachment state (`attaching`, `available`, ...).
    pub state: String,
}

/// Internet gateway state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InternetGatewayRecord {
    /// Gateway id.
    pub internet_gateway_id: String,
    /// VPC attachments.
    pub attachments: Vec<GatewayAttachmentRecord>,
    /// Resource tags.
    pub tags: Tags,
}

impl InternetGatewayRecord {
    /// Returns true when the gateway is attached to `vpc_id`.
    #[must_use]
    pub fn is_attached_to(&self, vpc_id: &str) -> bool {
        self.attachments.iter().any(|attachment| attachment.vpc_id == vpc_id)
    }
}

/// EBS-backed block device of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockDeviceRecord {
    /// Device name (for example `/dev/xvda`).
    pub device_name: String,
    /// EBS volume id.
    pub volume_id: Option<String>,
    /// Whether the volume is deleted with the instance.
    pub delete_on_termination: bool,
}

/// EC2 instance state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Instance id.
    pub instance_id: String,
    /// Instance type (for example `t4g.nano`).
    pub instance_type: String,
    /// State name (`pending`, `running`, ...).
    pub state: String,
    /// Subnet id.
    pub subnet_id: String,
    /// VPC id.
    pub vpc_id: String,
    /// Public IPv4 address.
    pub public_ip_address: Option<String>,
    /// Private IPv4 address.
    pub private_ip_address: Option<String>,
    /// Key pair name.
    pub key_name: Option<String>,
    /// Attached security group ids.
    pub security_group_ids: Vec<String>,
    /// Block device mappings.
    pub block_devices: Vec<BlockDeviceRecord>,
    /// Resource tags.
    pub tags: Tags,
}

impl InstanceRecord {
    /// Returns true when the instance is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Inspectable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// VPC.
    Vpc,
    /// Subnet.
    Subnet,
    /// Security group.
    SecurityGroup,
    /// Internet gateway.
    InternetGateway,
    /// EC2 instance.
    Instance,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::SecurityGroup => "security_group",
            Self::InternetGateway => "internet_gateway",
            Self::Instance => "instance",
        };
        f.write_str(label)
    }
}

/// Inspection failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    /// The describe call failed.
    #[error("describe {kind} {id} failed: {message}")]
    Api {
        /// Resource kind.
        kind: ResourceKind,
        /// Looked-up id.
        id: String,
        /// Error chain from the client.
        message: String,
    },
    /// A lookup by id returned zero or several resources.
    #[error("expected exactly one {kind} for {id}, found {found}")]
    Cardinality {
        /// Resource kind.
        kind: ResourceKind,
        /// Looked-up id.
        id: String,
        /// Number of resources returned.
        found: usize,
    },
    /// The resource exists but is not in the required state.
    #[error("{kind} {id} is {state}, expected {expected}")]
    State {
        /// Resource kind.
        kind: ResourceKind,
        /// Resource id.
        id: String,
        /// Observed state.
        state: String,
        /// Required state.
        expected: &'static str,
    },
}

/// Returns the single record in `records`.
///
/// # Errors
///
/// Returns [`InspectError::Cardinality`] unless exactly one record is present.
pub fn exactly_one<T>(kind: ResourceKind, id: &str, records: Vec<T>) -> Result<T, InspectError> {
    let found = records.len();
    let mut records = records.into_iter();
    match (records.next(), records.next()) {
        (Some(record), None) => Ok(record),
        _ => Err(InspectError::Cardinality {
            kind,
            id: id.to_string(),
            found,
        }),
    }
}

// ============================================================================
// SECTION: Inspector
// ============================================================================

/// Describe-call interface for EC2 resources.
#[async_trait]
pub trait Ec2Inspector: Send + Sync {
    /// Describes a VPC by id.
    async fn describe_vpc(&self, vpc_id: &str) -> Result<VpcRecord, InspectError>;

    /// Describes a subnet by id.
    async fn describe_subnet(&self, subnet_id: &str) -> Result<SubnetRecord, InspectError>;

    /// Describes a security group by id.
    async fn describe_security_group(
        &self,
        group_id: &str,
    ) -> Result<SecurityGroupRecord, InspectError>;

    /// Lists the internet gateways attached to a VPC. An empty list is not an
    /// error.
    async fn describe_internet_gateways_for_vpc(
        &self,
        vpc_id: &str,
    ) -> Result<Vec<InternetGatewayRecord>, InspectError>;

    /// Describes an instance by id, across all reservations.
    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceRecord, InspectError>;
}

/// Checks that a resource exists. Subnets must also be available.
///
/// # Errors
///
/// Returns [`InspectError`] when the lookup fails or a subnet is not available.
/// Internet gateways are looked up through their VPC and are not supported
/// here.
pub async fn validate_aws_resource(
    inspector: &dyn Ec2Inspector,
    kind: ResourceKind,
    id: &str,
) -> Result<(), InspectError> {
    match kind {
        ResourceKind::Vpc => inspector.describe_vpc(id).await.map(|_| ()),
        ResourceKind::Subnet => {
            let subnet = inspector.describe_subnet(id).await?;
            if subnet.is_available() {
                Ok(())
            } else {
                Err(InspectError::State {
                    kind,
                    id: id.to_string(),
                    state: subnet.state,
                    expected: "available",
                })
            }
        }
        ResourceKind::SecurityGroup => inspector.describe_security_group(id).await.map(|_| ()),
        ResourceKind::Instance => inspector.describe_instance(id).await.map(|_| ()),
        ResourceKind::InternetGateway => Err(InspectError::Api {
            kind,
            id: id.to_string(),
            message: "look up internet gateways through their vpc".to_string(),
        }),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
