// Copyright 2025 Cowboy AI, LLC.

//! Cloud Service Tree Topology Model
//!
//! Passive entities describing one multi-region cloud footprint. The
//! document owns all descendants, is immutable after parse, and is only
//! ever read by the synthesizers. Identity roles are kept in an
//! `IndexMap` so synthesis follows input-document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::network::{CidrBlock, RouteClass};

/// Root of the topology document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    /// Account owner; stamped into resource tags
    pub owner: String,

    /// Regions in declaration order
    pub regions: Vec<Region>,

    /// Account-wide identity roles, keyed by role name
    #[serde(default)]
    pub identity_roles: IndexMap<String, IdentityRoleSpec>,
}

/// One geographical region of the footprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Provisioning location key, e.g. `eu-1`
    pub name: String,

    /// Zero-or-one object store in the region
    #[serde(default)]
    pub object_store: Option<ObjectStoreSpec>,

    /// Virtual networks in declaration order
    #[serde(default)]
    pub networks: Vec<VirtualNetwork>,

    /// Optional scheduled backup job; requires an object store
    #[serde(default)]
    pub backup_job: Option<BackupJobSpec>,
}

/// Virtual network within a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    /// Display name, unique within the region
    pub name: String,

    /// Address block the network covers
    pub cidr_block: CidrBlock,

    /// Domain name of the network's private DNS zone
    pub private_zone: String,

    /// Optional managed container cluster
    #[serde(default)]
    pub cluster: Option<ManagedClusterSpec>,

    /// Subnets in declaration order
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl VirtualNetwork {
    /// Subnets flagged for cluster membership, in declaration order
    pub fn cluster_member_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| s.cluster_member)
    }
}

/// Subnet within a virtual network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    /// Subnet name, unique within the network
    pub name: String,

    /// Address block of the subnet
    pub cidr_block: CidrBlock,

    /// Routing class; unset is a schema violation and synthesis fails fast
    #[serde(default)]
    pub route_class: Option<RouteClass>,

    /// Whether this subnet participates in the cluster's networking
    #[serde(default)]
    pub cluster_member: bool,

    /// Explicit zone index; sibling position is used when unset
    #[serde(default)]
    pub zone_index: Option<u32>,

    /// Compute instances placed in this subnet
    #[serde(default)]
    pub instances: Vec<ComputeInstance>,
}

/// Compute instance placed in a subnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeInstance {
    /// Instance name, unique within the network
    pub name: String,

    /// Instance size, e.g. `t3a.micro`
    pub size: String,

    /// Machine image id
    pub image: String,

    /// Key pair used for access
    pub key_pair: String,

    /// Path reference to a boot script, loaded by the file collaborator
    #[serde(default)]
    pub boot_script: Option<String>,

    /// Firewall rules scoped to the owning network
    #[serde(default)]
    pub firewall: FirewallSpec,

    /// Role-name key into the account identity map
    #[serde(default)]
    pub identity_profile: Option<String>,

    /// Whether the instance gets an ephemeral public address
    #[serde(default)]
    pub public_address: bool,

    /// Whether a stable elastic IP is allocated and bound
    #[serde(default)]
    pub elastic_ip: bool,

    /// Hostname registered in the network's private zone
    pub hostname: String,
}

/// Firewall rule set for one instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FirewallSpec {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub ingress: Vec<FirewallRule>,

    #[serde(default)]
    pub egress: Vec<FirewallRule>,
}

/// Single ingress or egress rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Protocol name (`tcp`, `udp`, `icmp`) or `all`
    pub protocol: String,

    /// Start of the port range
    pub from_port: u16,

    /// End of the port range
    pub to_port: u16,

    /// Source/destination blocks the rule applies to
    #[serde(default)]
    pub cidr_blocks: Vec<CidrBlock>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Managed container cluster specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedClusterSpec {
    /// Cluster name
    pub name: String,

    /// Control-plane version
    pub version: String,

    /// Worker node group
    pub node_group: NodeGroupSpec,

    /// Whether the containerized application sub-graph is emitted
    #[serde(default)]
    pub application: bool,
}

/// Worker node group specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupSpec {
    /// Instance type for the workers
    pub instance_type: String,

    /// Scaling bounds
    pub scaling: ScalingBounds,
}

/// Scaling bounds for a node group
///
/// Invariant: `min <= desired <= max` (checked by the schema gate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingBounds {
    pub min: u32,
    pub max: u32,
    pub desired: u32,
}

/// Account-wide identity role specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRoleSpec {
    /// Path reference to the trust-policy document
    pub trust_policy: String,

    /// Managed policy ARN references attached directly
    #[serde(default)]
    pub policy_arns: Vec<String>,

    /// Path references to inline policy templates
    #[serde(default)]
    pub policy_templates: Vec<String>,
}

/// Object store specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStoreSpec {
    /// Bucket name
    pub bucket: String,

    /// Whether public access is blocked
    #[serde(default = "default_block_public_access")]
    pub block_public_access: bool,
}

fn default_block_public_access() -> bool {
    true
}

/// Scheduled backup job specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupJobSpec {
    /// Name of the source object store in the same region
    pub store: String,

    /// Bucket holding the function artifact
    pub artifact_store: String,

    /// Explicit connection target; overrides private-DNS resolution
    #[serde(default)]
    pub connection_target: Option<String>,
}
