// Copyright 2025 Cowboy AI, LLC.

//! Topology Domain Models
//!
//! The passive data model for one cloud footprint: regions, virtual
//! networks, subnets, compute instances, optional cluster and backup
//! specifications, and the account identity map, together with the
//! network value objects they are built from.

pub mod network;
pub mod topology;

pub use network::{CidrBlock, CidrError, RouteClass};
pub use topology::{
    BackupJobSpec, ComputeInstance, FirewallRule, FirewallSpec, IdentityRoleSpec,
    ManagedClusterSpec, NodeGroupSpec, ObjectStoreSpec, Region, ScalingBounds, Subnet,
    TopologyDocument, VirtualNetwork,
};
