// Copyright 2025 Cowboy AI, LLC.

//! Topology Synthesis Engine
//!
//! A pure, single-threaded tree walk over a validated topology document.
//! Identity expands once, ahead of every region, because compute
//! declarations may reference its instance profiles; each region then
//! expands object store, networks, compute, cluster, and backup job, in
//! that order. The walk builds nothing but the declaration graph; any
//! error aborts the run with no partial output.

pub mod backup;
pub mod cluster;
pub mod compute;
pub mod identity;
pub mod network;
pub mod object_store;
pub mod zones;

use tracing::info;

use crate::declaration::DeclarationSet;
use crate::domain::{Region, TopologyDocument};
use crate::errors::{ReferenceError, Result};
use crate::source::FileSource;
use crate::stack::{self, StackPlan};
use crate::validate;

use identity::ProfileRegistry;
use zones::ZoneCatalog;

/// Collaborators threaded through every synthesizer call
///
/// There is no other shared state; the context replaces any notion of a
/// global "current topology".
pub struct SynthesisContext<'a> {
    pub files: &'a dyn FileSource,
    pub zones: &'a dyn ZoneCatalog,
}

impl<'a> SynthesisContext<'a> {
    pub fn new(files: &'a dyn FileSource, zones: &'a dyn ZoneCatalog) -> Self {
        Self { files, zones }
    }
}

/// Expand a topology document into a partitioned stack plan
///
/// Deterministic: rerunning over an unchanged document yields a plan
/// with identical declaration names and reference edges.
pub fn synthesize(document: &TopologyDocument, ctx: &SynthesisContext<'_>) -> Result<StackPlan> {
    validate::check_document(document)?;

    info!(
        owner = %document.owner,
        regions = document.regions.len(),
        "synthesizing topology document"
    );

    let (identity_set, profiles) = identity::synthesize_identity(document, ctx.files)?;

    let mut regions = Vec::with_capacity(document.regions.len());
    for region in &document.regions {
        let set = synthesize_region(&document.owner, region, &profiles, ctx)?;
        regions.push((region.name.clone(), set));
    }

    stack::partition(identity_set, regions)
}

fn synthesize_region(
    owner: &str,
    region: &Region,
    profiles: &ProfileRegistry,
    ctx: &SynthesisContext<'_>,
) -> Result<DeclarationSet> {
    let zone_list = ctx.zones.zones(&region.name);
    if zone_list.is_empty() {
        return Err(ReferenceError::NoZones(region.name.clone()).into());
    }

    let mut set = DeclarationSet::new();

    if let Some(store) = &region.object_store {
        let (store_set, _) = object_store::synthesize_object_store(owner, &region.name, store)?;
        set.extend(store_set)?;
    }

    let mut dns_entries = Vec::new();
    for net in &region.networks {
        let (network_set, parts) = network::synthesize_network(owner, &region.name, net, &zone_list)?;
        set.extend(network_set)?;

        for (subnet, subnet_id) in net.subnets.iter().zip(&parts.subnet_ids) {
            let (instance_set, entries) = compute::synthesize_instances(
                owner,
                subnet,
                subnet_id,
                &parts.network_id,
                &parts.zone_id,
                profiles,
                ctx.files,
            )?;
            set.extend(instance_set)?;
            dns_entries.extend(entries);
        }

        if let Some(spec) = &net.cluster {
            set.extend(cluster::synthesize_cluster(
                owner,
                &region.name,
                net,
                spec,
                &parts.cluster_subnet_ids,
            )?)?;
        }
    }

    if let Some(job) = &region.backup_job {
        set.extend(backup::synthesize_backup(owner, region, job, &dns_entries)?)?;
    }

    info!(region = %region.name, declarations = set.len(), "synthesized region");
    Ok(set)
}
