// Copyright 2025 Cowboy AI, LLC.

//! Compute Synthesizer
//!
//! Expands the instances of one subnet into firewall, instance, and
//! optionally elastic-IP and DNS-record declarations. A DNS record is
//! only emitted when the elastic IP is allocated, and it binds the
//! elastic IP's resolved address — never the instance's ephemeral one.

use serde_json::json;
use tracing::debug;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, LogicalId};
use crate::domain::{ComputeInstance, Subnet};
use crate::errors::Result;
use crate::source::FileSource;
use crate::synth::identity::ProfileRegistry;

/// A hostname registered in the private zone, with the elastic IP whose
/// address the record binds
#[derive(Debug, Clone)]
pub struct PrivateDnsEntry {
    pub hostname: String,
    pub elastic_ip: LogicalId,
    pub record: LogicalId,
}

/// Expand every instance in a subnet
///
/// `subnet_id`, `network_id`, and `zone_id` are handles produced by the
/// network synthesizer.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_instances(
    owner: &str,
    subnet: &Subnet,
    subnet_id: &LogicalId,
    network_id: &LogicalId,
    zone_id: &LogicalId,
    profiles: &ProfileRegistry,
    files: &dyn FileSource,
) -> Result<(DeclarationSet, Vec<PrivateDnsEntry>)> {
    let mut set = DeclarationSet::new();
    let mut dns_entries = Vec::new();

    for instance in &subnet.instances {
        let base = subnet_id.child(&instance.name);
        debug!(instance = %base, "synthesizing compute instance");

        let firewall = base.child("firewall");
        set.push(firewall_declaration(&firewall, instance, network_id))?;

        let mut declaration = Declaration::new(
            base.clone(),
            DeclarationKind::Instance,
            instance.name.clone(),
        )
        .with_literal("image", instance.image.clone())
        .with_literal("size", instance.size.clone())
        .with_literal("key_pair", instance.key_pair.clone())
        .with_literal("associate_public_address", instance.public_address)
        .with_reference("subnet", subnet_id, "id")
        .with_reference("firewall", &firewall, "id")
        .with_literal("tags", json!({ "Name": instance.name, "Owner": owner }));

        if let Some(path) = &instance.boot_script {
            declaration = declaration.with_literal("boot_script", files.load(path)?);
        }

        if let Some(key) = &instance.identity_profile {
            let profile = profiles.resolve(&base, key)?;
            declaration = declaration.with_reference("instance_profile", profile, "name");
        }

        set.push(declaration)?;

        if instance.elastic_ip {
            let eip = base.child("eip");
            set.push(
                Declaration::new(
                    eip.clone(),
                    DeclarationKind::ElasticIp,
                    format!("eip-{}", instance.name),
                )
                .with_reference("instance", &base, "id")
                .with_literal("tags", json!({ "Name": format!("eip-{}", instance.name), "Owner": owner })),
            )?;

            let record = base.child("dns-record");
            set.push(
                Declaration::new(
                    record.clone(),
                    DeclarationKind::DnsRecord,
                    instance.hostname.clone(),
                )
                .with_reference("zone", zone_id, "zone_id")
                .with_literal("record_name", instance.hostname.clone())
                .with_literal("record_type", "A")
                .with_literal("ttl", 300)
                .with_reference("address", &eip, "address"),
            )?;

            dns_entries.push(PrivateDnsEntry {
                hostname: instance.hostname.clone(),
                elastic_ip: eip,
                record,
            });
        }
    }

    Ok((set, dns_entries))
}

fn firewall_declaration(
    id: &LogicalId,
    instance: &ComputeInstance,
    network_id: &LogicalId,
) -> Declaration {
    let rules = |rules: &[crate::domain::FirewallRule]| {
        serde_json::to_value(rules).expect("firewall rules serialize")
    };

    let mut declaration = Declaration::new(
        id.clone(),
        DeclarationKind::FirewallRuleSet,
        format!("firewall-{}", instance.name),
    )
    .with_reference("network", network_id, "id")
    .with_literal("ingress", rules(&instance.firewall.ingress))
    .with_literal("egress", rules(&instance.firewall.egress));

    if let Some(description) = &instance.firewall.description {
        declaration = declaration.with_literal("description", description.clone());
    }

    declaration
}
