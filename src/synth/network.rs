// Copyright 2025 Cowboy AI, LLC.

//! Network Synthesizer
//!
//! Expands one virtual network into its declaration sub-graph: the
//! network container, internet gateway, NAT gateway anchored on a
//! bootstrap subnet carved out of the network block, the two route
//! tables, per-subnet associations, and the network's private DNS zone.

use serde_json::json;
use tracing::debug;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, LogicalId};
use crate::domain::{RouteClass, Subnet, VirtualNetwork};
use crate::errors::{Result, SynthesisError};
use crate::synth::zones::allocate_zone;
use crate::validate::SchemaViolation;

/// Handles into the network sub-graph needed by downstream synthesizers
#[derive(Debug, Clone)]
pub struct NetworkParts {
    /// Network container declaration
    pub network_id: LogicalId,

    /// Private DNS zone declaration
    pub zone_id: LogicalId,

    /// One id per declared subnet, in declaration order
    pub subnet_ids: Vec<LogicalId>,

    /// Ids of subnets flagged cluster-member, in declaration order
    pub cluster_subnet_ids: Vec<LogicalId>,
}

/// Expand a virtual network into declarations
pub fn synthesize_network(
    owner: &str,
    region_name: &str,
    network: &VirtualNetwork,
    zones: &[String],
) -> Result<(DeclarationSet, NetworkParts)> {
    let mut set = DeclarationSet::new();
    let net = LogicalId::new(region_name).child(&network.name);
    debug!(region = region_name, network = %network.name, "synthesizing network");

    set.push(
        Declaration::new(net.clone(), DeclarationKind::Network, format!("vpc-{}", network.name))
            .with_literal("cidr_block", network.cidr_block.to_string())
            .with_literal("enable_dns_hostnames", true)
            .with_literal("tags", tags(owner, &network.name)),
    )?;

    let igw = net.child("igw");
    set.push(
        Declaration::new(
            igw.clone(),
            DeclarationKind::InternetGateway,
            format!("igw-{}", network.name),
        )
        .with_reference("network", &net, "id")
        .with_literal("tags", tags(owner, format!("igw-{}", network.name))),
    )?;

    let nat_eip = net.child("eip-nat");
    set.push(
        Declaration::new(
            nat_eip.clone(),
            DeclarationKind::ElasticIp,
            format!("eip-natgw-{}", network.name),
        )
        .with_literal("tags", tags(owner, format!("eip-natgw-{}", network.name))),
    )?;

    // The bootstrap subnet is carved out of the network block, not taken
    // from the declared subnet list.
    let bootstrap_block =
        network
            .cidr_block
            .first_slash24()
            .map_err(|source| SynthesisError::CidrComputation {
                path: net.to_string(),
                source,
            })?;

    let bootstrap = net.child("subnet-nat-bootstrap");
    set.push(
        Declaration::new(
            bootstrap.clone(),
            DeclarationKind::Subnet,
            format!("subnet-natgw-public-{}", network.name),
        )
        .with_reference("network", &net, "id")
        .with_literal("cidr_block", bootstrap_block.to_string())
        .with_literal("tags", tags(owner, format!("subnet-natgw-public-{}", network.name))),
    )?;

    let nat = net.child("natgw");
    set.push(
        Declaration::new(
            nat.clone(),
            DeclarationKind::NatGateway,
            format!("natgw-{}", network.name),
        )
        .with_reference("allocation", &nat_eip, "id")
        .with_reference("subnet", &bootstrap, "id")
        .with_literal("tags", tags(owner, format!("natgw-{}", network.name))),
    )?;

    let rt_public = net.child("rt-public");
    set.push(
        Declaration::new(
            rt_public.clone(),
            DeclarationKind::RouteTable,
            format!("route-table-public-{}", network.name),
        )
        .with_reference("network", &net, "id")
        .with_literal("tags", tags(owner, format!("route-table-public-{}", network.name))),
    )?;

    let rt_private = net.child("rt-private");
    set.push(
        Declaration::new(
            rt_private.clone(),
            DeclarationKind::RouteTable,
            format!("route-table-private-{}", network.name),
        )
        .with_reference("network", &net, "id")
        .with_literal("tags", tags(owner, format!("route-table-private-{}", network.name))),
    )?;

    set.push(
        Declaration::new(
            rt_public.child("default"),
            DeclarationKind::Route,
            format!("route-to-igw-{}", network.name),
        )
        .with_reference("route_table", &rt_public, "id")
        .with_reference("gateway", &igw, "id")
        .with_literal("destination", "0.0.0.0/0"),
    )?;

    set.push(
        Declaration::new(
            rt_private.child("default"),
            DeclarationKind::Route,
            format!("route-to-natgw-{}", network.name),
        )
        .with_reference("route_table", &rt_private, "id")
        .with_reference("nat_gateway", &nat, "id")
        .with_literal("destination", "0.0.0.0/0"),
    )?;

    // The bootstrap subnet always routes publicly.
    set.push(
        Declaration::new(
            bootstrap.child("assoc"),
            DeclarationKind::RouteTableAssociation,
            format!("rta-natgw-public-{}", network.name),
        )
        .with_reference("route_table", &rt_public, "id")
        .with_reference("subnet", &bootstrap, "id"),
    )?;

    let mut subnet_ids = Vec::with_capacity(network.subnets.len());
    let mut cluster_subnet_ids = Vec::new();

    for (position, subnet) in network.subnets.iter().enumerate() {
        let subnet_id = net.child(&subnet.name);

        let class = subnet.route_class.ok_or_else(|| {
            SynthesisError::SchemaValidation(vec![SchemaViolation::new(
                subnet_id.to_string(),
                "routing class is unset",
            )])
        })?;

        let zone = allocate_zone(zones, subnet.zone_index, position)
            .ok_or_else(|| crate::errors::ReferenceError::NoZones(region_name.to_string()))?;

        set.push(
            Declaration::new(
                subnet_id.clone(),
                DeclarationKind::Subnet,
                format!("subnet-{}", subnet.name),
            )
            .with_reference("network", &net, "id")
            .with_literal("cidr_block", subnet.cidr_block.to_string())
            .with_literal("availability_zone", zone)
            .with_literal("tags", subnet_tags(owner, network, subnet, class)),
        )?;

        let table = match class {
            RouteClass::Public => &rt_public,
            RouteClass::Private => &rt_private,
        };
        set.push(
            Declaration::new(
                subnet_id.child("assoc"),
                DeclarationKind::RouteTableAssociation,
                format!("rta-{}-{}", class, subnet.name),
            )
            .with_reference("route_table", table, "id")
            .with_reference("subnet", &subnet_id, "id"),
        )?;

        if subnet.cluster_member {
            cluster_subnet_ids.push(subnet_id.clone());
        }
        subnet_ids.push(subnet_id);
    }

    let zone_id = net.child("dns-zone");
    set.push(
        Declaration::new(
            zone_id.clone(),
            DeclarationKind::DnsZone,
            network.private_zone.clone(),
        )
        .with_literal("domain", network.private_zone.clone())
        .with_reference("network", &net, "id")
        .with_literal("tags", json!({ "Owner": owner })),
    )?;

    let parts = NetworkParts {
        network_id: net,
        zone_id,
        subnet_ids,
        cluster_subnet_ids,
    };

    Ok((set, parts))
}

fn tags(owner: &str, name: impl Into<String>) -> serde_json::Value {
    let name = name.into();
    json!({ "Name": name, "Owner": owner })
}

fn subnet_tags(
    owner: &str,
    network: &VirtualNetwork,
    subnet: &Subnet,
    class: RouteClass,
) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    map.insert("Name".into(), json!(subnet.name));
    map.insert("Owner".into(), json!(owner));

    // Cluster-member subnets carry the load-balancer role tags the
    // cluster's controllers discover subnets by.
    if subnet.cluster_member {
        if let Some(cluster) = &network.cluster {
            map.insert(format!("cluster/{}", cluster.name), json!("shared"));
            let role = match class {
                RouteClass::Public => "role/elb",
                RouteClass::Private => "role/internal-elb",
            };
            map.insert(role.into(), json!("1"));
        }
    }

    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VirtualNetwork;

    fn network(yaml: &str) -> VirtualNetwork {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn zones() -> Vec<String> {
        vec!["eu-1a".into(), "eu-1b".into(), "eu-1c".into()]
    }

    const TWO_SUBNETS: &str = r#"
name: app
cidr_block: 10.0.0.0/16
private_zone: app.internal
subnets:
  - name: frontend
    cidr_block: 10.0.1.0/24
    route_class: public
  - name: data
    cidr_block: 10.0.4.0/24
    route_class: private
"#;

    #[test]
    fn test_exactly_two_route_tables() {
        let (set, _) = synthesize_network("ops", "eu-1", &network(TWO_SUBNETS), &zones()).unwrap();
        assert_eq!(set.of_kind(DeclarationKind::RouteTable).count(), 2);
    }

    #[test]
    fn test_each_subnet_associates_with_matching_table() {
        use crate::declaration::InputValue;

        let (set, parts) =
            synthesize_network("ops", "eu-1", &network(TWO_SUBNETS), &zones()).unwrap();

        let table_of = |subnet: &LogicalId| {
            set.get(&subnet.child("assoc"))
                .expect("association declared")
                .inputs
                .get("route_table")
                .cloned()
        };

        assert_eq!(
            table_of(&parts.subnet_ids[0]),
            Some(InputValue::reference(&parts.network_id.child("rt-public"), "id"))
        );
        assert_eq!(
            table_of(&parts.subnet_ids[1]),
            Some(InputValue::reference(&parts.network_id.child("rt-private"), "id"))
        );
    }

    #[test]
    fn test_bootstrap_subnet_carved_and_public() {
        let (set, parts) =
            synthesize_network("ops", "eu-1", &network(TWO_SUBNETS), &zones()).unwrap();

        let bootstrap = parts.network_id.child("subnet-nat-bootstrap");
        let declaration = set.get(&bootstrap).unwrap();
        assert_eq!(
            declaration.inputs.get("cidr_block"),
            Some(&crate::declaration::InputValue::literal("10.0.0.0/24"))
        );

        let assoc = set.get(&bootstrap.child("assoc")).unwrap();
        assert_eq!(
            assoc.inputs.get("route_table"),
            Some(&crate::declaration::InputValue::reference(
                &parts.network_id.child("rt-public"),
                "id"
            ))
        );
    }

    #[test]
    fn test_unset_route_class_fails_fast() {
        let net = network(
            r#"
name: app
cidr_block: 10.0.0.0/16
private_zone: app.internal
subnets:
  - name: limbo
    cidr_block: 10.0.1.0/24
"#,
        );

        let err = synthesize_network("ops", "eu-1", &net, &zones()).unwrap_err();
        assert!(err.to_string().contains("eu-1/app/limbo"));
    }

    #[test]
    fn test_narrow_block_raises_cidr_error() {
        let net = network(
            r#"
name: tiny
cidr_block: 10.0.0.0/26
private_zone: tiny.internal
"#,
        );

        let err = synthesize_network("ops", "eu-1", &net, &zones()).unwrap_err();
        assert!(matches!(err, SynthesisError::CidrComputation { .. }));
        assert!(err.to_string().contains("eu-1/tiny"));
    }

    #[test]
    fn test_cluster_member_tags_by_class() {
        let net = network(
            r#"
name: app
cidr_block: 10.0.0.0/16
private_zone: app.internal
cluster:
  name: workers
  version: "1.27"
  node_group:
    instance_type: t3.large
    scaling: { min: 1, max: 3, desired: 2 }
subnets:
  - name: edge
    cidr_block: 10.0.1.0/24
    route_class: public
    cluster_member: true
  - name: core
    cidr_block: 10.0.4.0/24
    route_class: private
    cluster_member: true
"#,
        );

        let (set, parts) = synthesize_network("ops", "eu-1", &net, &zones()).unwrap();

        let tags_of = |id: &LogicalId| match set.get(id).unwrap().inputs.get("tags").unwrap() {
            crate::declaration::InputValue::Literal(v) => v.clone(),
            _ => panic!("tags are literal"),
        };

        let edge = tags_of(&parts.subnet_ids[0]);
        assert_eq!(edge["cluster/workers"], "shared");
        assert_eq!(edge["role/elb"], "1");

        let core = tags_of(&parts.subnet_ids[1]);
        assert_eq!(core["cluster/workers"], "shared");
        assert_eq!(core["role/internal-elb"], "1");
    }

    #[test]
    fn test_zone_round_robin_when_index_unset() {
        let (set, parts) =
            synthesize_network("ops", "eu-1", &network(TWO_SUBNETS), &zones()).unwrap();

        let zone_of = |id: &LogicalId| set.get(id).unwrap().inputs.get("availability_zone").cloned();
        assert_eq!(
            zone_of(&parts.subnet_ids[0]),
            Some(crate::declaration::InputValue::literal("eu-1a"))
        );
        assert_eq!(
            zone_of(&parts.subnet_ids[1]),
            Some(crate::declaration::InputValue::literal("eu-1b"))
        );
    }
}
