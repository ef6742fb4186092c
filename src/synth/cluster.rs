// Copyright 2025 Cowboy AI, LLC.

//! Cluster Synthesizer
//!
//! Expands a managed cluster spec into control-plane and node-group
//! identities, the cluster and node-group declarations scoped to the
//! network's cluster-member subnets, and — when the containerized
//! application is requested — a dependent sub-graph that consumes the
//! cluster's post-creation endpoint, certificate authority, and auth
//! token. That sub-graph carries explicit `after` edges on the cluster
//! declaration; it never relies on call order.

use serde_json::json;
use tracing::debug;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, LogicalId};
use crate::domain::{ManagedClusterSpec, VirtualNetwork};
use crate::errors::{ReferenceError, Result};

const CONTROL_PLANE_POLICIES: [&str; 2] = [
    "arn:aws:iam::aws:policy/AmazonEKSClusterPolicy",
    "arn:aws:iam::aws:policy/AmazonEKSVPCResourceController",
];

const NODE_GROUP_POLICIES: [&str; 4] = [
    "arn:aws:iam::aws:policy/AmazonEKSWorkerNodePolicy",
    "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly",
    "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy",
    "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore",
];

/// Expand a managed cluster within one network
pub fn synthesize_cluster(
    owner: &str,
    region_name: &str,
    network: &VirtualNetwork,
    spec: &ManagedClusterSpec,
    cluster_subnet_ids: &[LogicalId],
) -> Result<DeclarationSet> {
    if cluster_subnet_ids.is_empty() {
        return Err(ReferenceError::MissingClusterSubnets(format!(
            "{region_name}/{}",
            network.name
        ))
        .into());
    }

    debug!(cluster = %spec.name, subnets = cluster_subnet_ids.len(), "synthesizing cluster");

    let mut set = DeclarationSet::new();
    let base = LogicalId::new(region_name)
        .child(&network.name)
        .child("cluster");

    // Control-plane identity.
    let control_role = base.child("control-role");
    set.push(
        Declaration::new(
            control_role.clone(),
            DeclarationKind::Role,
            format!("cluster-control-{}", spec.name),
        )
        .with_literal("assume_role_policy", service_trust("eks.amazonaws.com")),
    )?;

    for (i, arn) in CONTROL_PLANE_POLICIES.iter().enumerate() {
        set.push(
            Declaration::new(
                base.child(format!("control-attach-{i}")),
                DeclarationKind::PolicyAttachment,
                format!("cluster-control-attachment-{}-{i}", spec.name),
            )
            .with_reference("role", &control_role, "name")
            .with_literal("policy_arn", *arn),
        )?;
    }

    set.push(
        Declaration::new(
            base.child("control-policy-metrics"),
            DeclarationKind::RolePolicy,
            format!("cluster-metrics-{}", spec.name),
        )
        .with_reference("role", &control_role, "name")
        .with_literal(
            "policy",
            policy_document(&["cloudwatch:PutMetricData"]),
        ),
    )?;

    set.push(
        Declaration::new(
            base.child("control-policy-discovery"),
            DeclarationKind::RolePolicy,
            format!("cluster-discovery-{}", spec.name),
        )
        .with_reference("role", &control_role, "name")
        .with_literal(
            "policy",
            policy_document(&[
                "ec2:DescribeAccountAttributes",
                "ec2:DescribeAddresses",
                "ec2:DescribeInternetGateways",
            ]),
        ),
    )?;

    // Cluster declaration over exactly the member subnets.
    let mut cluster = Declaration::new(base.clone(), DeclarationKind::Cluster, spec.name.clone())
        .with_literal("version", spec.version.clone())
        .with_literal("endpoint_public_access", true)
        .with_reference("role_arn", &control_role, "arn")
        .with_literal("tags", json!({ "Owner": owner }));
    for (i, subnet) in cluster_subnet_ids.iter().enumerate() {
        cluster = cluster.with_reference(format!("subnet_ids.{i}"), subnet, "id");
    }
    set.push(cluster)?;

    // Node-group identity.
    let node_role = base.child("node-role");
    set.push(
        Declaration::new(
            node_role.clone(),
            DeclarationKind::Role,
            format!("cluster-node-{}", spec.name),
        )
        .with_literal("assume_role_policy", service_trust("ec2.amazonaws.com")),
    )?;

    for (i, arn) in NODE_GROUP_POLICIES.iter().enumerate() {
        set.push(
            Declaration::new(
                base.child(format!("node-attach-{i}")),
                DeclarationKind::PolicyAttachment,
                format!("cluster-node-attachment-{}-{i}", spec.name),
            )
            .with_reference("role", &node_role, "name")
            .with_literal("policy_arn", *arn),
        )?;
    }

    let node_group = base.child("node-group");
    let mut nodes = Declaration::new(
        node_group,
        DeclarationKind::NodeGroup,
        format!("node-group-{}", spec.name),
    )
    .with_reference("cluster", &base, "name")
    .with_reference("node_role_arn", &node_role, "arn")
    .with_literal("instance_type", spec.node_group.instance_type.clone())
    .with_literal("scaling.min", spec.node_group.scaling.min)
    .with_literal("scaling.max", spec.node_group.scaling.max)
    .with_literal("scaling.desired", spec.node_group.scaling.desired)
    .with_literal("tags", json!({ "Owner": owner }));
    for (i, subnet) in cluster_subnet_ids.iter().enumerate() {
        nodes = nodes.with_reference(format!("subnet_ids.{i}"), subnet, "id");
    }
    set.push(nodes)?;

    if spec.application {
        set.extend(application_sub_graph(&base)?)?;
    }

    Ok(set)
}

/// The containerized application: a secret plus front-end and back-end
/// deployment/service pairs, all gated on the cluster's outputs
fn application_sub_graph(cluster: &LogicalId) -> Result<DeclarationSet> {
    let mut set = DeclarationSet::new();
    let app = cluster.child("app");

    let secret = app.child("secret");
    let mut declarations = vec![Declaration::new(
        secret.clone(),
        DeclarationKind::AppSecret,
        "application-secret",
    )
    .with_literal("data.CONNECTION_URI", "placeholder://set-by-operator")];

    let backend = app.child("backend");
    declarations.push(
        Declaration::new(backend.clone(), DeclarationKind::AppDeployment, "backend")
            .with_literal("replicas", 1)
            .with_literal("image", "app/backend")
            .with_reference("env.CONNECTION_URI.secret", &secret, "name")
            .with_literal("env.CONNECTION_URI.key", "CONNECTION_URI"),
    );
    declarations.push(
        Declaration::new(app.child("backend-service"), DeclarationKind::AppService, "backend")
            .with_literal("port", 3000)
            .with_literal("target_port", 3000)
            .with_reference("selector", &backend, "name"),
    );

    let frontend = app.child("frontend");
    declarations.push(
        Declaration::new(frontend.clone(), DeclarationKind::AppDeployment, "frontend")
            .with_literal("replicas", 1)
            .with_literal("image", "app/frontend")
            .with_literal("container_port", 3000),
    );
    declarations.push(
        Declaration::new(app.child("frontend-service"), DeclarationKind::AppService, "frontend")
            .with_literal("service_type", "LoadBalancer")
            .with_literal("port", 3000)
            .with_literal("target_port", 3000)
            .with_reference("selector", &frontend, "name"),
    );

    for declaration in declarations {
        let gated = declaration
            .with_reference("cluster_endpoint", cluster, "endpoint")
            .with_reference("cluster_certificate_authority", cluster, "certificate_authority")
            .with_reference("cluster_auth_token", cluster, "auth_token")
            .with_after(cluster);
        set.push(gated)?;
    }

    Ok(set)
}

fn service_trust(service: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Principal": { "Service": service },
            "Effect": "Allow",
        }],
    })
}

fn policy_document(actions: &[&str]) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": actions,
            "Resource": "*",
            "Effect": "Allow",
        }],
    })
}
