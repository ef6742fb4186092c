// Copyright 2025 Cowboy AI, LLC.

//! Document Schema Gate
//!
//! Structural validation run before synthesis. The gate walks the parsed
//! document and collects every violation with the topology path that
//! produced it; synthesis refuses to start while any violation exists.
//! Address arithmetic between sibling blocks is deliberately not checked
//! here — the gate validates shape, not allocation.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Region, ScalingBounds, TopologyDocument, VirtualNetwork};
use crate::errors::{Result, SynthesisError};

/// One violated path in the topology document
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{path}: {message}")]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Run the schema gate; every violation is reported at once
pub fn check_document(document: &TopologyDocument) -> Result<()> {
    let violations = collect_violations(document);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SynthesisError::SchemaValidation(violations))
    }
}

/// Walk the document and collect all structural violations
pub fn collect_violations(document: &TopologyDocument) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if document.owner.trim().is_empty() {
        violations.push(SchemaViolation::new("owner", "must not be empty"));
    }

    let mut region_names = std::collections::HashSet::new();
    for (r, region) in document.regions.iter().enumerate() {
        let path = format!("regions[{r}]");
        if region.name.trim().is_empty() {
            violations.push(SchemaViolation::new(format!("{path}.name"), "must not be empty"));
        } else if !region_names.insert(region.name.as_str()) {
            violations.push(SchemaViolation::new(
                format!("{path}.name"),
                format!("duplicate region name {}", region.name),
            ));
        }

        check_region(region, &path, &mut violations);
    }

    for (key, spec) in &document.identity_roles {
        let path = format!("identity_roles.{key}");
        if key.trim().is_empty() {
            violations.push(SchemaViolation::new("identity_roles", "role key must not be empty"));
        }
        if spec.trust_policy.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{path}.trust_policy"),
                "must not be empty",
            ));
        }
    }

    violations
}

fn check_region(region: &Region, path: &str, violations: &mut Vec<SchemaViolation>) {
    if let Some(store) = &region.object_store {
        if store.bucket.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{path}.object_store.bucket"),
                "must not be empty",
            ));
        }
    }

    if let Some(job) = &region.backup_job {
        if job.store.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{path}.backup_job.store"),
                "must not be empty",
            ));
        }
        if job.artifact_store.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{path}.backup_job.artifact_store"),
                "must not be empty",
            ));
        }
    }

    let mut network_names = std::collections::HashSet::new();
    for (n, network) in region.networks.iter().enumerate() {
        let network_path = format!("{path}.networks[{n}]");
        if network.name.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{network_path}.name"),
                "must not be empty",
            ));
        } else if !network_names.insert(network.name.as_str()) {
            violations.push(SchemaViolation::new(
                format!("{network_path}.name"),
                format!("duplicate network name {}", network.name),
            ));
        }

        check_network(network, &network_path, violations);
    }
}

fn check_network(network: &VirtualNetwork, path: &str, violations: &mut Vec<SchemaViolation>) {
    if network.private_zone.trim().is_empty() {
        violations.push(SchemaViolation::new(
            format!("{path}.private_zone"),
            "must not be empty",
        ));
    }

    if let Some(cluster) = &network.cluster {
        if cluster.name.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{path}.cluster.name"),
                "must not be empty",
            ));
        }
        check_scaling(
            &cluster.node_group.scaling,
            &format!("{path}.cluster.node_group.scaling"),
            violations,
        );
    }

    let mut subnet_names = std::collections::HashSet::new();
    let mut instance_names = std::collections::HashSet::new();
    for (s, subnet) in network.subnets.iter().enumerate() {
        let subnet_path = format!("{path}.subnets[{s}]");
        if subnet.name.trim().is_empty() {
            violations.push(SchemaViolation::new(
                format!("{subnet_path}.name"),
                "must not be empty",
            ));
        } else if !subnet_names.insert(subnet.name.as_str()) {
            violations.push(SchemaViolation::new(
                format!("{subnet_path}.name"),
                format!("duplicate subnet name {}", subnet.name),
            ));
        }

        if subnet.route_class.is_none() {
            violations.push(SchemaViolation::new(
                format!("{subnet_path}.route_class"),
                "routing class is unset",
            ));
        }

        for (i, instance) in subnet.instances.iter().enumerate() {
            let instance_path = format!("{subnet_path}.instances[{i}]");
            if instance.name.trim().is_empty() {
                violations.push(SchemaViolation::new(
                    format!("{instance_path}.name"),
                    "must not be empty",
                ));
            } else if !instance_names.insert(instance.name.clone()) {
                violations.push(SchemaViolation::new(
                    format!("{instance_path}.name"),
                    format!("duplicate instance name {}", instance.name),
                ));
            }

            if instance.hostname.trim().is_empty() {
                violations.push(SchemaViolation::new(
                    format!("{instance_path}.hostname"),
                    "must not be empty",
                ));
            }
        }
    }
}

fn check_scaling(scaling: &ScalingBounds, path: &str, violations: &mut Vec<SchemaViolation>) {
    if scaling.min > scaling.max {
        violations.push(SchemaViolation::new(
            path,
            format!("min {} exceeds max {}", scaling.min, scaling.max),
        ));
    }
    if scaling.desired < scaling.min || scaling.desired > scaling.max {
        violations.push(SchemaViolation::new(
            path,
            format!(
                "desired {} outside bounds {}..={}",
                scaling.desired, scaling.min, scaling.max
            ),
        ));
    }
}
