// Copyright 2025 Cowboy AI, LLC.

//! Provisioning Backend Contract
//!
//! The backend is opaque to the engine: it accepts one declaration plus
//! its fully resolved inputs and answers with an identifier and output
//! attributes. The apply walker in this module drives a backend over a
//! stack plan, binding named output references as they become available.
//! Backend errors surface unchanged; the engine never retries.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

use crate::declaration::{Declaration, DeclarationKind, InputValue, LogicalId};
use crate::errors::{ReferenceError, Result, SynthesisError};
use crate::stack::StackPlan;

/// Opaque backend failure, surfaced unchanged
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// Identifier and output attributes of one provisioned resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provisioned {
    pub id: String,
    pub outputs: BTreeMap<String, serde_json::Value>,
}

/// The provisioning backend contract
pub trait ProvisioningBackend {
    /// Apply one declaration with its resolved inputs
    fn declare(
        &mut self,
        declaration: &Declaration,
        inputs: &BTreeMap<String, serde_json::Value>,
    ) -> std::result::Result<Provisioned, BackendError>;
}

/// Resources provisioned by one apply walk, keyed by logical id
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub resources: BTreeMap<LogicalId, Provisioned>,
}

/// Apply a stack plan unit by unit
///
/// Units apply in plan order; within a unit, declarations apply in a
/// topological order over their reference and `after` edges, with
/// insertion order breaking ties so the walk is deterministic.
pub fn apply_plan(
    plan: &StackPlan,
    backend: &mut dyn ProvisioningBackend,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();

    for unit in &plan.units {
        info!(unit = %unit.name, declarations = unit.declarations.len(), "applying unit");

        for declaration in ordered(unit)? {
            let inputs = resolve_inputs(declaration, &report)?;
            let provisioned = backend
                .declare(declaration, &inputs)
                .map_err(|e| SynthesisError::ProvisioningBackend(e.to_string()))?;

            debug!(id = %declaration.id, resource = %provisioned.id, "declared");
            report.resources.insert(declaration.id.clone(), provisioned);
        }
    }

    Ok(report)
}

/// Topological order of one unit's declarations (Kahn's algorithm)
fn ordered(unit: &crate::stack::StackUnit) -> Result<Vec<&Declaration>> {
    let declarations: Vec<&Declaration> = unit.declarations.iter().collect();
    let position: HashMap<&LogicalId, usize> = declarations
        .iter()
        .enumerate()
        .map(|(i, d)| (&d.id, i))
        .collect();

    let mut blockers: Vec<usize> = vec![0; declarations.len()];
    let mut blocks: Vec<Vec<usize>> = vec![Vec::new(); declarations.len()];
    for (i, declaration) in declarations.iter().enumerate() {
        for target in declaration.depends_on() {
            // Cross-unit targets were applied with an earlier unit.
            if let Some(&t) = position.get(target) {
                blockers[i] += 1;
                blocks[t].push(i);
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..declarations.len()).filter(|&i| blockers[i] == 0).collect();
    let mut order = Vec::with_capacity(declarations.len());

    while let Some(i) = queue.pop_front() {
        order.push(declarations[i]);
        for &next in &blocks[i] {
            blockers[next] -= 1;
            if blockers[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() != declarations.len() {
        let stuck = declarations
            .iter()
            .enumerate()
            .find(|(i, _)| blockers[*i] > 0)
            .map(|(_, d)| d.id.to_string())
            .unwrap_or_default();
        return Err(ReferenceError::CircularDependency(stuck).into());
    }

    Ok(order)
}

fn resolve_inputs(
    declaration: &Declaration,
    report: &ApplyReport,
) -> Result<BTreeMap<String, serde_json::Value>> {
    let mut resolved = BTreeMap::new();

    for (key, value) in &declaration.inputs {
        let value = match value {
            InputValue::Literal(v) => v.clone(),
            InputValue::Ref { target, output } => {
                let provisioned = report.resources.get(target).ok_or_else(|| {
                    ReferenceError::UnknownTarget {
                        declaration: declaration.id.to_string(),
                        target: target.to_string(),
                    }
                })?;

                provisioned.outputs.get(output).cloned().ok_or_else(|| {
                    SynthesisError::ProvisioningBackend(format!(
                        "resource {target} exposes no output {output}"
                    ))
                })?
            }
        };
        resolved.insert(key.clone(), value);
    }

    Ok(resolved)
}

/// Deterministic in-memory backend for tests and dry runs
///
/// Ids derive from the logical id; outputs cover the names the
/// synthesizers bind (`id`, `name`, `arn`, plus kind-specific ones such
/// as an elastic IP's `address` or a cluster's `endpoint`).
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    addresses_allocated: u32,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProvisioningBackend for MemoryBackend {
    fn declare(
        &mut self,
        declaration: &Declaration,
        _inputs: &BTreeMap<String, serde_json::Value>,
    ) -> std::result::Result<Provisioned, BackendError> {
        let id = format!("mock/{}", declaration.id);
        let mut outputs = BTreeMap::new();
        outputs.insert("id".to_string(), serde_json::json!(id));
        outputs.insert("name".to_string(), serde_json::json!(declaration.name));
        outputs.insert(
            "arn".to_string(),
            serde_json::json!(format!("arn:mock:::{}", declaration.id)),
        );

        match declaration.kind {
            DeclarationKind::ElasticIp => {
                self.addresses_allocated += 1;
                outputs.insert(
                    "address".to_string(),
                    serde_json::json!(format!("198.51.100.{}", self.addresses_allocated)),
                );
            }
            DeclarationKind::Cluster => {
                outputs.insert(
                    "endpoint".to_string(),
                    serde_json::json!(format!("https://{}.cluster.mock", declaration.name)),
                );
                outputs.insert(
                    "certificate_authority".to_string(),
                    serde_json::json!("LS0tLS1CRUdJTi0tLS0t"),
                );
                outputs.insert(
                    "auth_token".to_string(),
                    serde_json::json!(format!("token-{}", declaration.name)),
                );
            }
            DeclarationKind::DnsZone => {
                outputs.insert(
                    "zone_id".to_string(),
                    serde_json::json!(format!("Z-{}", declaration.name)),
                );
            }
            _ => {}
        }

        Ok(Provisioned { id, outputs })
    }
}
