// Copyright 2025 Cowboy AI, LLC.

//! Stack Partitioner
//!
//! Groups the synthesized declarations into independently deployable
//! units: identity always first, then one unit per region. Declarations
//! never cross unit boundaries except through named output references;
//! the partitioner audits every edge and records the resulting
//! unit-level ordering, so the backend may apply independent units
//! concurrently.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::declaration::{DeclarationSet, LogicalId};
use crate::errors::{ReferenceError, Result};

/// Workspace name of the identity unit
pub const IDENTITY_WORKSPACE: &str = "identity";

/// One independently deployable group of declarations
#[derive(Debug, Clone, Serialize)]
pub struct StackUnit {
    /// Unit name; `identity` or the region name
    pub name: String,

    /// Remote-state workspace the unit deploys into
    pub workspace: String,

    /// Units that must be applied before this one
    pub depends_on: Vec<String>,

    /// Declarations in apply order
    pub declarations: DeclarationSet,
}

/// The partitioned synthesis output
#[derive(Debug, Clone, Serialize)]
pub struct StackPlan {
    pub units: Vec<StackUnit>,
}

impl StackPlan {
    /// Find a unit by name
    pub fn unit(&self, name: &str) -> Option<&StackUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Locate the declaration owning an id, with its unit
    pub fn find(&self, id: &LogicalId) -> Option<(&StackUnit, &crate::declaration::Declaration)> {
        self.units
            .iter()
            .find_map(|unit| unit.declarations.get(id).map(|d| (unit, d)))
    }

    /// Total declaration count across all units
    pub fn len(&self) -> usize {
        self.units.iter().map(|u| u.declarations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition synthesized declarations into ordered units
///
/// The identity unit is always emitted first, even when empty, so the
/// workspace layout is stable across documents.
pub fn partition(
    identity: DeclarationSet,
    regions: Vec<(String, DeclarationSet)>,
) -> Result<StackPlan> {
    let mut units = Vec::with_capacity(regions.len() + 1);
    units.push(StackUnit {
        name: IDENTITY_WORKSPACE.to_string(),
        workspace: IDENTITY_WORKSPACE.to_string(),
        depends_on: Vec::new(),
        declarations: identity,
    });

    for (region_name, declarations) in regions {
        units.push(StackUnit {
            name: region_name.clone(),
            workspace: region_name,
            depends_on: Vec::new(),
            declarations,
        });
    }

    // Ownership map for the cross-unit reference audit.
    let mut owner_of: HashMap<LogicalId, usize> = HashMap::new();
    for (index, unit) in units.iter().enumerate() {
        for declaration in &unit.declarations {
            owner_of.insert(declaration.id.clone(), index);
        }
    }

    for index in 0..units.len() {
        let mut upstream = Vec::new();
        for declaration in &units[index].declarations {
            for target in declaration.depends_on() {
                match owner_of.get(target) {
                    None => {
                        return Err(ReferenceError::UnknownTarget {
                            declaration: declaration.id.to_string(),
                            target: target.to_string(),
                        }
                        .into());
                    }
                    Some(&owner) if owner == index => {}
                    Some(&owner) if owner < index => {
                        let name = units[owner].name.clone();
                        if !upstream.contains(&name) {
                            upstream.push(name);
                        }
                    }
                    Some(_) => {
                        // A reference into a unit applied later can never
                        // resolve.
                        return Err(ReferenceError::CircularDependency(
                            declaration.id.to_string(),
                        )
                        .into());
                    }
                }
            }
        }
        units[index].depends_on = upstream;
    }

    debug!(units = units.len(), "partitioned stack plan");
    Ok(StackPlan { units })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::{Declaration, DeclarationKind};

    fn declaration(id: &LogicalId, kind: DeclarationKind) -> Declaration {
        Declaration::new(id.clone(), kind, id.to_string())
    }

    #[test]
    fn test_identity_unit_always_first() {
        let plan = partition(DeclarationSet::new(), vec![("eu-1".into(), DeclarationSet::new())])
            .unwrap();
        assert_eq!(plan.units[0].name, "identity");
        assert_eq!(plan.units[1].workspace, "eu-1");
    }

    #[test]
    fn test_region_referencing_identity_orders_after_it() {
        let profile = LogicalId::new("identity").child("ci").child("profile");
        let mut identity = DeclarationSet::new();
        identity
            .push(declaration(&profile, DeclarationKind::InstanceProfile))
            .unwrap();

        let instance = LogicalId::new("eu-1").child("app").child("data").child("runner");
        let mut region = DeclarationSet::new();
        region
            .push(
                declaration(&instance, DeclarationKind::Instance)
                    .with_reference("instance_profile", &profile, "name"),
            )
            .unwrap();

        let plan = partition(identity, vec![("eu-1".into(), region)]).unwrap();
        assert_eq!(plan.units[1].depends_on, vec!["identity".to_string()]);
    }

    #[test]
    fn test_region_without_identity_reference_is_independent() {
        let network = LogicalId::new("eu-1").child("app");
        let mut region = DeclarationSet::new();
        region
            .push(declaration(&network, DeclarationKind::Network))
            .unwrap();

        let plan = partition(DeclarationSet::new(), vec![("eu-1".into(), region)]).unwrap();
        assert!(plan.units[1].depends_on.is_empty());
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let ghost = LogicalId::new("eu-1").child("nowhere");
        let network = LogicalId::new("eu-1").child("app");
        let mut region = DeclarationSet::new();
        region
            .push(
                declaration(&network, DeclarationKind::Network).with_reference("x", &ghost, "id"),
            )
            .unwrap();

        let err = partition(DeclarationSet::new(), vec![("eu-1".into(), region)]).unwrap_err();
        assert!(err.to_string().contains("eu-1/nowhere"));
    }

    #[test]
    fn test_forward_unit_reference_rejected() {
        let late = LogicalId::new("us-1").child("app");
        let mut us = DeclarationSet::new();
        us.push(declaration(&late, DeclarationKind::Network)).unwrap();

        let early = LogicalId::new("eu-1").child("app");
        let mut eu = DeclarationSet::new();
        eu.push(declaration(&early, DeclarationKind::Network).with_reference("peer", &late, "id"))
            .unwrap();

        let err = partition(
            DeclarationSet::new(),
            vec![("eu-1".into(), eu), ("us-1".into(), us)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::errors::SynthesisError::ReferenceResolution(
                ReferenceError::CircularDependency(_)
            )
        ));
    }
}
