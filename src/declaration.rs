// Copyright 2025 Cowboy AI, LLC.

//! Resource Declaration Graph
//!
//! Synthesizers emit `Declaration` records instead of live resource
//! handles. Inputs that depend on an upstream resource are expressed as
//! named output references (`InputValue::Ref`), resolved by the
//! provisioning backend after the target has been applied. Every
//! declaration carries a `LogicalId` derived from the topology path that
//! produced it, so names are deterministic and collision-free across
//! regions and units.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::errors::ReferenceError;

/// Deterministic identifier derived from a topology path
///
/// Segments are joined with `/`; equal topology input yields an equal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create an id from a root segment
    pub fn new(segment: impl Into<String>) -> Self {
        Self(segment.into())
    }

    /// Derive a child id by appending a path segment
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", self.0, segment.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of resource declarations the synthesizers emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationKind {
    Network,
    InternetGateway,
    ElasticIp,
    NatGateway,
    Subnet,
    RouteTable,
    Route,
    RouteTableAssociation,
    DnsZone,
    DnsRecord,
    FirewallRuleSet,
    Instance,
    ObjectStore,
    ObjectStorePolicy,
    ObjectStoreAccessBlock,
    Role,
    RolePolicy,
    PolicyDocument,
    PolicyAttachment,
    InstanceProfile,
    Cluster,
    NodeGroup,
    AppSecret,
    AppDeployment,
    AppService,
    ScheduledFunction,
    FunctionPermission,
    ScheduleRule,
    ScheduleTarget,
}

/// One input field of a declaration
///
/// Either a literal value known at synthesis time, or a named reference
/// to another declaration's output, bound by the backend at apply time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Ref { target: LogicalId, output: String },
    Literal(serde_json::Value),
}

impl InputValue {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        InputValue::Literal(value.into())
    }

    pub fn reference(target: &LogicalId, output: impl Into<String>) -> Self {
        InputValue::Ref {
            target: target.clone(),
            output: output.into(),
        }
    }
}

/// One resource request plus its resolved and deferred inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: LogicalId,
    pub kind: DeclarationKind,
    pub name: String,

    /// Input fields, keyed deterministically
    pub inputs: BTreeMap<String, InputValue>,

    /// Explicit ordering edges with no data dependency
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<LogicalId>,
}

impl Declaration {
    pub fn new(id: LogicalId, kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            inputs: BTreeMap::new(),
            after: Vec::new(),
        }
    }

    /// Add an input field
    pub fn with_input(mut self, key: impl Into<String>, value: InputValue) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    /// Add a literal input field
    pub fn with_literal(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inputs.insert(key.into(), InputValue::literal(value));
        self
    }

    /// Add a named output reference to another declaration
    pub fn with_reference(
        mut self,
        key: impl Into<String>,
        target: &LogicalId,
        output: impl Into<String>,
    ) -> Self {
        self.inputs
            .insert(key.into(), InputValue::reference(target, output));
        self
    }

    /// Add an explicit ordering edge
    pub fn with_after(mut self, target: &LogicalId) -> Self {
        self.after.push(target.clone());
        self
    }

    /// All named output references carried by this declaration
    pub fn references(&self) -> impl Iterator<Item = (&LogicalId, &str)> {
        self.inputs.values().filter_map(|value| match value {
            InputValue::Ref { target, output } => Some((target, output.as_str())),
            InputValue::Literal(_) => None,
        })
    }

    /// Every id this declaration must be applied after
    pub fn depends_on(&self) -> BTreeSet<&LogicalId> {
        self.references()
            .map(|(target, _)| target)
            .chain(self.after.iter())
            .collect()
    }
}

/// Insertion-ordered declaration collection with duplicate-id detection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeclarationSet {
    declarations: Vec<Declaration>,

    #[serde(skip)]
    index: HashMap<LogicalId, usize>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration; a duplicate id is an engine invariant failure
    pub fn push(&mut self, declaration: Declaration) -> Result<(), ReferenceError> {
        if self.index.contains_key(&declaration.id) {
            return Err(ReferenceError::DuplicateDeclaration(
                declaration.id.to_string(),
            ));
        }

        self.index
            .insert(declaration.id.clone(), self.declarations.len());
        self.declarations.push(declaration);
        Ok(())
    }

    /// Merge another set into this one, preserving both insertion orders
    pub fn extend(&mut self, other: DeclarationSet) -> Result<(), ReferenceError> {
        for declaration in other.declarations {
            self.push(declaration)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &LogicalId) -> Option<&Declaration> {
        self.index.get(id).map(|&i| &self.declarations[i])
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Declarations of one kind, in insertion order
    pub fn of_kind(&self, kind: DeclarationKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeclarationSet {
    type Item = &'a Declaration;
    type IntoIter = std::slice::Iter<'a, Declaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.iter()
    }
}
