// Copyright 2025 Cowboy AI, LLC.

//! Identity Synthesizer
//!
//! Expands the account-wide identity-role map into role, instance
//! profile, policy, and attachment declarations. Runs once per
//! synthesis, ahead of every region, because compute declarations may
//! reference a profile by role-name key. Iteration follows input
//! document order so output is deterministic.

use std::collections::BTreeMap;
use tracing::debug;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, LogicalId};
use crate::domain::TopologyDocument;
use crate::errors::{ReferenceError, Result};
use crate::source::FileSource;

/// Managed-policy ARN prefix applied to bare policy names
const MANAGED_POLICY_PREFIX: &str = "arn:aws:iam::aws:policy/";

/// Registry of instance-profile declarations, keyed by role name
///
/// Lookup failures are fatal and name the instance and the key.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, LogicalId>,
}

impl ProfileRegistry {
    pub fn lookup(&self, key: &str) -> Option<&LogicalId> {
        self.profiles.get(key)
    }

    /// Resolve a profile key for an instance; unknown keys are fatal
    pub fn resolve(&self, instance_path: &LogicalId, key: &str) -> Result<&LogicalId> {
        self.lookup(key).ok_or_else(|| {
            ReferenceError::UnknownProfile {
                instance: instance_path.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Expand every identity role in document order
pub fn synthesize_identity(
    document: &TopologyDocument,
    files: &dyn FileSource,
) -> Result<(DeclarationSet, ProfileRegistry)> {
    let mut set = DeclarationSet::new();
    let mut registry = ProfileRegistry::default();
    let root = LogicalId::new("identity");

    for (key, spec) in &document.identity_roles {
        debug!(role = %key, "synthesizing identity role");
        let base = root.child(key);

        let role = base.child("role");
        let trust_policy = files.load(&spec.trust_policy)?;
        set.push(
            Declaration::new(role.clone(), DeclarationKind::Role, key.clone())
                .with_literal("assume_role_policy", trust_policy),
        )?;

        let profile = base.child("profile");
        set.push(
            Declaration::new(profile.clone(), DeclarationKind::InstanceProfile, key.clone())
                .with_reference("role", &role, "name"),
        )?;
        registry.profiles.insert(key.clone(), profile);

        for (i, template) in spec.policy_templates.iter().enumerate() {
            let document_text = files.load(template)?;

            let policy = base.child(format!("policy-{i}"));
            set.push(
                Declaration::new(
                    policy.clone(),
                    DeclarationKind::PolicyDocument,
                    format!("{key}-policy-{i}"),
                )
                .with_literal("policy", document_text),
            )?;

            set.push(
                Declaration::new(
                    base.child(format!("attach-template-{i}")),
                    DeclarationKind::PolicyAttachment,
                    format!("{key}-attachment-template-{i}"),
                )
                .with_reference("role", &role, "id")
                .with_reference("policy_arn", &policy, "arn"),
            )?;
        }

        for (i, arn) in spec.policy_arns.iter().enumerate() {
            set.push(
                Declaration::new(
                    base.child(format!("attach-arn-{i}")),
                    DeclarationKind::PolicyAttachment,
                    format!("{key}-attachment-arn-{i}"),
                )
                .with_reference("role", &role, "id")
                .with_literal("policy_arn", qualify_arn(arn)),
            )?;
        }
    }

    Ok((set, registry))
}

fn qualify_arn(reference: &str) -> String {
    if reference.starts_with("arn:") {
        reference.to_string()
    } else {
        format!("{MANAGED_POLICY_PREFIX}{reference}")
    }
}
