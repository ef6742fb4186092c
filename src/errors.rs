// Copyright 2025 Cowboy AI, LLC.

//! Error types for topology synthesis
//!
//! The taxonomy is deliberately small: schema violations (pre-synthesis,
//! every violated path listed), unresolved references (fatal, naming the
//! offending topology path), CIDR computation failures, and opaque
//! backend errors surfaced unchanged. Any synthesis error aborts the
//! whole run; no partial declaration set is ever handed out.

use thiserror::Error;

use crate::domain::CidrError;
use crate::validate::SchemaViolation;

/// Errors that can occur during synthesis
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The document failed the schema gate
    #[error("schema validation failed:\n{}", format_violations(.0))]
    SchemaValidation(Vec<SchemaViolation>),

    /// A cross-resource reference could not be resolved
    #[error(transparent)]
    ReferenceResolution(#[from] ReferenceError),

    /// An address block could not be safely subdivided
    #[error("cannot carve NAT bootstrap subnet in network {path}: {source}")]
    CidrComputation {
        path: String,
        #[source]
        source: CidrError,
    },

    /// Surfaced unchanged from the provisioning backend, never retried
    #[error("provisioning backend error: {0}")]
    ProvisioningBackend(String),
}

/// Result type for synthesis operations
pub type Result<T> = std::result::Result<T, SynthesisError>;

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fatal reference-resolution failures, each naming the topology path
/// that caused it
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("instance {instance} references unknown identity profile key {key}")]
    UnknownProfile { instance: String, key: String },

    #[error("missing object store for backup job in region {0}")]
    MissingObjectStore(String),

    #[error("no cluster-member subnets in network {0}")]
    MissingClusterSubnets(String),

    #[error("no private DNS entry to resolve backup connection target in region {0}")]
    MissingPrivateDns(String),

    #[error("no availability zones for region {0}")]
    NoZones(String),

    #[error("cannot load {path}: {reason}")]
    FileSource { path: String, reason: String },

    #[error("duplicate declaration id {0}")]
    DuplicateDeclaration(String),

    #[error("declaration {declaration} references unknown id {target}")]
    UnknownTarget {
        declaration: String,
        target: String,
    },

    #[error("circular dependency involving declaration {0}")]
    CircularDependency(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_object_store_message() {
        let err = SynthesisError::from(ReferenceError::MissingObjectStore("eu-1".into()));
        assert_eq!(
            err.to_string(),
            "missing object store for backup job in region eu-1"
        );
    }

    #[test]
    fn test_schema_error_lists_every_violation() {
        let err = SynthesisError::SchemaValidation(vec![
            SchemaViolation::new("regions[0].name", "must not be empty"),
            SchemaViolation::new(
                "regions[0].networks[0].subnets[1].route_class",
                "routing class is unset",
            ),
        ]);

        let rendered = err.to_string();
        assert!(rendered.contains("regions[0].name: must not be empty"));
        assert!(rendered.contains("subnets[1].route_class: routing class is unset"));
    }
}
