// Copyright 2025 Cowboy AI, LLC.

//! Object Store Synthesizer
//!
//! Expands a region's object store into bucket, bucket-policy, and
//! public-access-block declarations.

use serde_json::json;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, LogicalId};
use crate::domain::ObjectStoreSpec;
use crate::errors::Result;

/// Expand the region's object store
pub fn synthesize_object_store(
    owner: &str,
    region_name: &str,
    spec: &ObjectStoreSpec,
) -> Result<(DeclarationSet, LogicalId)> {
    let mut set = DeclarationSet::new();
    let store = LogicalId::new(region_name).child("store");

    set.push(
        Declaration::new(store.clone(), DeclarationKind::ObjectStore, spec.bucket.clone())
            .with_literal("bucket", spec.bucket.clone())
            .with_literal("tags", json!({ "Owner": owner })),
    )?;

    set.push(
        Declaration::new(
            store.child("policy"),
            DeclarationKind::ObjectStorePolicy,
            format!("{}-policy", spec.bucket),
        )
        .with_reference("bucket", &store, "arn")
        .with_literal(
            "policy",
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Sid": "PublicReadGetObject",
                    "Effect": "Allow",
                    "Principal": "*",
                    "Action": "s3:GetObject",
                    "Resource": format!("arn:aws:s3:::{}/*", spec.bucket),
                }],
            }),
        ),
    )?;

    set.push(
        Declaration::new(
            store.child("access-block"),
            DeclarationKind::ObjectStoreAccessBlock,
            format!("{}-access-block", spec.bucket),
        )
        .with_reference("bucket", &store, "id")
        .with_literal("block_public_acls", spec.block_public_access)
        .with_literal("block_public_policy", spec.block_public_access)
        .with_literal("ignore_public_acls", spec.block_public_access)
        .with_literal("restrict_public_buckets", spec.block_public_access),
    )?;

    Ok((set, store))
}
