// Copyright 2025 Cowboy AI, LLC.

//! Backup Job Synthesizer
//!
//! Expands a region's backup job into a scheduled-function sub-graph:
//! execution role with an artifact-write policy, the function itself
//! with its connection environment, the scheduler's invoke permission,
//! and the daily schedule rule plus target. The connection target is the
//! spec's explicit override when present, otherwise the first private
//! DNS entry's resolved address — absence is a configuration error,
//! never silently defaulted.

use serde_json::json;
use tracing::debug;

use crate::declaration::{Declaration, DeclarationKind, DeclarationSet, InputValue, LogicalId};
use crate::domain::{BackupJobSpec, Region};
use crate::errors::{ReferenceError, Result};
use crate::synth::compute::PrivateDnsEntry;

/// Expand the region's backup job
pub fn synthesize_backup(
    owner: &str,
    region: &Region,
    spec: &BackupJobSpec,
    dns_entries: &[PrivateDnsEntry],
) -> Result<DeclarationSet> {
    let store = region
        .object_store
        .as_ref()
        .ok_or_else(|| ReferenceError::MissingObjectStore(region.name.clone()))?;

    let connection: InputValue = match &spec.connection_target {
        Some(target) => InputValue::literal(target.clone()),
        None => {
            let entry = dns_entries
                .first()
                .ok_or_else(|| ReferenceError::MissingPrivateDns(region.name.clone()))?;
            InputValue::reference(&entry.elastic_ip, "address")
        }
    };

    debug!(region = %region.name, store = %store.bucket, "synthesizing backup job");

    let mut set = DeclarationSet::new();
    let base = LogicalId::new(&region.name).child("backup");

    let role = base.child("role");
    set.push(
        Declaration::new(
            role.clone(),
            DeclarationKind::Role,
            format!("backup-{}", store.bucket),
        )
        .with_literal(
            "assume_role_policy",
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Principal": { "Service": "lambda.amazonaws.com" },
                    "Effect": "Allow",
                    "Sid": "",
                }],
            }),
        ),
    )?;

    set.push(
        Declaration::new(
            role.child("store-write"),
            DeclarationKind::RolePolicy,
            format!("backup-store-write-{}", store.bucket),
        )
        .with_reference("role", &role, "id")
        .with_literal(
            "policy",
            json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": ["s3:PutObject", "s3:PutObjectAcl"],
                    "Resource": format!("arn:aws:s3:::{}/*", store.bucket),
                }],
            }),
        ),
    )?;

    let function = base.child("function");
    set.push(
        Declaration::new(
            function.clone(),
            DeclarationKind::ScheduledFunction,
            format!("backup-{}", region.name),
        )
        .with_reference("role_arn", &role, "arn")
        .with_literal("artifact_store", spec.artifact_store.clone())
        .with_literal("artifact_key", "backup-function.zip")
        .with_literal("handler", "index.handler")
        .with_literal("timeout", 30)
        .with_literal("env.STORE_PATH", store.bucket.clone())
        .with_input("env.CONNECTION_HOST", connection)
        .with_literal("tags", json!({ "Owner": owner })),
    )?;

    set.push(
        Declaration::new(
            base.child("permission"),
            DeclarationKind::FunctionPermission,
            format!("backup-permission-{}", region.name),
        )
        .with_reference("function", &function, "id")
        .with_literal("action", "lambda:InvokeFunction")
        .with_literal("principal", "events.amazonaws.com"),
    )?;

    let schedule = base.child("schedule");
    set.push(
        Declaration::new(
            schedule.clone(),
            DeclarationKind::ScheduleRule,
            format!("backup-schedule-{}", region.name),
        )
        .with_literal("schedule_expression", "rate(1 day)"),
    )?;

    set.push(
        Declaration::new(
            schedule.child("target"),
            DeclarationKind::ScheduleTarget,
            format!("backup-target-{}", region.name),
        )
        .with_reference("rule", &schedule, "name")
        .with_reference("function_arn", &function, "arn"),
    )?;

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(yaml: &str) -> Region {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn dns_entry() -> PrivateDnsEntry {
        let instance = LogicalId::new("eu-1").child("app").child("data").child("store");
        PrivateDnsEntry {
            hostname: "store.app.internal".into(),
            elastic_ip: instance.child("eip"),
            record: instance.child("dns-record"),
        }
    }

    const WITH_STORE: &str = r#"
name: eu-1
object_store:
  bucket: backups-eu-1
backup_job:
  store: backups-eu-1
  artifact_store: artifacts-eu-1
"#;

    #[test]
    fn test_missing_object_store_is_fatal() {
        let region = region(
            r#"
name: eu-1
backup_job:
  store: backups-eu-1
  artifact_store: artifacts-eu-1
"#,
        );
        let spec = region.backup_job.clone().unwrap();

        let err = synthesize_backup("ops", &region, &spec, &[dns_entry()]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing object store for backup job in region eu-1"
        );
    }

    #[test]
    fn test_connection_resolves_first_dns_entry() {
        let region = region(WITH_STORE);
        let spec = region.backup_job.clone().unwrap();
        let entry = dns_entry();

        let set = synthesize_backup("ops", &region, &spec, &[entry.clone()]).unwrap();
        let function = set.get(&LogicalId::new("eu-1").child("backup").child("function")).unwrap();
        assert_eq!(
            function.inputs.get("env.CONNECTION_HOST"),
            Some(&InputValue::reference(&entry.elastic_ip, "address"))
        );
        assert_eq!(
            function.inputs.get("env.STORE_PATH"),
            Some(&InputValue::literal("backups-eu-1"))
        );
    }

    #[test]
    fn test_explicit_connection_target_wins() {
        let region = region(
            r#"
name: eu-1
object_store:
  bucket: backups-eu-1
backup_job:
  store: backups-eu-1
  artifact_store: artifacts-eu-1
  connection_target: db.internal.example
"#,
        );
        let spec = region.backup_job.clone().unwrap();

        let set = synthesize_backup("ops", &region, &spec, &[dns_entry()]).unwrap();
        let function = set.get(&LogicalId::new("eu-1").child("backup").child("function")).unwrap();
        assert_eq!(
            function.inputs.get("env.CONNECTION_HOST"),
            Some(&InputValue::literal("db.internal.example"))
        );
    }

    #[test]
    fn test_no_dns_entry_and_no_override_is_fatal() {
        let region = region(WITH_STORE);
        let spec = region.backup_job.clone().unwrap();

        let err = synthesize_backup("ops", &region, &spec, &[]).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::SynthesisError::ReferenceResolution(
                ReferenceError::MissingPrivateDns(_)
            )
        ));
        assert!(err.to_string().contains("eu-1"));
    }

    #[test]
    fn test_schedule_shape() {
        let region = region(WITH_STORE);
        let spec = region.backup_job.clone().unwrap();

        let set = synthesize_backup("ops", &region, &spec, &[dns_entry()]).unwrap();
        let schedule = set.get(&LogicalId::new("eu-1").child("backup").child("schedule")).unwrap();
        assert_eq!(
            schedule.inputs.get("schedule_expression"),
            Some(&InputValue::literal("rate(1 day)"))
        );

        let target = set
            .get(&LogicalId::new("eu-1").child("backup").child("schedule").child("target"))
            .unwrap();
        assert_eq!(target.references().count(), 2);
    }
}
