// Copyright 2025 Cowboy AI, LLC.

//! Topology Document Loading
//!
//! YAML loading for the CLI; the engine itself only ever sees the parsed
//! `TopologyDocument`. Loading failures are reported before the schema
//! gate runs.

use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::domain::TopologyDocument;

/// Errors that can occur while loading a topology document
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed topology document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Load a topology document from a YAML file
pub fn load_document(path: &Path) -> Result<TopologyDocument, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let document = parse_document(&text)?;
    info!(path = %path.display(), regions = document.regions.len(), "loaded topology document");
    Ok(document)
}

/// Parse a topology document from YAML text
pub fn parse_document(text: &str) -> Result<TopologyDocument, LoadError> {
    Ok(serde_yaml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_malformed_yaml() {
        assert!(matches!(
            parse_document("owner: [unbalanced"),
            Err(LoadError::Yaml(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_cidr() {
        let err = parse_document(
            r#"
owner: ops
regions:
  - name: eu-1
    networks:
      - name: app
        cidr_block: not-a-cidr
        private_zone: app.internal
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid CIDR notation"));
    }

    #[test]
    fn test_parse_minimal() {
        let document = parse_document("owner: ops\nregions: []\n").unwrap();
        assert!(document.regions.is_empty());
        assert!(document.identity_roles.is_empty());
    }
}
