// Copyright 2025 Cowboy AI, LLC.

//! File Collaborator
//!
//! Trust policies, inline policy templates, and instance boot scripts
//! are referenced by path in the topology document and loaded through
//! this seam. The engine only ever consumes the resulting text; where
//! the bytes come from is the collaborator's business.

use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::errors::ReferenceError;

/// Source of referenced file content
pub trait FileSource {
    /// Load the text content behind a path reference
    fn load(&self, path: &str) -> Result<String, ReferenceError>;
}

/// Filesystem-backed source rooted at a base directory
#[derive(Debug, Clone)]
pub struct FsFileSource {
    root: PathBuf,
}

impl FsFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for FsFileSource {
    fn load(&self, path: &str) -> Result<String, ReferenceError> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "loading referenced file");

        std::fs::read_to_string(&full).map_err(|e| ReferenceError::FileSource {
            path: full.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// In-memory source for tests and hermetic runs
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSource {
    files: HashMap<String, String>,
}

impl MemoryFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl FileSource for MemoryFileSource {
    fn load(&self, path: &str) -> Result<String, ReferenceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ReferenceError::FileSource {
                path: path.to_string(),
                reason: "not present in memory source".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_roundtrip() {
        let source = MemoryFileSource::new().with_file("policies/trust.json", "{}");
        assert_eq!(source.load("policies/trust.json").unwrap(), "{}");
    }

    #[test]
    fn test_memory_source_missing_file() {
        let source = MemoryFileSource::new();
        let err = source.load("missing.sh").unwrap_err();
        assert!(matches!(err, ReferenceError::FileSource { .. }));
        assert!(err.to_string().contains("missing.sh"));
    }
}
