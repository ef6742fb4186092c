// Copyright 2025 Cowboy AI, LLC.

//! Cloud Service Tree Synthesis
//!
//! This crate expands one hierarchical description of a multi-region
//! cloud footprint into a fully wired, dependency-ordered set of
//! resource declarations, partitioned into independently deployable
//! stacks. Everything happens at compile time, before any provisioning
//! call is made.
//!
//! ## Architecture
//!
//! 1. **Pure expansion**: synthesis is a deterministic, side-effect-free
//!    tree walk; rerunning over an unchanged document yields a
//!    structurally identical declaration graph
//! 2. **Explicit references**: inter-resource data needs are named
//!    output references resolved by the provisioning backend, never
//!    live handles or call-order assumptions
//! 3. **All-or-nothing**: any synthesis error aborts the run naming the
//!    offending topology path; no partial declaration set escapes
//! 4. **External collaborators**: schema gate, file loading, zone
//!    catalog, and the provisioning backend sit behind seams the engine
//!    only consumes
//!
//! ## Usage
//!
//! ```rust
//! use cim_cloudtree::loader::parse_document;
//! use cim_cloudtree::source::MemoryFileSource;
//! use cim_cloudtree::synth::zones::StaticZoneCatalog;
//! use cim_cloudtree::synth::{synthesize, SynthesisContext};
//!
//! let document = parse_document(r#"
//! owner: ops
//! regions:
//!   - name: eu-1
//!     networks:
//!       - name: app
//!         cidr_block: 10.0.0.0/16
//!         private_zone: app.internal
//!         subnets:
//!           - name: frontend
//!             cidr_block: 10.0.1.0/24
//!             route_class: public
//! "#).unwrap();
//!
//! let files = MemoryFileSource::new();
//! let zones = StaticZoneCatalog::default();
//! let plan = synthesize(&document, &SynthesisContext::new(&files, &zones)).unwrap();
//!
//! // One unit for identity, one per region.
//! assert_eq!(plan.units.len(), 2);
//! ```

pub mod backend;
pub mod declaration;
pub mod domain;
pub mod errors;
pub mod loader;
pub mod source;
pub mod stack;
pub mod synth;
pub mod validate;

// Re-export commonly used types
pub use backend::{ApplyReport, BackendError, MemoryBackend, Provisioned, ProvisioningBackend};
pub use declaration::{Declaration, DeclarationKind, DeclarationSet, InputValue, LogicalId};
pub use domain::{CidrBlock, RouteClass, TopologyDocument};
pub use errors::{ReferenceError, Result, SynthesisError};
pub use source::{FileSource, FsFileSource, MemoryFileSource};
pub use stack::{StackPlan, StackUnit};
pub use synth::zones::{StaticZoneCatalog, ZoneCatalog};
pub use synth::{synthesize, SynthesisContext};
