//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the
//! flowpatch crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowpatch::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let old = Graph::from_json(&std::fs::read_to_string("path/to/stored.json")?)?;
//! let new = Graph::from_json(&std::fs::read_to_string("path/to/candidate.json")?)?;
//!
//! let report = Validator::default().validate(&new);
//! println!("valid: {}", report.ok);
//!
//! let patch = diff(&old, &new);
//! let result = PatchApplier::default().apply(&old, &patch, ApplyOptions::dry_run());
//! assert_eq!(result.new_graph, new);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::model::{AnalysisType, Edge, Field, FieldSelector, FieldType, Graph, Node};

// Patching and diffing
pub use crate::diff::{DiffEngine, diff};
pub use crate::patch::{ApplyOptions, ApplyResult, NodeUpdate, Patch, PatchApplier};
pub use crate::pipeline::Pipeline;

// Validation
pub use crate::validator::{SchemaPolicy, ValidationReport, Validator};

// Serialization and the store boundary
pub use crate::codec::{to_payload, to_pretty_payload};
pub use crate::commit::{CommitRequest, GraphStore, prepare_commits};

// Error types
pub use crate::error::{GraphError, Issue, IssueKind, StoreError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
