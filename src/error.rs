use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The category of a problem found while decoding, validating or patching a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// `nodes`/`edges` missing or not a sequence, duplicated node ids, undecodable entries.
    Structural,
    /// An edge references a node id that does not exist.
    Reference,
    /// The edge relation contains a cycle.
    Cycle,
    /// A field or executor configuration violates the schema policy.
    Schema,
    /// An id collision with divergent content, or a missing update/remove target.
    Conflict,
    /// `add_edges` referenced an endpoint absent at that point of the apply sequence.
    ReferentialAdd,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Structural => "StructuralError",
            IssueKind::Reference => "ReferenceError",
            IssueKind::Cycle => "CycleError",
            IssueKind::Schema => "SchemaError",
            IssueKind::Conflict => "ConflictError",
            IssueKind::ReferentialAdd => "ReferentialAddError",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A machine-readable `{path, reason}` problem report.
///
/// Issues are data, never panics: every engine operation collects all of them
/// so a caller can highlight every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: String,
    pub reason: String,
}

impl Issue {
    pub fn new(kind: IssueKind, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn structural(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::Structural, path, reason)
    }

    pub fn reference(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::Reference, path, reason)
    }

    pub fn cycle(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::Cycle, path, reason)
    }

    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::Schema, path, reason)
    }

    pub fn conflict(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::Conflict, path, reason)
    }

    pub fn referential_add(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(IssueKind::ReferentialAdd, path, reason)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.kind, self.reason)
        } else {
            write!(f, "{}: {} (at {})", self.kind, self.reason, self.path)
        }
    }
}

// Helper to format a list of issues inside an error message
struct IssueListFormat<'a>(&'a [Issue]);

impl fmt::Display for IssueListFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s):", self.0.len())?;
        for (i, issue) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, issue)?;
        }
        Ok(())
    }
}

/// Errors that can occur while turning external JSON into engine types.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(String),

    #[error("Graph document is invalid: {}", IssueListFormat(.0))]
    Invalid(Vec<Issue>),

    #[error("Patch document is invalid: {0}")]
    InvalidPatch(String),

    #[error("Schema policy is invalid: {0}")]
    InvalidPolicy(String),
}

impl GraphError {
    /// The issues carried by this error, if it was produced by document decoding.
    pub fn issues(&self) -> &[Issue] {
        match self {
            GraphError::Invalid(issues) => issues,
            _ => &[],
        }
    }
}

/// Errors reported by an external graph store collaborator.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Graph '{0}' was rejected by the store: {1}")]
    Rejected(String, String),

    #[error("Graph store is unavailable: {0}")]
    Unavailable(String),
}
