//! The typed graph representation and its read-only queries.

mod document;
mod graph;
mod node;

pub use document::{DUPLICATE_EDGES_WARNING, DecodedGraph, GraphDocument, decode_graph};
pub use graph::Graph;
pub use node::{
    AnalysisType, Checked, ClosedTag, Edge, Field, FieldSelector, FieldType, NODE_SCHEMA_KEYS,
    Node, STABLE_KEY_ATTR,
};
