//! # Flowpatch - Workflow Graph Patch, Validation and Diff Engine
//!
//! **Flowpatch** mutates typed workflow graphs (DAGs of processing nodes joined by
//! directed edges) through declarative patches, checks them against structural and
//! schema invariants, and computes minimal patches between two graph versions.
//! Every operation is a pure in-memory transform: problems come back as data with
//! a machine-readable `{path, reason}`, never as panics.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Graph**: Decode a `{nodes, edges}` document with `Graph::from_json`, or build one from typed `Node`/`Edge` values.
//! 2.  **Patch**: Describe the change as a `Patch` and run it through a `PatchApplier`. The base graph is never touched; the result carries the new graph, errors and warnings.
//! 3.  **Validate**: The applier runs the `Validator` (references, cycles, executor, field schema, join relations) on the result. A custom `SchemaPolicy` or extra rules go through `Validator::builder()`.
//! 4.  **Commit**: A successful non-dry run carries the canonical payload string, ready for an external graph store.
//!
//! `diff(old, new)` goes the other way and yields the patch that turns `old` into `new`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowpatch::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let base = Graph::from_json(&std::fs::read_to_string("graph.json")?)?;
//!
//!     let patch = Patch::new()
//!         .update_node(NodeUpdate::new("n1").set("name", json!("SQL-orders")))
//!         .add_node(Node::new("n2", "native.filter"))
//!         .add_edge("n1", "n2");
//!
//!     let applier = PatchApplier::default();
//!     let result = applier.apply(&base, &patch, ApplyOptions::commit());
//!
//!     if result.ok {
//!         println!("payload: {}", result.payload.unwrap_or_default());
//!     } else {
//!         for issue in &result.errors {
//!             println!("-> {}", issue);
//!         }
//!     }
//!
//!     // The inverse direction: the patch between two versions.
//!     let roundtrip = diff(&base, &result.new_graph);
//!     println!("{} operation(s)", roundtrip.operation_count());
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod commit;
pub mod diff;
pub mod error;
pub mod model;
pub mod patch;
pub mod pipeline;
pub mod prelude;
pub mod validator;
