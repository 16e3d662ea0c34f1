//! Patch documents and their application to graphs.

mod applier;
mod document;
mod draft;
mod node_update;

pub use applier::{ApplyOptions, ApplyResult, PatchApplier};
pub use document::{ConfigsPatch, FieldListPatch, FieldUpdate, NodeRef, NodeUpdate, Patch};
pub use crate::model::FieldSelector;

pub(crate) use node_update::apply_node_update;
