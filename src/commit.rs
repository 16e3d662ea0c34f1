//! The boundary to the external graph store.
//!
//! The engine only prepares canonical payloads; sending them is left to the
//! caller through a [`GraphStore`] implementation.

use crate::codec;
use crate::error::{Issue, StoreError};
use crate::model::decode_graph;
use crate::validator::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A store that persists committed graph payloads.
pub trait GraphStore {
    /// Stores `payload` under `graph_id` and returns the id assigned by the store.
    fn commit(&self, graph_id: &str, payload: &str) -> Result<String, StoreError>;
}

/// A candidate graph produced by a planner for one interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedGraph {
    pub interface_id: String,
    pub interface_name: String,
    /// The raw `{nodes, edges}` document, decoded leniently during preparation.
    pub graph_json: Value,
}

impl PlannedGraph {
    pub fn new(
        interface_id: impl Into<String>,
        interface_name: impl Into<String>,
        graph_json: Value,
    ) -> Self {
        Self {
            interface_id: interface_id.into(),
            interface_name: interface_name.into(),
            graph_json,
        }
    }
}

/// A validated graph ready to be handed to a [`GraphStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub interface_id: String,
    pub interface_name: String,
    pub payload: String,
    pub validation_passed: bool,
}

impl CommitRequest {
    /// Sends the payload, using the interface id as the graph id.
    pub fn send<S: GraphStore + ?Sized>(&self, store: &S) -> Result<String, StoreError> {
        store.commit(&self.interface_id, &self.payload)
    }
}

/// A planned graph that could not be committed, with every reason why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitFailure {
    pub interface_id: String,
    pub interface_name: String,
    pub errors: Vec<Issue>,
}

/// The outcome of [`prepare_commits`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitBatch {
    pub requests: Vec<CommitRequest>,
    pub failures: Vec<CommitFailure>,
}

impl CommitBatch {
    pub fn processed(&self) -> usize {
        self.requests.len() + self.failures.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sends every request in order. Store errors do not stop the batch.
    pub fn send_all<S: GraphStore + ?Sized>(&self, store: &S) -> Vec<Result<String, StoreError>> {
        self.requests.iter().map(|r| r.send(store)).collect()
    }
}

/// Validates each planned graph and turns the valid ones into commit requests.
pub fn prepare_commits(validator: &Validator, planned: &[PlannedGraph]) -> CommitBatch {
    let mut batch = CommitBatch::default();

    for plan in planned {
        let decoded = decode_graph(&plan.graph_json);
        let mut errors = decoded.issues;
        let graph = match decoded.graph {
            Some(graph) => {
                errors.extend(validator.validate(&graph).errors);
                graph
            }
            None => {
                log::warn!("interface '{}' could not be decoded", plan.interface_id);
                batch.failures.push(failure(plan, errors));
                continue;
            }
        };

        if !errors.is_empty() {
            log::warn!(
                "interface '{}' failed validation with {} error(s)",
                plan.interface_id,
                errors.len()
            );
            batch.failures.push(failure(plan, errors));
            continue;
        }

        batch.requests.push(CommitRequest {
            interface_id: plan.interface_id.clone(),
            interface_name: plan.interface_name.clone(),
            payload: codec::to_payload(&graph),
            validation_passed: true,
        });
    }

    log::info!(
        "prepared {} commit(s), {} of {} interface(s) failed",
        batch.requests.len(),
        batch.failed(),
        batch.processed()
    );
    batch
}

fn failure(plan: &PlannedGraph, errors: Vec<Issue>) -> CommitFailure {
    CommitFailure {
        interface_id: plan.interface_id.clone(),
        interface_name: plan.interface_name.clone(),
        errors,
    }
}
