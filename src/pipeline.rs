//! End-to-end flows for a planner-supplied candidate graph.
//!
//! * **Create mode**: no stored version exists; the candidate is validated and
//!   serialized as is.
//! * **Update mode**: the candidate is diffed against the stored version and the
//!   resulting patch is applied on top of it, so the committed graph is always
//!   the product of a reviewable patch.

use crate::codec;
use crate::diff::DiffEngine;
use crate::model::Graph;
use crate::patch::{ApplyOptions, ApplyResult, PatchApplier};
use crate::validator::Validator;

pub struct Pipeline {
    applier: PatchApplier,
    engine: DiffEngine,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Validator::default())
    }
}

impl Pipeline {
    pub fn new(validator: Validator) -> Self {
        Self {
            applier: PatchApplier::new(validator),
            engine: DiffEngine::default(),
        }
    }

    pub fn with_diff_engine(mut self, engine: DiffEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn applier(&self) -> &PatchApplier {
        &self.applier
    }

    /// Validates a full candidate graph. `applied_patch` describes the candidate
    /// as additions to an empty graph.
    pub fn create(&self, candidate: &Graph, options: ApplyOptions) -> ApplyResult {
        let (errors, warnings) = if options.validate {
            let report = self.applier.validator().validate(candidate);
            (report.errors, report.warnings)
        } else {
            (Vec::new(), Vec::new())
        };

        let ok = errors.is_empty();
        let payload = (ok && !options.dry_run).then(|| codec::to_payload(candidate));
        log::debug!(
            "create: {} node(s), {} edge(s), ok={}",
            candidate.node_count(),
            candidate.edge_count(),
            ok
        );

        ApplyResult {
            ok,
            new_graph: candidate.clone(),
            payload,
            errors,
            warnings,
            applied_patch: self.engine.diff(&Graph::new(), candidate),
        }
    }

    /// Diffs `stored` against `candidate` and applies the patch to `stored`.
    pub fn update(&self, stored: &Graph, candidate: &Graph, options: ApplyOptions) -> ApplyResult {
        let patch = self.engine.diff(stored, candidate);
        log::debug!("update: {} operation(s) planned", patch.operation_count());
        self.applier.apply(stored, &patch, options)
    }

    /// Update mode when a stored version exists, create mode otherwise.
    pub fn run(&self, stored: Option<&Graph>, candidate: &Graph, options: ApplyOptions) -> ApplyResult {
        match stored {
            Some(stored) => self.update(stored, candidate, options),
            None => self.create(candidate, options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;
    use crate::model::{Edge, Node};
    use serde_json::json;

    fn executor(id: &str) -> Node {
        Node::new(id, "lowcode.sql_raw")
            .with_config("engine", json!("doris"))
            .with_config("psm", json!("psm"))
            .with_config("reqBody", json!("body"))
    }

    fn stored() -> Graph {
        Graph::from_parts(
            vec![executor("sql"), Node::new("filter", "native.filter")],
            vec![Edge::new("sql", "filter")],
        )
        .unwrap()
    }

    #[test]
    fn test_create_mode_serializes_valid_candidate() {
        let result = Pipeline::default().run(None, &stored(), ApplyOptions::commit());
        assert!(result.ok, "{:?}", result.errors);
        assert_eq!(result.payload, Some(codec::to_payload(&stored())));
        assert_eq!(result.applied_patch.add_nodes.len(), 2);
    }

    #[test]
    fn test_create_mode_rejects_cycles() {
        let candidate = Graph::from_parts(
            vec![executor("a"), Node::new("b", "x")],
            vec![Edge::new("a", "b"), Edge::new("b", "a")],
        )
        .unwrap();
        let result = Pipeline::default().create(&candidate, ApplyOptions::commit());
        assert!(!result.ok);
        assert!(result.has_kind(IssueKind::Cycle));
        assert!(result.payload.is_none());
    }

    #[test]
    fn test_update_mode_reaches_candidate() {
        let candidate = Graph::from_parts(
            vec![
                executor("sql").with_name("orders"),
                Node::new("agg", "native.aggregate"),
            ],
            vec![Edge::new("sql", "agg")],
        )
        .unwrap();
        let result = Pipeline::default().run(Some(&stored()), &candidate, ApplyOptions::commit());

        assert!(result.ok, "{:?}", result.errors);
        assert_eq!(result.new_graph, candidate);
        assert_eq!(result.payload, Some(codec::to_payload(&candidate)));
    }

    #[test]
    fn test_update_mode_with_no_changes_is_empty() {
        let result = Pipeline::default().update(&stored(), &stored(), ApplyOptions::dry_run());
        assert!(result.ok);
        assert!(result.applied_patch.is_empty());
        assert!(result.payload.is_none());
    }
}
