use super::document::Patch;
use super::draft::GraphDraft;
use crate::codec;
use crate::error::{Issue, IssueKind};
use crate::model::Graph;
use crate::validator::Validator;
use serde::{Deserialize, Serialize};

/// Switches for a single apply call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Simulate only: the resulting graph is returned but no payload is produced.
    pub dry_run: bool,
    /// Run the validator on the resulting graph.
    pub validate: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            validate: true,
        }
    }
}

impl ApplyOptions {
    /// Options for a real commit: validate, then serialize.
    pub fn commit() -> Self {
        Self {
            dry_run: false,
            validate: true,
        }
    }

    pub fn dry_run() -> Self {
        Self::default()
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// The outcome of [`PatchApplier::apply`].
#[derive(Debug, Clone, Serialize)]
pub struct ApplyResult {
    pub ok: bool,
    /// The simulated result, returned even when `ok` is false.
    #[serde(rename = "newGraph")]
    pub new_graph: Graph,
    /// The canonical commit payload, only for a successful non-dry run.
    pub payload: Option<String>,
    pub errors: Vec<Issue>,
    pub warnings: Vec<String>,
    /// The non-empty operation lists of the submitted patch.
    #[serde(rename = "appliedDiff")]
    pub applied_patch: Patch,
}

impl ApplyResult {
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

/// Applies patches to graphs in a fixed, dependency-respecting order.
pub struct PatchApplier {
    validator: Validator,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new(Validator::default())
    }
}

impl PatchApplier {
    pub fn new(validator: Validator) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Applies `patch` on top of `base` without touching `base`.
    ///
    /// Order: remove edges, remove nodes (cascading to their edges), add nodes,
    /// add edges, update nodes, then validate and serialize. Later steps rely on
    /// the earlier ones for referential integrity. Every problem is collected;
    /// nothing aborts the run.
    pub fn apply(&self, base: &Graph, patch: &Patch, options: ApplyOptions) -> ApplyResult {
        let mut draft = GraphDraft::from_base(base);

        draft.remove_edges(&patch.remove_edges);
        draft.remove_nodes(&patch.remove_nodes);
        draft.add_nodes(&patch.add_nodes);
        draft.add_edges(&patch.add_edges);
        draft.update_nodes(&patch.update_nodes);
        // Edges are stored as a set keyed by (source, target), so the graph is
        // already deduplicated at this point.
        log::debug!(
            "applied {} operation(s): {} node(s), {} edge(s), {} issue(s)",
            patch.operation_count(),
            draft.graph().node_count(),
            draft.graph().edge_count(),
            draft.issues.len()
        );

        let (new_graph, mut errors, mut warnings) = draft.finish();

        if options.validate {
            let report = self.validator.validate(&new_graph);
            errors.extend(report.errors);
            warnings.extend(report.warnings);
        }

        let ok = errors.is_empty();
        let payload = (ok && !options.dry_run).then(|| codec::to_payload(&new_graph));
        if !ok {
            log::debug!("patch rejected with {} error(s)", errors.len());
        }

        ApplyResult {
            ok,
            new_graph,
            payload,
            errors,
            warnings,
            applied_patch: patch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};
    use crate::patch::NodeUpdate;
    use serde_json::json;

    fn executor(id: &str) -> Node {
        Node::new(id, "lowcode.sql_raw")
            .with_config("engine", json!("doris"))
            .with_config("psm", json!("psm"))
            .with_config("reqBody", json!("body"))
    }

    fn base() -> Graph {
        Graph::from_parts(
            vec![executor("a"), Node::new("b", "native.filter")],
            vec![Edge::new("a", "b")],
        )
        .unwrap()
    }

    #[test]
    fn test_dry_run_never_produces_payload() {
        let result = PatchApplier::default().apply(&base(), &Patch::new(), ApplyOptions::dry_run());
        assert!(result.ok);
        assert!(result.payload.is_none());
    }

    #[test]
    fn test_commit_produces_payload() {
        let result = PatchApplier::default().apply(&base(), &Patch::new(), ApplyOptions::commit());
        assert!(result.ok);
        assert_eq!(result.payload, Some(codec::to_payload(&base())));
    }

    #[test]
    fn test_remove_node_cascades_to_edges() {
        let patch = Patch::new().remove_node("b");
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::commit());
        assert!(result.ok, "{:?}", result.errors);
        assert_eq!(result.new_graph.edge_count(), 0);
    }

    #[test]
    fn test_removed_then_readded_edge_in_one_patch() {
        let patch = Patch::new().remove_edge("a", "b").add_edge("a", "b");
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::commit());
        assert!(result.new_graph.has_edge("a", "b"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_edge_to_node_added_in_same_patch() {
        let patch = Patch::new()
            .add_node(Node::new("c", "native.filter"))
            .add_edge("b", "c");
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::commit());
        assert!(result.ok, "{:?}", result.errors);
        assert!(result.new_graph.has_edge("b", "c"));
    }

    #[test]
    fn test_edge_to_node_removed_in_same_patch_is_dangling() {
        let patch = Patch::new().remove_node("b").add_edge("a", "b");
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::commit());
        assert!(!result.ok);
        assert!(result.has_kind(IssueKind::ReferentialAdd));
        assert!(result.payload.is_none());
    }

    #[test]
    fn test_validation_can_be_skipped() {
        let patch = Patch::new().remove_node("a");
        let result = PatchApplier::default().apply(
            &base(),
            &patch,
            ApplyOptions::commit().with_validation(false),
        );
        assert!(result.ok);
        assert!(result.payload.is_some());

        let validated = PatchApplier::default().apply(&base(), &patch, ApplyOptions::commit());
        assert!(!validated.ok);
    }

    #[test]
    fn test_base_graph_is_never_mutated() {
        let base = base();
        let snapshot = base.clone();
        let patch = Patch::new()
            .remove_edge("a", "b")
            .update_node(NodeUpdate::new("a").set("name", json!("renamed")));
        let result = PatchApplier::default().apply(&base, &patch, ApplyOptions::dry_run());

        assert_eq!(base, snapshot);
        assert_eq!(result.new_graph.node("a").unwrap().name, "renamed");
        assert!(result.new_graph.shares_node(&base, "b"));
        assert!(!result.new_graph.shares_node(&base, "a"));
    }

    #[test]
    fn test_missing_targets_are_conflicts() {
        let patch = Patch::new()
            .remove_node("ghost")
            .update_node(NodeUpdate::new("phantom").set("name", json!("x")));
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::dry_run());
        let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["remove_nodes[ghost]", "update_nodes[phantom]"]);
        assert!(result.errors.iter().all(|e| e.kind == IssueKind::Conflict));
    }

    #[test]
    fn test_stale_edge_removal_is_a_warning() {
        let patch = Patch::new().remove_edge("b", "a");
        let result = PatchApplier::default().apply(&base(), &patch, ApplyOptions::dry_run());
        assert!(result.ok);
        assert_eq!(result.warnings, vec!["remove_edges: edge b->a not found".to_string()]);
    }
}
