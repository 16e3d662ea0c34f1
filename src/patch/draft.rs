use super::document::{NodeRef, NodeUpdate};
use super::node_update::apply_node_update;
use crate::error::Issue;
use crate::model::{Edge, Graph, Node};

/// A working copy of a base graph plus the issues found while editing it.
///
/// The draft starts as a shallow clone of the base (every node shared), so the
/// base is never mutated and only nodes that really change get copied.
pub(crate) struct GraphDraft {
    graph: Graph,
    pub(crate) issues: Vec<Issue>,
    pub(crate) warnings: Vec<String>,
}

impl GraphDraft {
    pub(crate) fn from_base(base: &Graph) -> Self {
        Self {
            graph: base.clone(),
            issues: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn graph(&self) -> &Graph {
        &self.graph
    }

    pub(crate) fn remove_edges(&mut self, edges: &[Edge]) {
        for edge in edges {
            if !self.graph.remove_edge(edge) {
                self.warnings
                    .push(format!("remove_edges: edge {} not found", edge));
            }
        }
    }

    /// Removes nodes and every edge still referencing them.
    pub(crate) fn remove_nodes(&mut self, nodes: &[NodeRef]) {
        for node in nodes {
            if node.id.is_empty() {
                self.issues
                    .push(Issue::structural("remove_nodes", "node id is empty"));
                continue;
            }
            if self.graph.remove_node(&node.id).is_none() {
                self.issues.push(Issue::conflict(
                    format!("remove_nodes[{}]", node.id),
                    "node not found",
                ));
                continue;
            }
            let dropped = self.graph.remove_edges_touching(&node.id);
            log::debug!(
                "removed node '{}' and {} dependent edge(s)",
                node.id,
                dropped
            );
        }
    }

    /// Inserts new nodes. Re-adding an identical node is a no-op with a warning;
    /// an id collision with different content is a conflict and never overwrites.
    pub(crate) fn add_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            if node.id.is_empty() {
                self.issues
                    .push(Issue::structural("add_nodes", "node id is empty"));
                continue;
            }
            match self.graph.node(&node.id) {
                Some(existing) if existing == node => {
                    self.warnings.push(format!(
                        "add_nodes: node {} already exists (identical)",
                        node.id
                    ));
                }
                Some(_) => self.issues.push(Issue::conflict(
                    format!("nodes[{}]", node.id),
                    "id conflict with different content",
                )),
                None => self.graph.insert_node(node.clone()),
            }
        }
    }

    /// Inserts edges whose endpoints both exist at this point; duplicates collapse.
    pub(crate) fn add_edges(&mut self, edges: &[Edge]) {
        for edge in edges {
            if !self.graph.contains_node(&edge.source) || !self.graph.contains_node(&edge.target)
            {
                self.issues
                    .push(Issue::referential_add(edge.path(), "dangling edge"));
                continue;
            }
            self.graph.insert_edge(edge.clone());
        }
    }

    pub(crate) fn update_nodes(&mut self, updates: &[NodeUpdate]) {
        for update in updates {
            let Some(current) = self.graph.node(&update.id) else {
                self.issues.push(Issue::conflict(
                    format!("update_nodes[{}]", update.id),
                    "node not found",
                ));
                continue;
            };

            let outcome = apply_node_update(current, update);
            self.issues.extend(outcome.issues);
            self.warnings.extend(outcome.warnings);

            // Unchanged nodes stay shared with the base graph.
            if let Some(node) = outcome.node {
                if Some(&node) != self.graph.node(&update.id) {
                    self.graph.insert_node(node);
                }
            }
        }
    }

    pub(crate) fn finish(self) -> (Graph, Vec<Issue>, Vec<String>) {
        (self.graph, self.issues, self.warnings)
    }
}
