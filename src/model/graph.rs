use super::node::{Edge, Node};
use crate::error::{GraphError, Issue};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;
use std::sync::Arc;

/// A typed workflow graph: nodes keyed by id, edges keyed by `(source, target)`.
///
/// Nodes are held behind `Arc` so cloning a graph shares every node with the
/// original; a patch only copies the nodes it actually touches. The public API is
/// read-only, all mutation goes through [`crate::patch::PatchApplier`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: AHashMap<String, Arc<Node>>,
    edges: AHashSet<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from typed parts. Duplicate edges collapse silently,
    /// duplicate node ids are rejected.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        edges: impl IntoIterator<Item = Edge>,
    ) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        let mut issues = Vec::new();
        for node in nodes {
            if graph.contains_node(&node.id) {
                issues.push(duplicate_id_issue(&node.id));
                continue;
            }
            graph.insert_node(node);
        }
        for edge in edges {
            graph.insert_edge(edge);
        }
        if issues.is_empty() {
            Ok(graph)
        } else {
            Err(GraphError::Invalid(issues))
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Nodes in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Arc::as_ref)
    }

    /// Nodes ordered by id, for deterministic reports and serialization.
    pub fn nodes_sorted(&self) -> Vec<&Node> {
        self.nodes().sorted_by(|a, b| a.id.cmp(&b.id)).collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Edges ordered by `(source, target)`.
    pub fn edges_sorted(&self) -> Vec<&Edge> {
        self.edges.iter().sorted().collect()
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges.contains(&Edge::new(source, target))
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// True if `other` holds the very same node allocation for `id`.
    pub fn shares_node(&self, other: &Graph, id: &str) -> bool {
        match (self.nodes.get(id), other.nodes.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// A topological order of the node ids, or `None` if the edges form a cycle.
    ///
    /// Kahn's algorithm: retire zero in-degree nodes until none are left; a cycle
    /// exists iff fewer nodes were retired than the graph holds. Edges with an
    /// endpoint outside the node set are ignored here, they are reported as
    /// dangling by the validator. Runs in O(V + E).
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::with_capacity(self.nodes.len());
        let mut in_degree: AHashMap<&str, usize> = AHashMap::with_capacity(self.nodes.len());
        for id in self.nodes.keys() {
            adjacency.insert(id.as_str(), Vec::new());
            in_degree.insert(id.as_str(), 0);
        }

        for edge in &self.edges {
            let (source, target) = (edge.source.as_str(), edge.target.as_str());
            if !self.contains_node(source) || !self.contains_node(target) {
                continue;
            }
            if let Some(next) = adjacency.get_mut(source) {
                next.push(target);
            }
            if let Some(degree) = in_degree.get_mut(target) {
                *degree += 1;
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &neighbor in adjacency.get(current).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        (order.len() == self.nodes.len()).then_some(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }

    // --- crate-internal mutation, used by the copy-on-write draft ---

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    pub(crate) fn remove_node(&mut self, id: &str) -> Option<Arc<Node>> {
        self.nodes.remove(id)
    }

    /// Returns `false` if the edge was already present.
    pub(crate) fn insert_edge(&mut self, edge: Edge) -> bool {
        self.edges.insert(edge)
    }

    pub(crate) fn remove_edge(&mut self, edge: &Edge) -> bool {
        self.edges.remove(edge)
    }

    /// Drops every edge touching `node_id`, returning how many were removed.
    pub(crate) fn remove_edges_touching(&mut self, node_id: &str) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(node_id));
        before - self.edges.len()
    }
}

/// The issue reported for every extra copy of a node id, typed or raw.
pub(crate) fn duplicate_id_issue(id: &str) -> Issue {
    Issue::structural(format!("nodes[{}]", id), "duplicated node id")
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.edges.len() == other.edges.len()
            && self
                .nodes
                .iter()
                .all(|(id, node)| other.nodes.get(id).is_some_and(|o| o == node))
            && self.edges.iter().all(|e| other.edges.contains(e))
    }
}
