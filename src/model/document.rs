use super::graph::{Graph, duplicate_id_issue};
use super::node::{Edge, Node};
use crate::error::{GraphError, Issue};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DUPLICATE_EDGES_WARNING: &str = "duplicate edges found";

/// The on-the-wire and at-rest shape of a graph: `{nodes: Node[], edges: Edge[]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<&Graph> for GraphDocument {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes_sorted().into_iter().cloned().collect(),
            edges: graph.edges_sorted().into_iter().cloned().collect(),
        }
    }
}

impl TryFrom<GraphDocument> for Graph {
    type Error = GraphError;

    fn try_from(doc: GraphDocument) -> Result<Self, Self::Error> {
        Graph::from_parts(doc.nodes, doc.edges)
    }
}

/// The outcome of decoding a raw graph document.
///
/// Decoding is lenient: entries that fail to decode are reported and skipped so
/// the remaining graph can still be validated in the same pass.
#[derive(Debug, Clone, Default)]
pub struct DecodedGraph {
    /// `None` only when the top-level shape is unusable.
    pub graph: Option<Graph>,
    pub issues: Vec<Issue>,
    pub warnings: Vec<String>,
}

impl DecodedGraph {
    pub fn is_clean(&self) -> bool {
        self.graph.is_some() && self.issues.is_empty()
    }

    pub fn into_result(self) -> Result<Graph, GraphError> {
        match self.graph {
            Some(graph) if self.issues.is_empty() => Ok(graph),
            _ => Err(GraphError::Invalid(self.issues)),
        }
    }
}

/// Decodes a raw JSON value into a [`Graph`], collecting every structural issue.
pub fn decode_graph(value: &Value) -> DecodedGraph {
    let mut decoded = DecodedGraph::default();

    let (Some(raw_nodes), Some(raw_edges)) = (
        value.get("nodes").and_then(Value::as_array),
        value.get("edges").and_then(Value::as_array),
    ) else {
        decoded
            .issues
            .push(Issue::structural("", "nodes/edges must be arrays"));
        return decoded;
    };

    let mut graph = Graph::new();

    for (i, raw) in raw_nodes.iter().enumerate() {
        let path = match raw.get("id").and_then(Value::as_str) {
            Some(id) => format!("nodes[{}]", id),
            None => format!("nodes[{}]", i),
        };
        match Node::deserialize(raw) {
            Ok(node) if node.id.is_empty() => {
                decoded.issues.push(Issue::structural(path, "node id is empty"));
            }
            Ok(node) if graph.contains_node(&node.id) => {
                decoded.issues.push(duplicate_id_issue(&node.id));
            }
            Ok(node) => graph.insert_node(node),
            Err(e) => decoded
                .issues
                .push(Issue::structural(path, format!("invalid node: {}", e))),
        }
    }

    let mut seen: AHashSet<Edge> = AHashSet::with_capacity(raw_edges.len());
    let mut duplicated = false;
    for (i, raw) in raw_edges.iter().enumerate() {
        match Edge::deserialize(raw) {
            Ok(edge) => {
                if !seen.insert(edge.clone()) {
                    duplicated = true;
                }
                graph.insert_edge(edge);
            }
            Err(e) => decoded.issues.push(Issue::structural(
                format!("edges[{}]", i),
                format!("invalid edge: {}", e),
            )),
        }
    }
    if duplicated {
        decoded.warnings.push(DUPLICATE_EDGES_WARNING.to_string());
    }

    decoded.graph = Some(graph);
    decoded
}

impl Graph {
    /// Decodes a graph document, failing with every issue found.
    pub fn from_value(value: &Value) -> Result<Self, GraphError> {
        decode_graph(value).into_result()
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| GraphError::JsonParseError(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn to_document(&self) -> GraphDocument {
        GraphDocument::from(self)
    }
}
