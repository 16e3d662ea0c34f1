//! Canonical JSON encoding of the committed `{nodes, edges}` payload.
//!
//! Canonical form: nodes ordered by id, edges ordered by `(source, target)`,
//! object keys sorted at every depth, no insignificant whitespace. Two graphs
//! are equal up to canonical form iff their payload strings are equal.

use crate::error::GraphError;
use crate::model::{Graph, GraphDocument, Node};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The canonical JSON value of a graph.
pub fn to_canonical_value(graph: &Graph) -> Value {
    let nodes = graph.nodes_sorted().into_iter().map(Node::to_value).collect();
    let edges = graph
        .edges_sorted()
        .into_iter()
        .map(|e| {
            let mut edge = Map::new();
            edge.insert("source".to_string(), Value::String(e.source.clone()));
            edge.insert("target".to_string(), Value::String(e.target.clone()));
            Value::Object(edge)
        })
        .collect();

    let mut doc = Map::new();
    doc.insert("nodes".to_string(), Value::Array(nodes));
    doc.insert("edges".to_string(), Value::Array(edges));
    canonicalize(Value::Object(doc))
}

/// Encodes a graph as its canonical payload string. Total: never fails.
pub fn to_payload(graph: &Graph) -> String {
    to_canonical_value(graph).to_string()
}

/// Pretty-printed canonical form, for humans.
pub fn to_pretty_payload(graph: &Graph) -> String {
    format!("{:#}", to_canonical_value(graph))
}

/// The canonical string of a single node, used for content comparison.
pub fn canonical_node(node: &Node) -> String {
    canonicalize(node.to_value()).to_string()
}

/// Decodes a payload string back into a graph.
pub fn from_payload(payload: &str) -> Result<Graph, GraphError> {
    Graph::from_json(payload)
}

/// Recursively rebuilds objects with their keys in sorted order, independent of
/// how `serde_json::Map` is configured in the final build.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(k, v)| (k, canonicalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl Serialize for Graph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_canonical_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Graph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = GraphDocument::deserialize(deserializer)?;
        Graph::try_from(doc).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisType, Edge, Field, FieldType};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Graph {
        Graph::from_parts(
            vec![
                Node::new("z", "native.filter"),
                Node::new("a", "lowcode.sql_raw")
                    .with_config("psm", json!("p"))
                    .with_config("engine", json!("doris"))
                    .with_field(Field::new(
                        AnalysisType::Measure,
                        "Gmv",
                        FieldType::Float64,
                        "gmv",
                        "sum(gmv)",
                    )),
            ],
            vec![Edge::new("a", "z")],
        )
        .unwrap()
    }

    #[test]
    fn test_payload_is_ordered() {
        let payload = to_payload(&sample());
        assert!(payload.starts_with(r#"{"edges":[{"source":"a","target":"z"}],"nodes":[{"componentId":"lowcode.sql_raw""#));
        assert!(payload.find(r#""id":"a""#) < payload.find(r#""id":"z""#));
        assert!(payload.find(r#""engine""#) < payload.find(r#""psm""#));
    }

    #[test]
    fn test_payload_decodes_to_same_graph() {
        let graph = sample();
        assert_eq!(from_payload(&to_payload(&graph)).unwrap(), graph);
    }

    #[test]
    fn test_canonicalize_sorts_nested_keys() {
        let value = canonicalize(json!({"b": {"y": 1, "x": [{"d": 1, "c": 2}]}, "a": null}));
        assert_eq!(value.to_string(), r#"{"a":null,"b":{"x":[{"c":2,"d":1}],"y":1}}"#);
    }

    #[test]
    fn test_graph_serde_uses_canonical_form() {
        let graph = sample();
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value, to_canonical_value(&graph));
        let back: Graph = serde_json::from_value(value).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_graph_deserialize_rejects_duplicate_ids() {
        let result: Result<Graph, _> = serde_json::from_value(json!({
            "nodes": [{"id": "a"}, {"id": "a"}],
            "edges": [],
        }));
        assert!(result.is_err());
    }
}
