//! Common test utilities for building graphs and patches.
use flowpatch::prelude::*;
use serde_json::json;

/// An executor node with every required config populated.
#[allow(dead_code)]
pub fn executor(id: &str) -> Node {
    Node::new(id, "lowcode.sql_raw")
        .with_name("SQL")
        .with_config("engine", json!("doris"))
        .with_config("psm", json!("var:CLUSTER_DSN"))
        .with_config("reqBody", json!("{\"sql\": \"select 1\"}"))
        .with_config("lang", json!(""))
}

/// A string dimension whose expression equals its dataIndex.
#[allow(dead_code)]
pub fn dimension(data_index: &str, title: &str) -> Field {
    Field::new(
        AnalysisType::Dimension,
        title,
        FieldType::String,
        data_index,
        data_index,
    )
}

/// `n1` (executor with a `day` field) -> `n2` (filter).
#[allow(dead_code)]
pub fn base_graph() -> Graph {
    Graph::from_parts(
        vec![
            executor("n1").with_field(dimension("day", "Day")),
            Node::new("n2", "native.filter").with_name("Filter"),
        ],
        vec![Edge::new("n1", "n2")],
    )
    .expect("base graph has unique ids")
}

/// The raw document form of [`base_graph`].
#[allow(dead_code)]
pub const BASE_GRAPH_JSON: &str = r#"{
    "nodes": [
        {
            "id": "n1",
            "componentId": "lowcode.sql_raw",
            "componentType": 0,
            "name": "SQL",
            "type": "",
            "configs": {
                "engine": "doris",
                "psm": "var:CLUSTER_DSN",
                "reqBody": "{\"sql\": \"select 1\"}",
                "lang": ""
            },
            "fieldList": [
                {"analysisType": "dimension", "title": "Day", "type": "string", "dataIndex": "day", "expression": "day"}
            ]
        },
        {
            "id": "n2",
            "componentId": "native.filter",
            "componentType": 0,
            "name": "Filter",
            "type": "",
            "configs": {},
            "fieldList": []
        }
    ],
    "edges": [{"source": "n1", "target": "n2"}]
}"#;
