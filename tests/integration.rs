//! Integration tests for flowpatch
//!
//! End-to-end flows: planner candidate in, canonical payload out.
//!
mod common;
use common::*;
use flowpatch::commit::{CommitBatch, PlannedGraph};
use flowpatch::prelude::*;
use serde_json::json;
use std::cell::RefCell;

/// Keeps committed payloads in memory, keyed by graph id.
#[derive(Default)]
struct RecordingStore {
    committed: RefCell<Vec<(String, String)>>,
}

impl GraphStore for RecordingStore {
    fn commit(&self, graph_id: &str, payload: &str) -> std::result::Result<String, StoreError> {
        self.committed
            .borrow_mut()
            .push((graph_id.to_string(), payload.to_string()));
        Ok(graph_id.to_string())
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_create_then_update_cycle() {
        let pipeline = Pipeline::default();
        let store = RecordingStore::default();

        let created = pipeline.run(None, &base_graph(), ApplyOptions::commit());
        assert!(created.ok, "{:?}", created.errors);
        store
            .commit("orders", created.payload.as_deref().unwrap())
            .unwrap();

        // The next planner run renames the executor and adds an aggregate.
        let stored = flowpatch::codec::from_payload(&store.committed.borrow()[0].1).unwrap();
        let candidate = Graph::from_parts(
            vec![
                executor("n1").with_name("SQL-orders").with_field(dimension("day", "Day")),
                Node::new("n2", "native.filter").with_name("Filter"),
                Node::new("n3", "native.aggregate"),
            ],
            vec![Edge::new("n1", "n2"), Edge::new("n2", "n3")],
        )
        .unwrap();
        let updated = pipeline.run(Some(&stored), &candidate, ApplyOptions::commit());

        assert!(updated.ok, "{:?}", updated.errors);
        assert_eq!(updated.new_graph, candidate);
        assert_eq!(updated.applied_patch.update_nodes.len(), 1);
        assert_eq!(updated.applied_patch.add_nodes.len(), 1);
        assert_eq!(updated.applied_patch.add_edges, vec![Edge::new("n2", "n3")]);
    }

    #[test]
    fn test_update_mode_rejects_invalid_candidate() {
        let candidate = Graph::from_parts(
            vec![executor("n1").with_config("psm", json!("")), Node::new("n2", "native.filter")],
            vec![Edge::new("n1", "n2"), Edge::new("n2", "n1")],
        )
        .unwrap();
        let result = Pipeline::default().update(&base_graph(), &candidate, ApplyOptions::commit());

        assert!(!result.ok);
        assert!(result.has_kind(IssueKind::Cycle));
        assert!(result.has_kind(IssueKind::Schema));
        assert!(result.payload.is_none());
        assert_eq!(result.new_graph, candidate);
    }

    #[test]
    fn test_batch_preparation_and_submission() {
        let base: serde_json::Value = serde_json::from_str(BASE_GRAPH_JSON).unwrap();
        let planned = vec![
            PlannedGraph::new("101", "orders", base.clone()),
            PlannedGraph::new("102", "refunds", json!({"nodes": [], "edges": []})),
            PlannedGraph::new("103", "users", base),
        ];

        let batch: CommitBatch = prepare_commits(&Validator::default(), &planned);
        assert_eq!(batch.processed(), 3);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.failures[0].interface_name, "refunds");

        let store = RecordingStore::default();
        let ids: Vec<String> = batch
            .send_all(&store)
            .into_iter()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(ids, vec!["101".to_string(), "103".to_string()]);
        assert_eq!(store.committed.borrow()[0].1, to_payload(&base_graph()));
    }

    #[test]
    fn test_payload_is_stable_across_input_order() {
        let shuffled = json!({
            "edges": [{"target": "n2", "source": "n1"}],
            "nodes": [
                {"name": "Filter", "id": "n2", "componentId": "native.filter", "componentType": 0, "type": "", "configs": {}, "fieldList": []},
                serde_json::from_str::<serde_json::Value>(BASE_GRAPH_JSON).unwrap()["nodes"][0].clone()
            ]
        });
        let graph = Graph::from_value(&shuffled).unwrap();
        assert_eq!(to_payload(&graph), to_payload(&base_graph()));
    }

    #[test]
    fn test_unknown_attributes_survive_patching() {
        let raw = json!({
            "nodes": [{
                "id": "n1",
                "componentId": "lowcode.sql_raw",
                "configs": {"engine": "doris", "psm": "p", "reqBody": "b"},
                "fieldList": [{
                    "analysisType": "dimension", "title": "Day", "type": "string",
                    "dataIndex": "day", "expression": "day", "calType": "normal", "__key__": "k-day"
                }],
                "fieldFromList": ["orders"]
            }],
            "edges": []
        });
        let graph = Graph::from_value(&raw).unwrap();
        let patch = Patch::new().update_node(NodeUpdate::new("n1").set("name", json!("SQL")));
        let result = PatchApplier::default().apply(&graph, &patch, ApplyOptions::commit());

        assert!(result.ok, "{:?}", result.errors);
        let payload: serde_json::Value = serde_json::from_str(&result.payload.unwrap()).unwrap();
        let node = &payload["nodes"][0];
        assert_eq!(node["fieldFromList"], json!(["orders"]));
        assert_eq!(node["fieldList"][0]["calType"], json!("normal"));
        assert_eq!(node["fieldList"][0]["__key__"], json!("k-day"));
    }

    #[test]
    fn test_stable_key_selector_updates_field() {
        let graph = Graph::from_parts(
            vec![executor("n1").with_field(dimension("day", "Day").with_extra("__key__", json!("k1")))],
            vec![],
        )
        .unwrap();
        let patch = Patch::from_value(json!({
            "update_nodes": [{
                "id": "n1",
                "fieldList_patch": {"update": [{"where": {"__key__": "k1"}, "set": {"title": "Date"}}]}
            }]
        }))
        .unwrap();

        let result = PatchApplier::default().apply(&graph, &patch, ApplyOptions::dry_run());
        assert!(result.ok, "{:?}", result.errors);
        assert_eq!(result.new_graph.node("n1").unwrap().field_list[0].title, "Date");
    }
}
