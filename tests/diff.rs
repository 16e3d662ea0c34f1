//! Diff/apply duality over generated graphs.
mod common;
use common::*;
use flowpatch::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

const IDS: &[&str] = &["n1", "n2", "n3", "n4", "n5", "n6"];

fn arb_field() -> impl Strategy<Value = Field> {
    (
        prop::sample::select(vec!["day", "city", "gmv", "uv", ""]),
        "[A-Z][a-z]{0,5}",
        prop::sample::select(vec![
            FieldType::String,
            FieldType::Int64,
            FieldType::Float64,
            FieldType::List,
            FieldType::Map,
        ]),
        any::<bool>(),
        prop::option::of("[a-z]{1,4}"),
    )
        .prop_map(|(data_index, title, field_type, measure, cal_type)| {
            let analysis = if measure {
                AnalysisType::Measure
            } else {
                AnalysisType::Dimension
            };
            let field = Field::new(analysis, title, field_type, data_index, data_index);
            match cal_type {
                Some(cal) => field.with_extra("calType", json!(cal)),
                None => field,
            }
        })
}

fn arb_node(id: &'static str) -> impl Strategy<Value = Node> {
    (
        prop::sample::select(vec!["lowcode.sql_raw", "native.filter", "native.join"]),
        "[a-z]{0,6}",
        prop::collection::btree_map("[a-z]{1,4}", "[a-z0-9]{0,4}", 0..4),
        prop::collection::vec(arb_field(), 0..4),
        prop::option::of(prop::collection::vec("[a-z]{1,3}", 0..3)),
    )
        .prop_map(move |(component, name, configs, fields, from_list)| {
            let mut node = Node::new(id, component).with_name(name);
            for (key, value) in configs {
                node = node.with_config(key, json!(value));
            }
            for field in fields {
                node = node.with_field(field);
            }
            match from_list {
                Some(list) => node.with_extra("fieldFromList", json!(list)),
                None => node,
            }
        })
}

/// Graphs over a subset of `IDS` whose edges only join existing nodes.
fn arb_graph() -> impl Strategy<Value = Graph> {
    let nodes: Vec<_> = IDS
        .iter()
        .map(|id| prop::option::weighted(0.7, arb_node(*id)))
        .collect();
    (nodes, prop::collection::vec((0..IDS.len(), 0..IDS.len()), 0..10)).prop_map(
        |(nodes, pairs)| {
            let nodes: Vec<Node> = nodes.into_iter().flatten().collect();
            let edges: Vec<Edge> = if nodes.is_empty() {
                Vec::new()
            } else {
                pairs
                    .into_iter()
                    .map(|(s, t)| {
                        Edge::new(
                            nodes[s % nodes.len()].id.clone(),
                            nodes[t % nodes.len()].id.clone(),
                        )
                    })
                    .collect()
            };
            Graph::from_parts(nodes, edges).expect("ids are unique")
        },
    )
}

fn unvalidated() -> ApplyOptions {
    ApplyOptions::dry_run().with_validation(false)
}

proptest! {
    #[test]
    fn prop_apply_of_diff_reaches_target(old in arb_graph(), new in arb_graph()) {
        let patch = diff(&old, &new);
        let result = PatchApplier::default().apply(&old, &patch, unvalidated());

        prop_assert!(result.errors.is_empty(), "{:?}", result.errors);
        prop_assert_eq!(to_payload(&result.new_graph), to_payload(&new));
    }

    #[test]
    fn prop_coarse_diff_reaches_target(old in arb_graph(), new in arb_graph()) {
        let patch = DiffEngine::coarse().diff(&old, &new);
        let result = PatchApplier::default().apply(&old, &patch, unvalidated());

        prop_assert!(result.errors.is_empty(), "{:?}", result.errors);
        prop_assert_eq!(&result.new_graph, &new);
    }

    #[test]
    fn prop_reapplying_a_diff_changes_nothing(old in arb_graph(), new in arb_graph()) {
        let patch = diff(&old, &new);
        let applier = PatchApplier::default();

        let first = applier.apply(&old, &patch, unvalidated());
        let second = applier.apply(&first.new_graph, &patch, unvalidated());

        prop_assert_eq!(&second.new_graph, &first.new_graph);
    }

    #[test]
    fn prop_diff_of_identical_graphs_is_empty(graph in arb_graph()) {
        prop_assert!(diff(&graph, &graph).is_empty());
    }
}

#[test]
fn test_diff_survives_json_round_trip() {
    let old = base_graph();
    let new = Graph::from_parts(
        vec![
            executor("n1")
                .with_name("SQL-orders")
                .with_field(dimension("day", "Business day"))
                .with_field(dimension("city", "City")),
            Node::new("n3", "native.aggregate"),
        ],
        vec![Edge::new("n1", "n3")],
    )
    .unwrap();

    let patch = diff(&old, &new);
    let wire = serde_json::to_string(&patch).unwrap();
    let decoded = Patch::from_json(&wire).unwrap();
    assert_eq!(decoded, patch);

    let result = PatchApplier::default().apply(&old, &decoded, ApplyOptions::commit());
    assert!(result.ok, "{:?}", result.errors);
    assert_eq!(result.new_graph, new);
    assert_eq!(result.payload, Some(to_payload(&new)));
}
