use super::policy::{SchemaPolicy, is_blank};
use super::ValidationReport;
use crate::error::Issue;
use crate::model::{Graph, Node};
use ahash::AHashSet;
use serde_json::Value;

/// One independent invariant check.
///
/// Rules never short-circuit each other: the validator runs all of them and
/// merges their findings into a single report.
pub trait GraphRule: Send + Sync {
    fn name(&self) -> &str;
    fn check(&self, graph: &Graph, policy: &SchemaPolicy, report: &mut ValidationReport);
}

/// Every edge endpoint must name an existing node.
pub struct ReferenceRule;

impl GraphRule for ReferenceRule {
    fn name(&self) -> &str {
        "references"
    }

    fn check(&self, graph: &Graph, _policy: &SchemaPolicy, report: &mut ValidationReport) {
        for edge in graph.edges_sorted() {
            if !graph.contains_node(&edge.source) || !graph.contains_node(&edge.target) {
                report.error(Issue::reference(edge.path(), "dangling edge"));
            }
        }
    }
}

/// The edge relation must be a DAG.
pub struct AcyclicRule;

impl GraphRule for AcyclicRule {
    fn name(&self) -> &str {
        "acyclic"
    }

    fn check(&self, graph: &Graph, _policy: &SchemaPolicy, report: &mut ValidationReport) {
        if !graph.is_acyclic() {
            report.error(Issue::cycle("edges", "cycle detected"));
        }
    }
}

/// At least one executor node exists and each one is fully configured.
pub struct ExecutorRule;

impl GraphRule for ExecutorRule {
    fn name(&self) -> &str {
        "executor"
    }

    fn check(&self, graph: &Graph, policy: &SchemaPolicy, report: &mut ValidationReport) {
        let executors: Vec<&Node> = graph
            .nodes_sorted()
            .into_iter()
            .filter(|n| n.component_id == policy.executor_component_id)
            .collect();

        if executors.is_empty() {
            report.error(Issue::schema(
                "nodes",
                format!("no executor node ({}) found", policy.executor_component_id),
            ));
        }

        for node in executors {
            for key in &policy.executor_required_configs {
                if is_blank(node.configs.get(key)) {
                    report.error(Issue::schema(
                        format!("nodes[{}].configs.{}", node.id, key),
                        "required field missing",
                    ));
                }
            }
        }
    }
}

/// Field enums, required attributes and `dataIndex` uniqueness.
pub struct FieldSchemaRule;

impl GraphRule for FieldSchemaRule {
    fn name(&self) -> &str {
        "field-schema"
    }

    fn check(&self, graph: &Graph, policy: &SchemaPolicy, report: &mut ValidationReport) {
        for node in graph.nodes_sorted() {
            let mut seen: AHashSet<&str> = AHashSet::new();
            for field in &node.field_list {
                let label = if field.data_index.is_empty() {
                    "unknown"
                } else {
                    field.data_index.as_str()
                };
                let path = format!("nodes[{}].fieldList[{}]", node.id, label);

                if field.analysis_type.valid().is_none() {
                    report.error(Issue::schema(
                        format!("{}.analysisType", path),
                        "invalid analysisType",
                    ));
                }

                match field.field_type.valid() {
                    None => {
                        report.error(Issue::schema(format!("{}.type", path), "invalid field type"))
                    }
                    Some(t) if !policy.allows(t) => report.error(Issue::schema(
                        format!("{}.type", path),
                        format!("field type {} not allowed", t),
                    )),
                    Some(_) => {}
                }

                for (attr, value) in [
                    ("dataIndex", &field.data_index),
                    ("expression", &field.expression),
                    ("title", &field.title),
                ] {
                    if value.is_empty() {
                        report.error(Issue::schema(
                            format!("{}.{}", path, attr),
                            "required field missing",
                        ));
                    }
                }

                if !field.data_index.is_empty() && !seen.insert(field.data_index.as_str()) {
                    report.error(Issue::schema(
                        format!("{}.dataIndex", path),
                        "duplicated dataIndex",
                    ));
                }
            }
        }
    }
}

/// Join nodes, when present, must carry fully populated relation descriptors.
pub struct JoinRule;

impl GraphRule for JoinRule {
    fn name(&self) -> &str {
        "join"
    }

    fn check(&self, graph: &Graph, policy: &SchemaPolicy, report: &mut ValidationReport) {
        for node in graph
            .nodes_sorted()
            .into_iter()
            .filter(|n| n.component_id == policy.join_component_id)
        {
            let relations_path = format!("nodes[{}].configs.relations", node.id);
            let relations = match node.configs.get("relations") {
                Some(Value::Array(relations)) if !relations.is_empty() => relations,
                _ => {
                    report.error(Issue::schema(relations_path, "required field missing"));
                    continue;
                }
            };

            for (i, relation) in relations.iter().enumerate() {
                let relation_path = format!("{}[{}]", relations_path, i);
                let Some(relation) = relation.as_object() else {
                    report.error(Issue::schema(relation_path, "relation must be an object"));
                    continue;
                };
                for key in &policy.join_relation_keys {
                    if is_blank(relation.get(key)) {
                        report.error(Issue::schema(
                            format!("{}.{}", relation_path, key),
                            "required field missing",
                        ));
                    }
                }
            }
        }
    }
}

pub(super) fn default_rules() -> Vec<Box<dyn GraphRule>> {
    vec![
        Box::new(ReferenceRule),
        Box::new(AcyclicRule),
        Box::new(ExecutorRule),
        Box::new(FieldSchemaRule),
        Box::new(JoinRule),
    ]
}
