use super::document::{ConfigsPatch, FieldListPatch, FieldUpdate, NodeUpdate};
use crate::error::Issue;
use crate::model::{Field, FieldSelector, NODE_SCHEMA_KEYS, Node};
use serde_json::Value;

/// The result of applying one [`NodeUpdate`] to a node.
#[derive(Debug, Clone)]
pub(crate) struct UpdateOutcome {
    /// The updated node, or `None` if the update was rejected as a whole.
    pub node: Option<Node>,
    pub issues: Vec<Issue>,
    pub warnings: Vec<String>,
}

/// Applies `update` to a copy of `node`: shallow `set`/`unset`, then the configs
/// sub-patch, then the field list sub-patch. The input node is never touched.
pub(crate) fn apply_node_update(node: &Node, update: &NodeUpdate) -> UpdateOutcome {
    let mut outcome = UpdateOutcome {
        node: None,
        issues: Vec::new(),
        warnings: Vec::new(),
    };
    let path = format!("update_nodes[{}]", node.id);

    let mut updated = if update.set.is_empty() && update.unset.is_empty() {
        node.clone()
    } else {
        match apply_shallow(node, update, &path) {
            Ok(updated) => updated,
            Err(issue) => {
                outcome.issues.push(issue);
                return outcome;
            }
        }
    };

    if let Some(configs) = &update.configs {
        apply_configs(&mut updated, configs);
    }

    if let Some(fields) = &update.field_list {
        if let Err(issue) = apply_fields(&mut updated, fields, &path, &mut outcome.warnings) {
            outcome.issues.push(issue);
            return outcome;
        }
    }

    outcome.node = Some(updated);
    outcome
}

fn apply_shallow(node: &Node, update: &NodeUpdate, path: &str) -> Result<Node, Issue> {
    if let Some(id) = update.set.get("id") {
        if id.as_str() != Some(node.id.as_str()) {
            return Err(Issue::conflict(
                format!("{}.set.id", path),
                "node id cannot be changed",
            ));
        }
    }
    if let Some(key) = update
        .unset
        .iter()
        .find(|k| NODE_SCHEMA_KEYS.contains(&k.as_str()))
    {
        return Err(Issue::schema(
            format!("{}.unset.{}", path, key),
            "schema attribute cannot be unset",
        ));
    }

    let mut value = node.to_value();
    if let Value::Object(map) = &mut value {
        for (key, v) in &update.set {
            map.insert(key.clone(), v.clone());
        }
        for key in &update.unset {
            map.remove(key);
        }
    }

    Node::from_value(value).map_err(|e| {
        Issue::schema(
            format!("{}.set", path),
            format!("invalid node after set: {}", e),
        )
    })
}

fn apply_configs(node: &mut Node, patch: &ConfigsPatch) {
    for (key, value) in &patch.set {
        node.configs.insert(key.clone(), value.clone());
    }
    for key in &patch.unset {
        node.configs.remove(key);
    }
}

fn apply_fields(
    node: &mut Node,
    patch: &FieldListPatch,
    path: &str,
    warnings: &mut Vec<String>,
) -> Result<(), Issue> {
    for field in &patch.add {
        match FieldSelector::for_field(field)
            .and_then(|sel| sel.position(&node.field_list).map(|i| (sel, i)))
        {
            Some((selector, index)) => {
                node.field_list[index] = field.clone();
                warnings.push(format!("fieldList.add->replace {}", selector));
            }
            None => node.field_list.push(field.clone()),
        }
    }

    for selector in &patch.remove {
        match selector.position(&node.field_list) {
            Some(index) => {
                node.field_list.remove(index);
            }
            None => warnings.push(format!("fieldList.remove miss {}", selector)),
        }
    }

    for update in &patch.update {
        let Some(index) = update.selector.position(&node.field_list) else {
            warnings.push(format!("fieldList.update miss {}", update.selector));
            continue;
        };
        node.field_list[index] = merge_field(&node.field_list[index], update).map_err(|e| {
            Issue::schema(
                format!("{}.fieldList_patch.update[{}]", path, update.selector),
                format!("invalid field after update: {}", e),
            )
        })?;
    }

    Ok(())
}

fn merge_field(field: &Field, update: &FieldUpdate) -> Result<Field, serde_json::Error> {
    let mut value = field.to_value();
    if let Value::Object(map) = &mut value {
        for (key, v) in &update.set {
            map.insert(key.clone(), v.clone());
        }
    }
    Field::from_value(value)
}
