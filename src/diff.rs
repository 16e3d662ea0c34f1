//! Minimal patches between two graph versions.
//!
//! For every pair of graphs whose edges reference existing nodes,
//! `apply(old, diff(old, new)).new_graph == new` holds.

use crate::model::{Field, FieldSelector, Graph, NODE_SCHEMA_KEYS, Node};
use crate::patch::{FieldListPatch, FieldUpdate, NodeRef, NodeUpdate, Patch, apply_node_update};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde_json::{Map, Value};

/// Computes patches that transform one graph into another.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine {
    fine_grained: bool,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self { fine_grained: true }
    }
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that always emits whole-node replacement updates.
    pub fn coarse() -> Self {
        Self {
            fine_grained: false,
        }
    }

    pub fn diff(&self, old: &Graph, new: &Graph) -> Patch {
        let mut patch = Patch::new();

        for node in new.nodes_sorted() {
            match old.node(&node.id) {
                None => patch.add_nodes.push(node.clone()),
                Some(previous) if previous != node => {
                    patch.update_nodes.push(self.node_update(previous, node));
                }
                Some(_) => {}
            }
        }
        patch.remove_nodes = old
            .nodes_sorted()
            .into_iter()
            .filter(|n| !new.contains_node(&n.id))
            .map(|n| NodeRef { id: n.id.clone() })
            .collect();

        patch.add_edges = new
            .edges_sorted()
            .into_iter()
            .filter(|e| !old.contains_edge(e))
            .cloned()
            .collect();
        patch.remove_edges = old
            .edges_sorted()
            .into_iter()
            .filter(|e| !new.contains_edge(e))
            .cloned()
            .collect();

        log::debug!(
            "diff: +{} -{} ~{} nodes, +{} -{} edges",
            patch.add_nodes.len(),
            patch.remove_nodes.len(),
            patch.update_nodes.len(),
            patch.add_edges.len(),
            patch.remove_edges.len()
        );
        patch
    }

    fn node_update(&self, old: &Node, new: &Node) -> NodeUpdate {
        if self.fine_grained {
            let update = fine_update(old, new);
            if apply_node_update(old, &update).node.as_ref() == Some(new) {
                return update;
            }
        }
        coarse_update(old, new)
    }
}

/// Shorthand for `DiffEngine::default().diff(old, new)`.
pub fn diff(old: &Graph, new: &Graph) -> Patch {
    DiffEngine::default().diff(old, new)
}

/// Every top-level attribute of `new` as a shallow `set`, plus `unset` for the
/// extra attributes only `old` has. Always exact.
fn coarse_update(old: &Node, new: &Node) -> NodeUpdate {
    let mut update = NodeUpdate::new(new.id.clone());
    if let Value::Object(map) = new.to_value() {
        update.set = map.into_iter().filter(|(k, _)| k != "id").collect();
    }
    update.unset = removed_extras(old, new);
    update
}

fn fine_update(old: &Node, new: &Node) -> NodeUpdate {
    let mut update = NodeUpdate::new(new.id.clone());

    let (Value::Object(old_map), Value::Object(new_map)) = (old.to_value(), new.to_value()) else {
        return update;
    };
    for (key, value) in new_map {
        if key == "id" || key == "configs" || key == "fieldList" {
            continue;
        }
        if old_map.get(&key) != Some(&value) {
            update.set.insert(key, value);
        }
    }
    update.unset = removed_extras(old, new);

    for (key, value) in &new.configs {
        if old.configs.get(key) != Some(value) {
            update = update.set_config(key.clone(), value.clone());
        }
    }
    for key in old.configs.keys() {
        if !new.configs.contains_key(key) {
            update = update.unset_config(key.clone());
        }
    }

    if old.field_list != new.field_list {
        match field_list_patch(&old.field_list, &new.field_list) {
            Some(fields) => update.field_list = Some(fields),
            None => {
                let fields = new.field_list.iter().map(Field::to_value).collect();
                update.set.insert("fieldList".to_string(), Value::Array(fields));
            }
        }
    }

    update
}

fn removed_extras(old: &Node, new: &Node) -> Vec<String> {
    old.extra
        .keys()
        .filter(|k| !new.extra.contains_key(*k) && !NODE_SCHEMA_KEYS.contains(&k.as_str()))
        .cloned()
        .collect()
}

/// A per-field sub-patch, when the new list is the old one with fields removed,
/// fields changed in place and new fields appended. `None` for anything else
/// (reordering, blank or duplicated `dataIndex`), which the caller replaces wholesale.
fn field_list_patch(old: &[Field], new: &[Field]) -> Option<FieldListPatch> {
    if !keys_usable(old) || !keys_usable(new) {
        return None;
    }

    let new_by_key: AHashMap<&str, &Field> = new.iter().map(|f| (f.data_index.as_str(), f)).collect();
    let old_keys: AHashSet<&str> = old.iter().map(|f| f.data_index.as_str()).collect();

    let kept_in_old_order = old
        .iter()
        .filter(|f| new_by_key.contains_key(f.data_index.as_str()))
        .map(|f| f.data_index.as_str());
    let kept_count = new
        .iter()
        .take_while(|f| old_keys.contains(f.data_index.as_str()))
        .count();
    // Kept fields must lead the new list, in their old relative order.
    if !kept_in_old_order.eq(new[..kept_count].iter().map(|f| f.data_index.as_str())) {
        return None;
    }
    if new[kept_count..]
        .iter()
        .any(|f| old_keys.contains(f.data_index.as_str()))
    {
        return None;
    }

    let mut patch = FieldListPatch {
        add: new[kept_count..].to_vec(),
        ..FieldListPatch::default()
    };
    for field in old {
        match new_by_key.get(field.data_index.as_str()) {
            None => patch
                .remove
                .push(FieldSelector::DataIndex(field.data_index.clone())),
            Some(next) if *next != field => {
                let (Value::Object(before), Value::Object(after)) = (field.to_value(), next.to_value())
                else {
                    return None;
                };
                let set: Map<String, Value> = after
                    .into_iter()
                    .filter(|(k, v)| before.get(k) != Some(v))
                    .collect();
                patch.update.push(FieldUpdate {
                    selector: FieldSelector::DataIndex(field.data_index.clone()),
                    set,
                });
            }
            Some(_) => {}
        }
    }
    Some(patch)
}

fn keys_usable(fields: &[Field]) -> bool {
    fields.iter().all(|f| !f.data_index.is_empty()) && fields.iter().map(|f| &f.data_index).all_unique()
}
