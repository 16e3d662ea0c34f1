use crate::error::GraphError;
use crate::model::{Edge, Field, FieldSelector, Node};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A structured bundle of optional operations against a graph.
///
/// Absent or empty lists are no-ops; unknown keys in the JSON form are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patch {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub add_nodes: Vec<Node>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub remove_nodes: Vec<NodeRef>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub update_nodes: Vec<NodeUpdate>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub add_edges: Vec<Edge>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub remove_edges: Vec<Edge>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, GraphError> {
        serde_json::from_value(value).map_err(|e| GraphError::InvalidPatch(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        serde_json::from_str(json).map_err(|e| GraphError::InvalidPatch(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.add_nodes.is_empty()
            && self.remove_nodes.is_empty()
            && self.update_nodes.is_empty()
            && self.add_edges.is_empty()
            && self.remove_edges.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.add_nodes.len()
            + self.remove_nodes.len()
            + self.update_nodes.len()
            + self.add_edges.len()
            + self.remove_edges.len()
    }

    pub fn add_node(mut self, node: Node) -> Self {
        self.add_nodes.push(node);
        self
    }

    pub fn remove_node(mut self, id: impl Into<String>) -> Self {
        self.remove_nodes.push(NodeRef { id: id.into() });
        self
    }

    pub fn update_node(mut self, update: NodeUpdate) -> Self {
        self.update_nodes.push(update);
        self
    }

    pub fn add_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.add_edges.push(Edge::new(source, target));
        self
    }

    pub fn remove_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.remove_edges.push(Edge::new(source, target));
        self
    }
}

/// A reference to a node by id, as used by `remove_nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: String,
}

/// Changes to one existing node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    pub id: String,
    /// Shallow overwrite of top-level node attributes.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Map::is_empty"
    )]
    pub set: Map<String, Value>,
    /// Top-level attributes to drop; only attributes outside the typed schema qualify.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unset: Vec<String>,
    #[serde(
        default,
        rename = "configs_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub configs: Option<ConfigsPatch>,
    #[serde(
        default,
        rename = "fieldList_patch",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_list: Option<FieldListPatch>,
}

impl NodeUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set.insert(key.into(), value);
        self
    }

    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.unset.push(key.into());
        self
    }

    pub fn set_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.configs
            .get_or_insert_with(ConfigsPatch::default)
            .set
            .insert(key.into(), value);
        self
    }

    pub fn unset_config(mut self, key: impl Into<String>) -> Self {
        self.configs
            .get_or_insert_with(ConfigsPatch::default)
            .unset
            .push(key.into());
        self
    }

    pub fn add_field(mut self, field: Field) -> Self {
        self.field_list
            .get_or_insert_with(FieldListPatch::default)
            .add
            .push(field);
        self
    }

    pub fn remove_field(mut self, selector: FieldSelector) -> Self {
        self.field_list
            .get_or_insert_with(FieldListPatch::default)
            .remove
            .push(selector);
        self
    }

    pub fn update_field(mut self, selector: FieldSelector, set: Map<String, Value>) -> Self {
        self.field_list
            .get_or_insert_with(FieldListPatch::default)
            .update
            .push(FieldUpdate {
                selector,
                set,
            });
        self
    }

    pub fn is_noop(&self) -> bool {
        self.set.is_empty()
            && self.unset.is_empty()
            && self.configs.as_ref().is_none_or(ConfigsPatch::is_empty)
            && self.field_list.as_ref().is_none_or(FieldListPatch::is_empty)
    }
}

/// Key-level changes to a node's `configs`: `set` runs before `unset`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigsPatch {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub set: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub unset: Vec<String>,
}

impl ConfigsPatch {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

/// Changes to a node's `fieldList`, applied as add, then remove, then update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldListPatch {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<Field>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<FieldSelector>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<FieldUpdate>,
}

impl FieldListPatch {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.update.is_empty()
    }
}

/// Shallow-merges `set` into the field the selector resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(rename = "where")]
    pub selector: FieldSelector,
    #[serde(default, deserialize_with = "null_as_default")]
    pub set: Map<String, Value>,
}

/// Reads an explicit `null` as the empty value, like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
