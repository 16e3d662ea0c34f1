use crate::error::GraphError;
use crate::model::FieldType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_EXECUTOR_COMPONENT: &str = "lowcode.sql_raw";
pub const DEFAULT_JOIN_COMPONENT: &str = "native.join";

/// Domain-specific schema rules injected into the [`super::Validator`].
///
/// The defaults describe the SQL-executor / native-join component family; other
/// graph schemas supply their own policy, e.g. loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaPolicy {
    /// Component id of the node kind that must be present and fully configured.
    pub executor_component_id: String,
    /// Config keys every executor node must carry with a non-blank value.
    pub executor_required_configs: Vec<String>,
    /// Component id of multi-input join nodes.
    pub join_component_id: String,
    /// Keys every join relation descriptor must carry with a non-blank value.
    pub join_relation_keys: Vec<String>,
    /// Field storage types accepted by this schema.
    pub allowed_field_types: Vec<FieldType>,
}

impl Default for SchemaPolicy {
    fn default() -> Self {
        Self {
            executor_component_id: DEFAULT_EXECUTOR_COMPONENT.to_string(),
            executor_required_configs: vec!["engine".into(), "psm".into(), "reqBody".into()],
            join_component_id: DEFAULT_JOIN_COMPONENT.to_string(),
            join_relation_keys: vec![
                "left".into(),
                "right".into(),
                "method".into(),
                "fields".into(),
            ],
            allowed_field_types: vec![
                FieldType::String,
                FieldType::Int64,
                FieldType::Float64,
                FieldType::List,
                FieldType::Map,
            ],
        }
    }
}

impl SchemaPolicy {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let policy: SchemaPolicy =
            serde_json::from_str(json).map_err(|e| GraphError::InvalidPolicy(e.to_string()))?;
        if policy.executor_component_id.is_empty() {
            return Err(GraphError::InvalidPolicy(
                "executor_component_id must not be empty".to_string(),
            ));
        }
        Ok(policy)
    }

    pub fn with_executor(
        mut self,
        component_id: impl Into<String>,
        required_configs: &[&str],
    ) -> Self {
        self.executor_component_id = component_id.into();
        self.executor_required_configs = required_configs.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_join(mut self, component_id: impl Into<String>, relation_keys: &[&str]) -> Self {
        self.join_component_id = component_id.into();
        self.join_relation_keys = relation_keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_allowed_field_types(mut self, types: &[FieldType]) -> Self {
        self.allowed_field_types = types.to_vec();
        self
    }

    pub fn allows(&self, field_type: FieldType) -> bool {
        self.allowed_field_types.contains(&field_type)
    }
}

/// JSON truthiness: null, `false`, `0`, `""`, `[]` and `{}` count as not populated.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}
