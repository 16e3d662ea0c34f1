use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// The attribute under which planners attach a stable alternate key to a field.
pub const STABLE_KEY_ATTR: &str = "__key__";

/// A closed string enumeration used at the document boundary.
pub trait ClosedTag: Copy + Sized + 'static {
    /// Every member of the enumeration.
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(raw: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == raw)
    }
}

/// Storage types a field may declare. No other values are permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int64,
    Float64,
    List,
    Map,
}

impl ClosedTag for FieldType {
    const ALL: &'static [Self] = &[
        FieldType::String,
        FieldType::Int64,
        FieldType::Float64,
        FieldType::List,
        FieldType::Map,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::List => "list",
            FieldType::Map => "map",
        }
    }
}

impl FieldType {
    /// Maps a loosely named planner type onto the closed enumeration.
    ///
    /// Dates and times travel as strings; unrecognised names fall back to `string`.
    pub fn from_loose(data_type: &str) -> Self {
        match data_type.trim().to_lowercase().as_str() {
            "number" | "float" | "double" | "decimal" | "real" | "float64" => FieldType::Float64,
            "int" | "integer" | "long" | "bigint" | "int64" => FieldType::Int64,
            "array" | "list" | "vector" => FieldType::List,
            "object" | "json" | "map" | "dict" => FieldType::Map,
            _ => FieldType::String,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field is aggregated or grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Measure,
    Dimension,
}

impl ClosedTag for AnalysisType {
    const ALL: &'static [Self] = &[AnalysisType::Measure, AnalysisType::Dimension];

    fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Measure => "measure",
            AnalysisType::Dimension => "dimension",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed enum value as it arrived at the boundary.
///
/// Known members decode to `Valid`; anything else is kept verbatim in `Invalid`
/// so the validator can report it with its path instead of failing the whole decode.
/// `Invalid(Value::Null)` stands for an absent attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Checked<T> {
    Valid(T),
    Invalid(Value),
}

impl<T: ClosedTag> Checked<T> {
    pub fn valid(&self) -> Option<T> {
        match self {
            Checked::Valid(v) => Some(*v),
            Checked::Invalid(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Checked::Invalid(Value::Null))
    }

    /// The JSON form, or `None` when the attribute was absent.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Checked::Valid(v) => Some(Value::String(v.as_str().to_string())),
            Checked::Invalid(Value::Null) => None,
            Checked::Invalid(raw) => Some(raw.clone()),
        }
    }

    pub(crate) fn from_value(raw: Value) -> Self {
        match raw.as_str().and_then(T::parse) {
            Some(v) => Checked::Valid(v),
            None => Checked::Invalid(raw),
        }
    }
}

impl<T> Default for Checked<T> {
    fn default() -> Self {
        Checked::Invalid(Value::Null)
    }
}

impl<T> From<T> for Checked<T> {
    fn from(value: T) -> Self {
        Checked::Valid(value)
    }
}

impl<'de, T: ClosedTag> Deserialize<'de> for Checked<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Checked::from_value)
    }
}

impl<T: ClosedTag> fmt::Display for Checked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checked::Valid(v) => f.write_str(v.as_str()),
            Checked::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

/// A named, typed data attribute on a node.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Field {
    #[serde(default, rename = "analysisType")]
    pub analysis_type: Checked<AnalysisType>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub field_type: Checked<FieldType>,
    #[serde(default, rename = "dataIndex")]
    pub data_index: String,
    #[serde(default)]
    pub expression: String,
    /// Attributes outside the typed schema, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    pub fn new(
        analysis_type: AnalysisType,
        title: impl Into<String>,
        field_type: FieldType,
        data_index: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            analysis_type: Checked::Valid(analysis_type),
            title: title.into(),
            field_type: Checked::Valid(field_type),
            data_index: data_index.into(),
            expression: expression.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// The planner-assigned stable key, if any.
    pub fn stable_key(&self) -> Option<&str> {
        self.extra.get(STABLE_KEY_ATTR).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        if let Some(v) = self.analysis_type.to_value() {
            map.insert("analysisType".to_string(), v);
        }
        map.insert("title".to_string(), Value::String(self.title.clone()));
        if let Some(v) = self.field_type.to_value() {
            map.insert("type".to_string(), v);
        }
        map.insert("dataIndex".to_string(), Value::String(self.data_index.clone()));
        map.insert("expression".to_string(), Value::String(self.expression.clone()));
        Value::Object(map)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// How a patch addresses one field inside a node's field list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSelector {
    DataIndex(String),
    StableKey(String),
    /// A selector carrying neither key; it never matches.
    Empty,
}

impl FieldSelector {
    /// Position of the first field the selector matches.
    pub fn position(&self, fields: &[Field]) -> Option<usize> {
        fields.iter().position(|f| self.matches(f))
    }

    pub fn matches(&self, field: &Field) -> bool {
        match self {
            FieldSelector::DataIndex(key) => !key.is_empty() && field.data_index == *key,
            FieldSelector::StableKey(key) => field.stable_key() == Some(key.as_str()),
            FieldSelector::Empty => false,
        }
    }

    /// The selector a field is replaced by when it is re-added.
    pub fn for_field(field: &Field) -> Option<Self> {
        if !field.data_index.is_empty() {
            Some(FieldSelector::DataIndex(field.data_index.clone()))
        } else {
            field
                .stable_key()
                .map(|k| FieldSelector::StableKey(k.to_string()))
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::DataIndex(k) => write!(f, "dataIndex={}", k),
            FieldSelector::StableKey(k) => write!(f, "{}={}", STABLE_KEY_ATTR, k),
            FieldSelector::Empty => f.write_str("{}"),
        }
    }
}

// Wire form `{"dataIndex": ..}` or `{"__key__": ..}`; `dataIndex` wins when both are set.
// Blank selectors decode to `Empty`, which matches no field.
impl Serialize for FieldSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::new();
        match self {
            FieldSelector::DataIndex(k) => map.insert("dataIndex".to_string(), k.clone().into()),
            FieldSelector::StableKey(k) => map.insert(STABLE_KEY_ATTR.to_string(), k.clone().into()),
            FieldSelector::Empty => None,
        };
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawSelector {
            #[serde(rename = "dataIndex")]
            data_index: Option<String>,
            #[serde(rename = "__key__")]
            stable_key: Option<String>,
        }

        let raw = RawSelector::deserialize(deserializer)?;
        match (raw.data_index, raw.stable_key) {
            (Some(k), _) if !k.is_empty() => Ok(FieldSelector::DataIndex(k)),
            (_, Some(k)) if !k.is_empty() => Ok(FieldSelector::StableKey(k)),
            _ => Ok(FieldSelector::Empty),
        }
    }
}

/// The top-level node attributes the typed schema owns.
pub const NODE_SCHEMA_KEYS: &[&str] = &[
    "id",
    "componentId",
    "componentType",
    "name",
    "type",
    "configs",
    "fieldList",
];

/// A processing unit in the graph.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, rename = "componentId")]
    pub component_id: String,
    #[serde(default, rename = "componentType")]
    pub component_type: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub configs: Map<String, Value>,
    #[serde(default, rename = "fieldList")]
    pub field_list: Vec<Field>,
    /// Attributes outside the typed schema (e.g. `fieldFromList`), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_id: component_id.into(),
            ..Default::default()
        }
    }

    pub fn with_component_type(mut self, component_type: i64) -> Self {
        self.component_type = component_type;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.configs.insert(key.into(), value);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.field_list.push(field);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn field(&self, selector: &FieldSelector) -> Option<&Field> {
        selector.position(&self.field_list).map(|i| &self.field_list[i])
    }

    pub fn field_by_data_index(&self, data_index: &str) -> Option<&Field> {
        self.field(&FieldSelector::DataIndex(data_index.to_string()))
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert(
            "componentId".to_string(),
            Value::String(self.component_id.clone()),
        );
        map.insert("componentType".to_string(), Value::from(self.component_type));
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("type".to_string(), Value::String(self.node_type.clone()));
        map.insert("configs".to_string(), Value::Object(self.configs.clone()));
        map.insert(
            "fieldList".to_string(),
            Value::Array(self.field_list.iter().map(Field::to_value).collect()),
        );
        Value::Object(map)
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A directed dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// The path used when reporting a problem with this edge.
    pub fn path(&self) -> String {
        format!("edges[{}->{}]", self.source, self.target)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}
