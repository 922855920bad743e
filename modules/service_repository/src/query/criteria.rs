//! Declarative criteria tree
//!
//! Criteria arrive as JSON mappings:
//!
//! ```json
//! {"field": "title", "op": "ilike", "value": "song title 1%"}
//! {"or": [{"field": "title", "op": "eq", "value": "a"}, {"field": "title", "op": "eq", "value": "b"}]}
//! ```
//!
//! and are parsed into a [`FilterNode`] sum type. Operator/value shape
//! mismatches are rejected at parse time; field names are checked later by
//! the backend compiler against its field registry.

use super::error::ConfigurationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A single comparable value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Convert a JSON value; `null`, arrays and objects are not scalars.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Operand of a leaf comparison
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// No operand (`is_null`)
    None,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

macro_rules! impl_filter_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for FilterValue {
                fn from(values: Vec<$ty>) -> Self {
                    Self::List(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_filter_value_from!(bool, i32, i64, f64, &str, String);

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::List(values)
    }
}

impl FilterValue {
    fn to_json(&self) -> Option<Value> {
        match self {
            Self::None => None,
            Self::Scalar(s) => Some(s.to_json()),
            Self::List(items) => Some(Value::Array(items.iter().map(Scalar::to_json).collect())),
        }
    }
}

/// Value shape an operator requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Scalar,
    Text,
    Sequence,
    Ignored,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "a scalar value",
            Self::Text => "a text pattern",
            Self::Sequence => "a sequence of scalar values",
            Self::Ignored => "no value",
        })
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Case-sensitive LIKE pattern (`%` any run, `_` one character)
    Like,
    /// Case-insensitive LIKE pattern
    ILike,
    In,
    NotIn,
    IsNull,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Like => "like",
            Self::ILike => "ilike",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::IsNull => "is_null",
        }
    }

    pub fn shape(self) -> ValueShape {
        match self {
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte => ValueShape::Scalar,
            Self::Like | Self::ILike => ValueShape::Text,
            Self::In | Self::NotIn => ValueShape::Sequence,
            Self::IsNull => ValueShape::Ignored,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" | "==" => Self::Eq,
            "ne" | "!=" => Self::Ne,
            "lt" | "<" => Self::Lt,
            "lte" | "le" | "<=" => Self::Lte,
            "gt" | ">" => Self::Gt,
            "gte" | "ge" | ">=" => Self::Gte,
            "like" => Self::Like,
            "ilike" => Self::ILike,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "is_null" => Self::IsNull,
            other => return Err(ConfigurationError::UnknownOperator(other.to_string())),
        })
    }
}

/// Leaf predicate: `field <op> value`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    field: String,
    op: Operator,
    value: FilterValue,
}

impl FieldFilter {
    /// Build a leaf, checking the value against the operator's shape.
    pub fn new(
        field: impl Into<String>,
        op: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self, ConfigurationError> {
        let field = field.into();
        let value = value.into();

        let value = match (op.shape(), value) {
            (ValueShape::Ignored, _) => FilterValue::None,
            (ValueShape::Scalar, v @ FilterValue::Scalar(_)) => v,
            (ValueShape::Text, v @ FilterValue::Scalar(Scalar::Text(_))) => v,
            (ValueShape::Sequence, v @ FilterValue::List(_)) => v,
            (expected, _) => {
                return Err(ConfigurationError::ValueShape {
                    field,
                    op,
                    expected,
                })
            }
        };

        Ok(Self { field, op, value })
    }

    /// Leaf for operators that take no value
    pub fn unary(field: impl Into<String>, op: Operator) -> Result<Self, ConfigurationError> {
        Self::new(field, op, FilterValue::None)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    fn from_json(obj: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        if let Some(key) = obj
            .keys()
            .find(|k| !matches!(k.as_str(), "field" | "op" | "value"))
        {
            return Err(ConfigurationError::MalformedCriteria(format!(
                "unexpected key '{key}' in filter"
            )));
        }

        let field = obj
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConfigurationError::MalformedCriteria("filter requires a string 'field'".into())
            })?;
        let op: Operator = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConfigurationError::MalformedCriteria(format!(
                    "filter on '{field}' requires a string 'op'"
                ))
            })?
            .parse()?;

        let shape_error = || ConfigurationError::ValueShape {
            field: field.to_string(),
            op,
            expected: op.shape(),
        };

        let value = match (op.shape(), obj.get("value")) {
            (ValueShape::Ignored, _) => FilterValue::None,
            (ValueShape::Sequence, Some(Value::Array(items))) => FilterValue::List(
                items
                    .iter()
                    .map(Scalar::from_json)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(shape_error)?,
            ),
            (ValueShape::Sequence, _) => return Err(shape_error()),
            (_, Some(v)) => FilterValue::Scalar(Scalar::from_json(v).ok_or_else(shape_error)?),
            (_, None) => return Err(shape_error()),
        };

        Self::new(field, op, value)
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("field".into(), Value::String(self.field.clone()));
        obj.insert("op".into(), Value::String(self.op.as_str().into()));
        if let Some(value) = self.value.to_json() {
            obj.insert("value".into(), value);
        }
        Value::Object(obj)
    }
}

/// Boolean predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(FieldFilter),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
}

impl FilterNode {
    pub fn leaf(
        field: impl Into<String>,
        op: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<Self, ConfigurationError> {
        FieldFilter::new(field, op, value).map(Self::Leaf)
    }

    /// Equality leaf, the common "get by key" lookup
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Self::Leaf(FieldFilter {
            field: field.into(),
            op: Operator::Eq,
            value: FilterValue::Scalar(value.into()),
        })
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::Leaf(FieldFilter {
            field: field.into(),
            op: Operator::IsNull,
            value: FilterValue::None,
        })
    }

    pub fn and(children: Vec<FilterNode>) -> Result<Self, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::EmptyComposite("and"));
        }
        Ok(Self::And(children))
    }

    pub fn or(children: Vec<FilterNode>) -> Result<Self, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::EmptyComposite("or"));
        }
        Ok(Self::Or(children))
    }

    /// Parse the declarative mapping form.
    ///
    /// A top-level array is read as an implicit `and` of its elements.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Array(items) => Self::and(Self::parse_children(items)?),
            Value::Object(obj) if obj.len() == 1 => {
                match obj.iter().next() {
                    Some((key, Value::Array(items))) if key == "and" => {
                        Self::and(Self::parse_children(items)?)
                    }
                    Some((key, Value::Array(items))) if key == "or" => {
                        Self::or(Self::parse_children(items)?)
                    }
                    Some((key, _)) if key == "and" || key == "or" => {
                        Err(ConfigurationError::MalformedCriteria(format!(
                            "'{key}' must hold a sequence of criteria"
                        )))
                    }
                    _ => FieldFilter::from_json(obj).map(Self::Leaf),
                }
            }
            Value::Object(obj) => FieldFilter::from_json(obj).map(Self::Leaf),
            other => Err(ConfigurationError::MalformedCriteria(format!(
                "expected a mapping or sequence, got {other}"
            ))),
        }
    }

    fn parse_children(items: &[Value]) -> Result<Vec<Self>, ConfigurationError> {
        items.iter().map(Self::from_json).collect()
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Leaf(leaf) => leaf.to_json(),
            Self::And(children) => {
                serde_json::json!({ "and": children.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
            Self::Or(children) => {
                serde_json::json!({ "or": children.iter().map(Self::to_json).collect::<Vec<_>>() })
            }
        }
    }
}

impl TryFrom<&Value> for FilterNode {
    type Error = ConfigurationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl TryFrom<Value> for FilterNode {
    type Error = ConfigurationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for FilterNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FilterNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
