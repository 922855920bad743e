//! Sort directives

use super::error::ConfigurationError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ConfigurationError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

/// Placement of null values relative to the rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Nulls {
    First,
    Last,
}

impl FromStr for Nulls {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" | "nullsfirst" => Ok(Self::First),
            "last" | "nullslast" => Ok(Self::Last),
            _ => Err(ConfigurationError::MalformedSort(format!(
                "unknown nulls placement '{s}'"
            ))),
        }
    }
}

/// One ordering key; earlier directives take precedence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortDirective {
    pub field: String,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nulls: Option<Nulls>,
}

impl SortDirective {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
            nulls: None,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
            nulls: None,
        }
    }

    pub fn with_nulls(mut self, nulls: Nulls) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// Parse `{"field": .., "direction": "asc"|"desc", "nulls"?: "first"|"last"}`.
    ///
    /// `direction` defaults to ascending when absent.
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        let obj = value.as_object().ok_or_else(|| {
            ConfigurationError::MalformedSort(format!("expected a mapping, got {value}"))
        })?;

        if let Some(key) = obj
            .keys()
            .find(|k| !matches!(k.as_str(), "field" | "direction" | "nulls"))
        {
            return Err(ConfigurationError::MalformedSort(format!(
                "unexpected key '{key}'"
            )));
        }

        let field = obj.get("field").and_then(Value::as_str).ok_or_else(|| {
            ConfigurationError::MalformedSort("directive requires a string 'field'".into())
        })?;

        let direction = match obj.get("direction") {
            None => Direction::Asc,
            Some(Value::String(s)) => s.parse()?,
            Some(other) => return Err(ConfigurationError::UnknownDirection(other.to_string())),
        };

        let nulls = match obj.get("nulls") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.parse()?),
            Some(other) => {
                return Err(ConfigurationError::MalformedSort(format!(
                    "unknown nulls placement {other}"
                )))
            }
        };

        Ok(Self {
            field: field.to_string(),
            direction,
            nulls,
        })
    }

    /// Parse an ordered list of directives.
    pub fn list_from_json(value: &Value) -> Result<Vec<Self>, ConfigurationError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items.iter().map(Self::from_json).collect(),
            other => Err(ConfigurationError::MalformedSort(format!(
                "expected a sequence of directives, got {other}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for SortDirective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
