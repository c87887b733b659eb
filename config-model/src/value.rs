use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A configuration value: a scalar, an ordered list, or a string-keyed map.
///
/// The enum is closed, so anything a caller can hand to `set` is storable;
/// there is no runtime "unsupported value" case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value. Numbers outside the i64 range become floats;
    /// non-finite floats have no JSON form and degrade to `Null`.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Integer(n) => serde_json::Value::Number((*n).into()),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        value.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let value = ConfigValue::from_json(serde_json::json!({
            "host": "localhost",
            "port": 5432,
            "replicas": [1, 2, 3],
            "tls": true,
            "ratio": 0.5,
            "comment": null,
        }));
        assert_eq!(
            value.to_json(),
            serde_json::json!({
                "host": "localhost",
                "port": 5432,
                "replicas": [1, 2, 3],
                "tls": true,
                "ratio": 0.5,
                "comment": null,
            })
        );
    }

    #[test]
    fn test_untagged_serde() {
        let raw = "{\"a\":1,\"b\":[true,\"x\"]}";
        let value: ConfigValue = serde_json::from_str(raw).unwrap();
        match &value {
            ConfigValue::Map(fields) => {
                assert_eq!(fields["a"], ConfigValue::Integer(1));
                assert_eq!(
                    fields["b"],
                    ConfigValue::List(vec![
                        ConfigValue::Bool(true),
                        ConfigValue::String("x".to_string())
                    ])
                );
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_null_serializes_as_null() {
        assert_eq!(serde_json::to_string(&ConfigValue::Null).unwrap(), "null");
        let value: ConfigValue = serde_json::from_str("null").unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ConfigValue::from(true).as_bool(), Some(true));
        assert_eq!(ConfigValue::from(7_i64).as_i64(), Some(7));
        assert_eq!(ConfigValue::from("UTC").as_str(), Some("UTC"));
        assert_eq!(ConfigValue::from("UTC").as_bool(), None);
    }
}
