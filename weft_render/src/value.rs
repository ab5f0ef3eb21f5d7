//! Render-time value model
//!
//! Values are what variable paths resolve against: scalars, arrays, and
//! string-keyed maps. Maps iterate in key order so renders are
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_compiler::ir::ScalarLit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Truthiness as conditionals see it: absence, zero, and emptiness are
    /// false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
        }
    }

    /// How a value prints in rendered output. Composites render empty
    /// rather than faulting; interpolating them is a template smell, not a
    /// render error.
    pub fn render_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            Value::Str(s) => s.clone(),
            Value::Array(_) | Value::Map(_) => String::new(),
        }
    }

    /// Member lookup (`.name` or `['name']`)
    pub fn get_member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(name),
            _ => None,
        }
    }

    /// Numeric index lookup (`[0]`)
    pub fn get_index(&self, index: i64) -> Option<&Value> {
        match self {
            Value::Array(items) => usize::try_from(index).ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Numeric view for comparisons, when the value is numeric
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<&ScalarLit> for Value {
    fn from(lit: &ScalarLit) -> Self {
        match lit {
            ScalarLit::Str(s) => Value::Str(s.clone()),
            ScalarLit::Int(i) => Value::Int(*i),
            ScalarLit::Float(x) => Value::Float(*x),
            ScalarLit::Bool(b) => Value::Bool(*b),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Str("x".into()).is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn test_render_strings() {
        assert_eq!(Value::Null.render_string(), "");
        assert_eq!(Value::Int(42).render_string(), "42");
        assert_eq!(Value::Str("hi".into()).render_string(), "hi");
        assert_eq!(Value::Bool(true).render_string(), "true");
        assert_eq!(Value::Array(vec![Value::Int(1)]).render_string(), "");
    }

    #[test]
    fn test_lookups() {
        let map = Value::Map(BTreeMap::from([(
            "name".to_string(),
            Value::Str("Ada".into()),
        )]));
        assert_eq!(map.get_member("name"), Some(&Value::Str("Ada".into())));
        assert_eq!(map.get_member("missing"), None);
        assert_eq!(map.get_index(0), None);

        let array = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(array.get_index(1), Some(&Value::Int(2)));
        assert_eq!(array.get_index(9), None);
        assert_eq!(array.get_member("x"), None);
    }

    #[test]
    fn test_json_conversion() {
        let json: serde_json::Value = serde_json::json!({
            "users": [{"name": "Ada"}, {"name": "Brin"}],
            "count": 2,
            "ratio": 0.5,
            "active": true,
            "missing": null
        });

        let value = Value::from(json);
        assert_eq!(
            value
                .get_member("users")
                .and_then(|users| users.get_index(0))
                .and_then(|user| user.get_member("name")),
            Some(&Value::Str("Ada".into()))
        );
        assert_eq!(value.get_member("count"), Some(&Value::Int(2)));
        assert_eq!(value.get_member("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(value.get_member("missing"), Some(&Value::Null));
    }
}
