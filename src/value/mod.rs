//! Tagged context values and dotted-path resolution.
//!
//! `Value` is what every expression, helper and block operates on. Lookups
//! return `Option<&Value>`; `None` is the "undefined" outcome of a path that
//! does not exist, which is distinct from an explicit `Value::Null`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A context value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Truthiness used by `{{#if}}` and rule conditions.
    ///
    /// Null, `false`, `0`, NaN, `""`, `[]` and `{}` are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Look up a single property: a map key, or an index into an array
    pub fn get(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Resolve a dotted path (`a.b.c`) by successive property lookups.
    ///
    /// Returns `None` when any segment is missing or an intermediate value
    /// cannot be indexed.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Numeric coercion for arithmetic and ordering helpers
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form used when a value is spliced into markup.
    ///
    /// Null renders as the empty string; arrays and maps use their JSON form.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Map(_) => serde_json::Value::from(self.clone()).to_string(),
        }
    }
}

/// Integral numbers print without a fractional part
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Map(BTreeMap::new()).is_truthy());
        assert!(!Value::Bool(false).is_truthy());

        assert!(Value::from("a").is_truthy());
        assert!(Value::Number(-1.5).is_truthy());
        assert!(Value::from(json!([0])).is_truthy());
        assert!(Value::from(json!({"k": null})).is_truthy());
    }

    #[test]
    fn test_get_path_nested() {
        let value = Value::from(json!({
            "company": {"name": "Acme", "owners": [{"name": "Ada"}, {"name": "Bo"}]}
        }));

        assert_eq!(value.get_path("company.name"), Some(&Value::from("Acme")));
        assert_eq!(
            value.get_path("company.owners.1.name"),
            Some(&Value::from("Bo"))
        );
    }

    #[test]
    fn test_get_path_missing_is_undefined() {
        let value = Value::from(json!({"company": {"name": "Acme"}}));

        assert_eq!(value.get_path("company.revenue"), None);
        assert_eq!(value.get_path("company.name.length"), None);
        assert_eq!(value.get_path("nothing.here"), None);
        assert_eq!(value.get_path(""), None);
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(Value::Number(3.0).render(), "3");
        assert_eq!(Value::Number(2.5).render(), "2.5");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::from(json!([1, 2])).render(), "[1,2]");
    }

    #[test]
    fn test_json_roundtrip_keeps_integers() {
        let original = json!({"count": 3, "ratio": 0.25, "tags": ["a"]});
        let back: serde_json::Value = Value::from(original.clone()).into();
        assert_eq!(back, original);
    }
}
