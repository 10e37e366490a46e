//! Declared configuration and persisted state lookups
//!
//! Paths use dot notation with numeric list indices (`network_interface.0.alias_ip_range`)
//! and `#` for the length of a list (`network_interface.#`).

use serde_json::Value;

/// Read access to a resource's declared configuration and its prior state
pub trait ResourceData {
    /// Value at `path` if it is set to something other than its zero value
    fn get_ok(&self, path: &str) -> Option<Value>;

    /// Whether the value at `path` differs between prior state and configuration
    fn has_change(&self, path: &str) -> bool;
}

/// `ResourceData` backed by JSON documents
#[derive(Debug, Clone, Default)]
pub struct JsonResourceData {
    config: Value,
    state: Option<Value>,
}

impl JsonResourceData {
    /// Configuration for a resource that does not exist yet
    pub fn new(config: Value) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Configuration planned against previously persisted state
    pub fn with_state(config: Value, state: Value) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub fn config(&self) -> &Value {
        &self.config
    }
}

impl ResourceData for JsonResourceData {
    fn get_ok(&self, path: &str) -> Option<Value> {
        lookup(&self.config, path).filter(|v| !is_zero(v))
    }

    fn has_change(&self, path: &str) -> bool {
        let new = lookup(&self.config, path).filter(|v| !is_zero(v));
        let old = self
            .state
            .as_ref()
            .and_then(|s| lookup(s, path))
            .filter(|v| !is_zero(v));
        new != old
    }
}

/// Resolve a dot path against a JSON document
pub fn lookup(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;

    for part in path.split('.') {
        if part == "#" {
            return Some(Value::from(current.as_array().map(Vec::len).unwrap_or(0)));
        }
        current = match part.parse::<usize>() {
            Ok(idx) => current.get(idx)?,
            Err(_) => current.get(part)?,
        };
    }

    Some(current.clone())
}

/// Zero values count as unset
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
