//! Fact collection seam
//!
//! The detector only reads a handful of facts resolved elsewhere (GCE
//! metadata, BIOS vendor, DMI product name) and the resolver writes the
//! virtualization facts back. Anything that can answer `get` and accept
//! `add` can host the detector.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// GCE metadata or a boolean "running on GCE" indicator
pub const GCE: &str = "gce";
pub const BIOS_VENDOR: &str = "bios_vendor";
pub const PRODUCT_NAME: &str = "product_name";

pub const HYPERVISOR: &str = "hypervisor";
pub const VIRTUAL: &str = "virtual";
pub const IS_VIRTUAL: &str = "is_virtual";

/// Key/value store of host facts
pub trait FactCollection {
    /// Look up a fact. Implementations may resolve it lazily.
    fn get(&self, name: &str) -> Option<Value>;

    /// Publish a fact, replacing any previous value
    fn add(&mut self, name: &str, value: Value);

    /// Convenience accessor for string facts
    fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// In-memory fact collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facts {
    values: BTreeMap<String, Value>,
}

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for seeding collections
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FactCollection for Facts {
    fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    fn add(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }
}

/// Truthiness of a fact value: `false`, `null`, empty strings and empty
/// containers are all "not set"
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_and_add() {
        let mut facts = Facts::new().with(BIOS_VENDOR, "Google");
        assert_eq!(facts.get_str(BIOS_VENDOR).as_deref(), Some("Google"));
        assert!(facts.get(GCE).is_none());

        facts.add(GCE, json!(true));
        assert_eq!(facts.get(GCE), Some(json!(true)));
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn test_get_str_ignores_non_strings() {
        let facts = Facts::new().with(PRODUCT_NAME, 42);
        assert!(facts.get_str(PRODUCT_NAME).is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!({"instance": {"id": 1}})));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!({})));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("false")));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let facts = Facts::new().with(VIRTUAL, "kvm").with(IS_VIRTUAL, true);
        let text = serde_json::to_string(&facts).unwrap();
        assert_eq!(text, r#"{"is_virtual":true,"virtual":"kvm"}"#);
    }
}
