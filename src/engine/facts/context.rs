// SPDX-License-Identifier: MIT

//! Per-test fact storage

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::engine::error::MarkError;

/// Environment facts a condition is evaluated against
///
/// Built fresh for every test item by the harness: testbed-derived facts,
/// then facts discovered from the DUT, then explicit overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactContext {
    facts: BTreeMap<String, Value>,
}

impl FactContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a fact, replacing any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Builder-style `insert`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a fact value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.facts.get(key)
    }

    /// Get a nested fact using dot notation (e.g., "dut.asic_type")
    ///
    /// A flat key containing dots takes precedence over the nested walk.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.facts.get(path) {
            return Some(value);
        }

        let mut parts = path.split('.');
        let mut current = self.facts.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Merge another context into this one; `other` wins on conflicts
    pub fn extend(&mut self, other: FactContext) {
        self.facts.extend(other.facts);
    }

    /// Parse `key=value` pairs as given on the command line
    ///
    /// `true`/`false` (any case) become booleans, everything else is kept as
    /// a string so release names like `202012` compare as written.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, MarkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ctx = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                MarkError::config(format!("Invalid fact '{}': expected key=value", pair))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(MarkError::config(format!(
                    "Invalid fact '{}': empty key",
                    pair
                )));
            }
            let value = value.trim();
            let value = if value.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if value.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                Value::String(value.to_string())
            };
            ctx.insert(key, value);
        }
        Ok(ctx)
    }

    /// Parse a YAML mapping of facts
    pub fn from_yaml(content: &str) -> Result<Self, MarkError> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let map: Option<BTreeMap<String, Value>> = serde_yaml::from_str(content)?;
        Ok(Self {
            facts: map.unwrap_or_default(),
        })
    }

    /// Get all fact names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.facts.keys()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Convert context to a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.facts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FactContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            facts: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_context() {
        let ctx = FactContext::new();
        assert!(ctx.get("asic_type").is_none());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let ctx = FactContext::new()
            .with("asic_type", "broadcom")
            .with("is_multi_asic", false);
        assert_eq!(ctx.get("asic_type"), Some(&json!("broadcom")));
        assert_eq!(ctx.get("is_multi_asic"), Some(&json!(false)));
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_get_path_nested() {
        let ctx = FactContext::new().with("dut", json!({"asic": {"type": "mellanox"}}));
        assert_eq!(ctx.get_path("dut.asic.type"), Some(&json!("mellanox")));
        assert!(ctx.get_path("dut.asic.count").is_none());
        assert!(ctx.get_path("dut.asic.type.more").is_none());
    }

    #[test]
    fn test_get_path_array_index() {
        let ctx = FactContext::new().with("duts", json!(["str-a", "str-b"]));
        assert_eq!(ctx.get_path("duts.1"), Some(&json!("str-b")));
        assert!(ctx.get_path("duts.5").is_none());
    }

    #[test]
    fn test_flat_dotted_key_wins() {
        let ctx = FactContext::new()
            .with("dut.asic", "flat")
            .with("dut", json!({"asic": "nested"}));
        assert_eq!(ctx.get_path("dut.asic"), Some(&json!("flat")));
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = FactContext::new()
            .with("topo_name", "t0")
            .with("release", "202012");
        base.extend(FactContext::new().with("topo_name", "t1"));
        assert_eq!(base.get("topo_name"), Some(&json!("t1")));
        assert_eq!(base.get("release"), Some(&json!("202012")));
    }

    #[test]
    fn test_from_pairs() {
        let ctx = FactContext::from_pairs([
            "asic_type=broadcom",
            "is_multi_asic=True",
            "release = 202012",
        ])
        .unwrap();
        assert_eq!(ctx.get("asic_type"), Some(&json!("broadcom")));
        assert_eq!(ctx.get("is_multi_asic"), Some(&json!(true)));
        assert_eq!(ctx.get("release"), Some(&json!("202012")));
    }

    #[test]
    fn test_from_pairs_rejects_malformed() {
        assert!(FactContext::from_pairs(["asic_type"]).is_err());
        assert!(FactContext::from_pairs(["=broadcom"]).is_err());
    }

    #[test]
    fn test_from_yaml() {
        let ctx = FactContext::from_yaml(
            r#"
asic_type: mellanox
num_asics: 3
is_multi_asic: true
"#,
        )
        .unwrap();
        assert_eq!(ctx.get("num_asics"), Some(&json!(3)));
        assert_eq!(ctx.get("is_multi_asic"), Some(&json!(true)));
    }

    #[test]
    fn test_from_yaml_empty_document() {
        let ctx = FactContext::from_yaml("").unwrap();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_to_json() {
        let ctx: FactContext = [("a", "x"), ("b", "y")].into_iter().collect();
        assert_eq!(ctx.to_json(), json!({"a": "x", "b": "y"}));
    }
}
