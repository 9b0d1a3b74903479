//! Per-rule resolved settings.

use serde_json::{Map, Value};

use crate::Severity;

/// Effective settings of one rule for one file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleConfig {
    pub enabled: bool,
    /// Configured severity; `None` keeps the rule's default.
    pub severity: Option<Severity>,
    /// Whether corrections from this rule may be applied.
    pub autocorrect: bool,
    /// Rule parameters, after merging every configuration layer.
    pub params: Map<String, Value>,
}

impl RuleConfig {
    /// An enabled configuration with no parameters.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            severity: None,
            autocorrect: true,
            params: Map::new(),
        }
    }

    /// Adds a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(Value::as_i64)
    }

    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(Value::as_bool)
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.param(key).and_then(Value::as_str)
    }

    /// A list of strings; non-string entries are skipped.
    pub fn str_list_param(&self, key: &str) -> Vec<&str> {
        self.param(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The `EnforcedStyle` parameter.
    pub fn enforced_style(&self) -> Option<&str> {
        self.str_param("EnforcedStyle")
    }
}
