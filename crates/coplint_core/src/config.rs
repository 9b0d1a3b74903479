//! Configuration layers and how they stack.
//!
//! A layer is one JSON object, usually read from one file. Layers are
//! merged in order, later layers winning key by key; a `null` value removes
//! the key from the merged result instead of merging into it.

use std::fs;
use std::path::{Path, PathBuf};

use jsonc_parser::ParseOptions;
use serde_json::{Map, Value};

use crate::ConfigError;

/// One source of configuration values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigLayer {
    /// Human-readable origin, used in messages.
    pub source: String,
    /// Directory relative `Exclude` and `Include` patterns are resolved against.
    pub base_dir: Option<PathBuf>,
    pub values: Map<String, Value>,
}

impl ConfigLayer {
    pub fn new(source: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            source: source.into(),
            base_dir: None,
            values,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Builds a layer from a JSON value, which must be an object.
    pub fn from_value(source: impl Into<String>, value: Value) -> Result<Self, ConfigError> {
        let source = source.into();
        match value {
            Value::Object(values) => Ok(Self::new(source, values)),
            Value::Null => Ok(Self::new(source, Map::new())),
            _ => Err(ConfigError::load(source, "top-level value must be an object")),
        }
    }

    /// Parses JSON with comments and trailing commas.
    pub fn from_jsonc(source: impl Into<String>, text: &str) -> Result<Self, ConfigError> {
        let source = source.into();
        let value = jsonc_parser::parse_to_serde_value(text, &ParseOptions::default())
            .map_err(|e| ConfigError::load(&source, e.to_string()))?
            .unwrap_or(Value::Null);
        Self::from_value(source, value)
    }

    /// Reads a configuration file.
    ///
    /// Relative patterns in the file are resolved against its directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::load(&source, format!("failed to read: {e}")))?;
        let layer = Self::from_jsonc(source, &text)?;
        Ok(match path.parent() {
            Some(parent) => layer.with_base_dir(parent),
            None => layer,
        })
    }

    /// Serializes the layer back to pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.values).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Supplies the ordered layers that apply to a file.
///
/// The first layer is the lowest priority. Built-in rule defaults are not
/// part of the stack; the resolver adds them underneath.
pub trait ConfigSource: Send + Sync {
    fn layers_for(&self, path: &Path) -> Result<Vec<ConfigLayer>, ConfigError>;
}

/// The same layers for every file.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    layers: Vec<ConfigLayer>,
}

impl StaticConfig {
    pub fn new(layers: Vec<ConfigLayer>) -> Self {
        Self { layers }
    }
}

impl ConfigSource for StaticConfig {
    fn layers_for(&self, _path: &Path) -> Result<Vec<ConfigLayer>, ConfigError> {
        Ok(self.layers.clone())
    }
}

/// Merges `overlay` into `base`.
///
/// Objects merge recursively. Any other value replaces the old one, and
/// `null` deletes the key.
pub fn merge_values(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Null => {
                base.remove(key);
            }
            Value::Object(inner) => {
                let slot = base
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(target) = slot {
                    merge_values(target, inner);
                }
            }
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}
