//! Turns configuration layers into per-file rule settings.
//!
//! Resolution happens in two steps. [`ConfigResolver::prepare`] validates
//! every layer, normalizes rule names and merges the layers on top of the
//! registry defaults; any fatal problem surfaces here, before a file is
//! read. [`PreparedConfig::effective_for`] then answers, for one file path,
//! whether each rule is enabled and with which parameters.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use coplint_plugin::{RuleConfig, Severity};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{ConfigLayer, merge_values};
use crate::registry::{NameResolution, RuleRegistry};
use crate::ConfigError;

/// Section holding settings that apply to every rule.
pub const ALL_RULES_SECTION: &str = "AllCops";

/// Keys every rule and department section accepts.
pub const COMMON_KEYS: &[&str] = &["Enabled", "Severity", "Exclude", "Include", "AutoCorrect"];

pub const DEFAULT_MAX_CORRECTION_PASSES: usize = 200;

const ALL_RULES_KEYS: &[&str] = &["DisabledByDefault", "Exclude", "Require", "MaxCorrectionPasses"];

/// A non-fatal configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub source: String,
    pub kind: ConfigWarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarningKind {
    /// A bare rule name was qualified with its department.
    MissingDepartment { name: String, qualified: String },
    /// A rule was configured under the wrong department.
    WrongDepartment { name: String, qualified: String },
    UnknownParameter {
        section: String,
        parameter: String,
        supported: Vec<String>,
    },
    ObsoleteParameter { message: String },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.source)?;
        match &self.kind {
            ConfigWarningKind::MissingDepartment { name, qualified } => {
                write!(f, "no department given for {name}; assuming {qualified}")
            }
            ConfigWarningKind::WrongDepartment { name, qualified } => {
                let department = qualified.split_once('/').map_or("", |(d, _)| d);
                write!(f, "{name} has the wrong namespace - should be {department}")
            }
            ConfigWarningKind::UnknownParameter {
                section,
                parameter,
                supported,
            } => write!(
                f,
                "{section} does not support the {parameter} parameter; supported parameters are: {}",
                supported.join(", ")
            ),
            ConfigWarningKind::ObsoleteParameter { message } => f.write_str(message),
        }
    }
}

/// Validates and merges configuration layers.
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'r> {
    registry: &'r RuleRegistry,
}

#[derive(Debug, Clone, Copy)]
enum Section {
    AllRules,
    Department(&'static str),
    Rule(usize),
}

impl<'r> ConfigResolver<'r> {
    pub fn new(registry: &'r RuleRegistry) -> Self {
        Self { registry }
    }

    /// Validates `layers` (lowest priority first) and merges them over the
    /// registry defaults.
    pub fn prepare(&self, layers: &[ConfigLayer]) -> Result<PreparedConfig, ConfigError> {
        let mut warnings = Vec::new();
        let mut merged: Map<String, Value> = self
            .registry
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let defaults = self.registry.defaults_at(i).cloned().unwrap_or_default();
                (d.meta.name.to_string(), Value::Object(defaults))
            })
            .collect();

        for layer in layers {
            debug!("Merging configuration from {}", layer.source);
            let normalized = self.normalize_layer(layer, &mut warnings)?;
            merge_values(&mut merged, &normalized);
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        let all_rules = merged.get(ALL_RULES_SECTION).and_then(Value::as_object);
        let disabled_by_default = all_rules
            .and_then(|a| a.get("DisabledByDefault"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let max_correction_passes = all_rules
            .and_then(|a| a.get("MaxCorrectionPasses"))
            .and_then(Value::as_u64)
            .map_or(DEFAULT_MAX_CORRECTION_PASSES, |n| n as usize);
        let global = match all_rules {
            Some(section) => FileFilter::compile(section)?,
            None => FileFilter::default(),
        };

        let mut filters = HashMap::new();
        for (name, section) in &merged {
            if name == ALL_RULES_SECTION {
                continue;
            }
            if let Some(section) = section.as_object() {
                let filter = FileFilter::compile(section)?;
                if !filter.is_empty() {
                    filters.insert(name.clone(), filter);
                }
            }
        }

        Ok(PreparedConfig {
            sections: merged,
            disabled_by_default,
            max_correction_passes,
            global,
            filters,
            warnings,
        })
    }

    /// Prepares `layers` and resolves them for one file.
    pub fn resolve(&self, layers: &[ConfigLayer], path: &Path) -> Result<EffectiveConfig, ConfigError> {
        Ok(self.prepare(layers)?.effective_for(self.registry, path))
    }

    fn normalize_layer(
        &self,
        layer: &ConfigLayer,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Map<String, Value>, ConfigError> {
        let mut out = Map::new();
        for (key, value) in &layer.values {
            let section = self.classify(key, &layer.source, warnings)?;
            let name = match section {
                Section::AllRules => ALL_RULES_SECTION.to_string(),
                Section::Department(department) => department.to_string(),
                Section::Rule(index) => self.rule_name(index).to_string(),
            };
            let normalized = match value {
                Value::Null => Value::Null,
                Value::Object(fields) => Value::Object(match section {
                    Section::AllRules => self.check_all_rules(fields, layer, warnings)?,
                    Section::Department(department) => {
                        self.check_department(department, fields, layer, warnings)?
                    }
                    Section::Rule(index) => self.check_rule(index, fields, layer, warnings)?,
                }),
                _ => return Err(ConfigError::invalid_value(key, "an object", &layer.source)),
            };

            // `LineLength` and `Layout/LineLength` in one layer land in one section.
            if let Some(Value::Object(existing)) = out.get_mut(&name)
                && let Value::Object(fields) = &normalized
            {
                existing.extend(fields.clone());
                continue;
            }
            out.insert(name, normalized);
        }
        Ok(out)
    }

    fn rule_name(&self, index: usize) -> &'static str {
        self.registry.descriptor(index).map_or("", |d| d.meta.name)
    }

    fn classify(
        &self,
        key: &str,
        source: &str,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Section, ConfigError> {
        if key == ALL_RULES_SECTION {
            return Ok(Section::AllRules);
        }
        if let Some(department) = self.registry.departments().find(|d| *d == key) {
            return Ok(Section::Department(department));
        }
        if let Some(index) = self.registry.index_of(key) {
            return Ok(Section::Rule(index));
        }
        if let Some(message) = self
            .registry
            .obsoletions()
            .rule_message(key, |feature| self.registry.has_feature(feature))
        {
            return Err(ConfigError::ObsoleteRule {
                message,
                source_name: source.to_string(),
            });
        }

        let short = key.split_once('/').map_or(key, |(_, short)| short);
        match self.registry.resolve_short_name(short) {
            NameResolution::Unique(meta) => {
                let kind = if short == key {
                    ConfigWarningKind::MissingDepartment {
                        name: key.to_string(),
                        qualified: meta.name.to_string(),
                    }
                } else {
                    ConfigWarningKind::WrongDepartment {
                        name: key.to_string(),
                        qualified: meta.name.to_string(),
                    }
                };
                warnings.push(ConfigWarning {
                    source: source.to_string(),
                    kind,
                });
                Ok(Section::Rule(self.registry.index_of(meta.name).unwrap_or_default()))
            }
            NameResolution::Ambiguous(candidates) if short == key => {
                Err(ConfigError::AmbiguousRule {
                    name: key.to_string(),
                    source_name: source.to_string(),
                    candidates: candidates.iter().map(|c| c.to_string()).collect(),
                })
            }
            _ => Err(ConfigError::UnknownRule {
                name: key.to_string(),
                source_name: source.to_string(),
                suggestion: self.registry.suggest(key).map(str::to_string),
            }),
        }
    }

    /// Validates one of [`COMMON_KEYS`]; `None` if `key` is not one.
    fn check_common(
        &self,
        section: &str,
        key: &str,
        value: &Value,
        layer: &ConfigLayer,
        immutable: bool,
    ) -> Result<Option<Value>, ConfigError> {
        let source = layer.source.as_str();
        let path = || format!("{section}.{key}");
        match key {
            "Enabled" => {
                let enabled = value
                    .as_bool()
                    .ok_or_else(|| ConfigError::invalid_value(path(), "true or false", source))?;
                if !enabled && immutable {
                    return Err(ConfigError::Immutable {
                        name: section.to_string(),
                        source_name: source.to_string(),
                    });
                }
                Ok(Some(value.clone()))
            }
            "AutoCorrect" => match value {
                Value::Bool(_) => Ok(Some(value.clone())),
                _ => Err(ConfigError::invalid_value(path(), "true or false", source)),
            },
            "Severity" => {
                let name = value
                    .as_str()
                    .ok_or_else(|| ConfigError::invalid_value(path(), "a string", source))?;
                name.parse::<Severity>()
                    .map_err(|_| ConfigError::InvalidSeverity {
                        section: section.to_string(),
                        value: name.to_string(),
                        source_name: source.to_string(),
                    })?;
                Ok(Some(value.clone()))
            }
            "Exclude" | "Include" => Ok(Some(self.check_patterns(&path(), value, layer)?)),
            _ => Ok(None),
        }
    }

    /// Validates a pattern list and anchors relative patterns at the
    /// layer's base directory.
    fn check_patterns(&self, key: &str, value: &Value, layer: &ConfigLayer) -> Result<Value, ConfigError> {
        let source = layer.source.as_str();
        let items = value
            .as_array()
            .ok_or_else(|| ConfigError::invalid_value(key, "a list of patterns", source))?;
        let mut patterns = Vec::with_capacity(items.len());
        for item in items {
            let pattern = item
                .as_str()
                .ok_or_else(|| ConfigError::invalid_value(key, "a list of patterns", source))?;
            let anchored = anchor_pattern(pattern, layer.base_dir.as_deref());
            Glob::new(&anchored).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source_name: source.to_string(),
                message: e.to_string(),
            })?;
            patterns.push(Value::String(anchored));
        }
        Ok(Value::Array(patterns))
    }

    fn check_rule(
        &self,
        index: usize,
        fields: &Map<String, Value>,
        layer: &ConfigLayer,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Map<String, Value>, ConfigError> {
        let Some(descriptor) = self.registry.descriptor(index) else {
            return Ok(Map::new());
        };
        let meta = &descriptor.meta;
        let defaults = self.registry.defaults_at(index);
        let has_default = |key: &str| defaults.is_some_and(|d| d.contains_key(key));
        let source = layer.source.as_str();

        let mut out = Map::new();
        for (key, value) in fields {
            if value.is_null() {
                out.insert(key.clone(), Value::Null);
                continue;
            }
            if let Some(checked) = self.check_common(meta.name, key, value, layer, meta.immutable)? {
                out.insert(key.clone(), checked);
                continue;
            }
            if has_default(key) {
                if key == "EnforcedStyle" {
                    self.check_enforced_style(meta.name, value, defaults, source)?;
                }
                out.insert(key.clone(), value.clone());
                continue;
            }
            if let Some(record) = self.registry.obsoletions().parameter(meta.name, key) {
                let message = record.message(meta.name);
                if record.is_error() {
                    return Err(ConfigError::ObsoleteParameter {
                        message,
                        source_name: source.to_string(),
                    });
                }
                warnings.push(ConfigWarning {
                    source: source.to_string(),
                    kind: ConfigWarningKind::ObsoleteParameter { message },
                });
                continue;
            }
            warnings.push(ConfigWarning {
                source: source.to_string(),
                kind: ConfigWarningKind::UnknownParameter {
                    section: meta.name.to_string(),
                    parameter: key.clone(),
                    supported: self.registry.supported_parameters(meta.name),
                },
            });
            out.insert(key.clone(), value.clone());
        }
        Ok(out)
    }

    fn check_enforced_style(
        &self,
        rule: &str,
        value: &Value,
        defaults: Option<&Map<String, Value>>,
        source: &str,
    ) -> Result<(), ConfigError> {
        let style = value
            .as_str()
            .ok_or_else(|| ConfigError::invalid_value(format!("{rule}.EnforcedStyle"), "a string", source))?;
        let supported: Vec<String> = defaults
            .and_then(|d| d.get("SupportedStyles"))
            .and_then(Value::as_array)
            .map(|styles| {
                styles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if supported.is_empty() || supported.iter().any(|s| s == style) {
            return Ok(());
        }
        Err(ConfigError::InvalidEnforcedStyle {
            rule: rule.to_string(),
            value: style.to_string(),
            supported,
            source_name: source.to_string(),
        })
    }

    fn check_department(
        &self,
        department: &'static str,
        fields: &Map<String, Value>,
        layer: &ConfigLayer,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Map<String, Value>, ConfigError> {
        let immutable = self.registry.is_immutable_department(department);
        let mut out = Map::new();
        for (key, value) in fields {
            if value.is_null() {
                out.insert(key.clone(), Value::Null);
                continue;
            }
            match self.check_common(department, key, value, layer, immutable)? {
                Some(checked) => {
                    out.insert(key.clone(), checked);
                }
                None => warnings.push(ConfigWarning {
                    source: layer.source.clone(),
                    kind: ConfigWarningKind::UnknownParameter {
                        section: department.to_string(),
                        parameter: key.clone(),
                        supported: COMMON_KEYS.iter().map(|k| k.to_string()).collect(),
                    },
                }),
            }
        }
        Ok(out)
    }

    fn check_all_rules(
        &self,
        fields: &Map<String, Value>,
        layer: &ConfigLayer,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<Map<String, Value>, ConfigError> {
        let source = layer.source.as_str();
        let path = |key: &str| format!("{ALL_RULES_SECTION}.{key}");
        let mut out = Map::new();
        for (key, value) in fields {
            if value.is_null() {
                out.insert(key.clone(), Value::Null);
                continue;
            }
            let name = key.as_str();
            let checked = match name {
                "DisabledByDefault" => match value {
                    Value::Bool(_) => value.clone(),
                    _ => return Err(ConfigError::invalid_value(path(name), "true or false", source)),
                },
                "Exclude" => self.check_patterns(&path(name), value, layer)?,
                "Require" => {
                    let features: Vec<&str> = match value {
                        Value::String(feature) => vec![feature.as_str()],
                        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                        _ => return Err(ConfigError::invalid_value(path(name), "a list of features", source)),
                    };
                    if let Some(missing) = features.iter().find(|f| !self.registry.has_feature(f)) {
                        return Err(ConfigError::UnresolvableRequire {
                            feature: missing.to_string(),
                            source_name: source.to_string(),
                        });
                    }
                    Value::Array(features.into_iter().map(|f| Value::String(f.to_string())).collect())
                }
                "MaxCorrectionPasses" => match value.as_u64() {
                    Some(n) if n > 0 => value.clone(),
                    _ => return Err(ConfigError::invalid_value(path(name), "a positive integer", source)),
                },
                _ => {
                    warnings.push(ConfigWarning {
                        source: source.to_string(),
                        kind: ConfigWarningKind::UnknownParameter {
                            section: ALL_RULES_SECTION.to_string(),
                            parameter: key.clone(),
                            supported: ALL_RULES_KEYS.iter().map(|k| k.to_string()).collect(),
                        },
                    });
                    continue;
                }
            };
            out.insert(key.clone(), checked);
        }
        Ok(out)
    }
}

/// Joins a relative pattern to `base_dir`.
///
/// Absolute patterns and patterns starting with `**` match anywhere and
/// are left alone.
fn anchor_pattern(pattern: &str, base_dir: Option<&Path>) -> String {
    match base_dir {
        Some(base) if !pattern.starts_with("**") && !Path::new(pattern).is_absolute() => {
            base.join(pattern).to_string_lossy().into_owned()
        }
        _ => pattern.to_string(),
    }
}

/// Compiled `Include`/`Exclude` patterns of one section.
#[derive(Debug, Clone, Default)]
struct FileFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FileFilter {
    fn compile(section: &Map<String, Value>) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_globset(section.get("Include"))?,
            exclude: build_globset(section.get("Exclude"))?,
        })
    }

    fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    fn excludes(&self, path: &Path) -> bool {
        self.exclude.as_ref().is_some_and(|set| set.is_match(path))
            || self.include.as_ref().is_some_and(|set| !set.is_match(path))
    }
}

fn build_globset(patterns: Option<&Value>) -> Result<Option<GlobSet>, ConfigError> {
    let Some(patterns) = patterns.and_then(Value::as_array) else {
        return Ok(None);
    };
    let invalid = |pattern: &str, e: globset::Error| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source_name: "merged configuration".to_string(),
        message: e.to_string(),
    };
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().filter_map(Value::as_str) {
        builder.add(Glob::new(pattern).map_err(|e| invalid(pattern, e))?);
    }
    builder.build().map(Some).map_err(|e| invalid("<set>", e))
}

/// Validated, merged configuration for one stack of layers.
#[derive(Debug, Clone)]
pub struct PreparedConfig {
    sections: Map<String, Value>,
    disabled_by_default: bool,
    max_correction_passes: usize,
    global: FileFilter,
    filters: HashMap<String, FileFilter>,
    warnings: Vec<ConfigWarning>,
}

impl PreparedConfig {
    /// Non-fatal problems found while preparing.
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// The merged configuration, defaults included.
    pub fn sections(&self) -> &Map<String, Value> {
        &self.sections
    }

    /// Resolves every registered rule for `path`.
    ///
    /// `registry` must be the one the configuration was prepared against.
    pub fn effective_for(&self, registry: &RuleRegistry, path: &Path) -> EffectiveConfig {
        let rules = registry
            .iter()
            .map(|descriptor| {
                let meta = &descriptor.meta;
                (meta.name.to_string(), self.rule_config(meta, path))
            })
            .collect();
        EffectiveConfig {
            rules,
            excluded: self.global.excludes(path),
            max_correction_passes: self.max_correction_passes,
        }
    }

    fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.sections.get(name).and_then(Value::as_object)
    }

    fn rule_config(&self, meta: &coplint_plugin::RuleMeta, path: &Path) -> RuleConfig {
        let rule = self.section(meta.name);
        let department = self.section(meta.department());
        let lookup = |key: &str| {
            rule.and_then(|s| s.get(key))
                .or_else(|| department.and_then(|s| s.get(key)))
        };

        let mut enabled = meta.immutable
            || lookup("Enabled")
                .and_then(Value::as_bool)
                .unwrap_or(!self.disabled_by_default && meta.enabled_by_default);
        if enabled && !meta.immutable && self.filtered_out(meta, path) {
            enabled = false;
        }

        let severity = lookup("Severity")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        let autocorrect =
            meta.autocorrect && lookup("AutoCorrect").and_then(Value::as_bool).unwrap_or(true);
        let params = rule
            .map(|section| {
                section
                    .iter()
                    .filter(|(key, _)| !COMMON_KEYS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        RuleConfig {
            enabled,
            severity,
            autocorrect,
            params,
        }
    }

    fn filtered_out(&self, meta: &coplint_plugin::RuleMeta, path: &Path) -> bool {
        [meta.name, meta.department()]
            .iter()
            .filter_map(|name| self.filters.get(*name))
            .any(|filter| filter.excludes(path))
    }
}

/// Settings of every registered rule for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    rules: BTreeMap<String, RuleConfig>,
    /// The file matches `AllCops.Exclude` and is not inspected.
    pub excluded: bool,
    pub max_correction_passes: usize,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            excluded: false,
            max_correction_passes: DEFAULT_MAX_CORRECTION_PASSES,
        }
    }
}

impl EffectiveConfig {
    pub fn get(&self, rule: &str) -> Option<&RuleConfig> {
        self.rules.get(rule)
    }

    pub fn is_enabled(&self, rule: &str) -> bool {
        self.rules.get(rule).is_some_and(|c| c.enabled)
    }

    /// Replaces the settings of one rule.
    pub fn set(&mut self, rule: impl Into<String>, config: RuleConfig) {
        self.rules.insert(rule.into(), config);
    }

    /// Rule name and settings, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleConfig)> {
        self.rules.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, config)| config.enabled)
            .map(|(name, _)| name)
    }
}
