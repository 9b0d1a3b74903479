//! The set of known rules.
//!
//! Built once at startup and shared read-only by every worker afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use coplint_plugin::{RuleDescriptor, RuleMeta};
use serde_json::{Map, Value};

use crate::builtin;
use crate::obsoletion::{Obsoletions, ParameterObsoletion, RuleObsoletion};
use crate::RegistryError;

/// Outcome of looking up a name without a department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution<'r> {
    Unique(&'r RuleMeta),
    Ambiguous(Vec<&'static str>),
    Unknown,
}

/// All registered rules, in registration order.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<RuleDescriptor>,
    defaults: Vec<Map<String, Value>>,
    by_name: HashMap<&'static str, usize>,
    by_short_name: HashMap<&'static str, Vec<usize>>,
    departments: BTreeMap<&'static str, Vec<usize>>,
    immutable_departments: BTreeSet<String>,
    features: BTreeSet<String>,
    obsoletions: Obsoletions,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// A registry holding only the engine's built-in rules.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for descriptor in builtin::DESCRIPTORS {
            // Built-in descriptors are well formed.
            if let Err(e) = registry.register(descriptor) {
                tracing::error!("Failed to register built-in rule: {}", e);
            }
        }
        registry
    }

    /// A registry without the built-in rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            defaults: Vec::new(),
            by_name: HashMap::new(),
            by_short_name: HashMap::new(),
            departments: BTreeMap::new(),
            immutable_departments: BTreeSet::new(),
            features: BTreeSet::new(),
            obsoletions: Obsoletions::new(),
        }
    }

    /// Adds a rule.
    ///
    /// Fails on a duplicate name, a name that is not `Department/Name`, or
    /// a default configuration that is not a JSON object.
    pub fn register(&mut self, descriptor: RuleDescriptor) -> Result<(), RegistryError> {
        let name = descriptor.meta.name;
        if !is_qualified_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateRule(name.to_string()));
        }
        let defaults = parse_defaults(&descriptor.meta)?;

        let index = self.rules.len();
        self.rules.push(descriptor);
        self.defaults.push(defaults);
        self.by_name.insert(name, index);
        self.by_short_name
            .entry(descriptor.meta.short_name())
            .or_default()
            .push(index);
        self.departments
            .entry(descriptor.meta.department())
            .or_default()
            .push(index);
        Ok(())
    }

    /// Adds several rules, stopping at the first failure.
    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = RuleDescriptor>,
    ) -> Result<(), RegistryError> {
        descriptors.into_iter().try_for_each(|d| self.register(d))
    }

    /// Declares a loadable feature that `AllCops.Require` may name.
    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.insert(feature.into());
    }

    /// Marks a department whose rules cannot be disabled as a group.
    pub fn add_immutable_department(&mut self, department: impl Into<String>) {
        self.immutable_departments.insert(department.into());
    }

    pub fn add_rule_obsoletion(&mut self, record: RuleObsoletion) {
        self.obsoletions.add_rule(record);
    }

    pub fn add_parameter_obsoletion(&mut self, record: ParameterObsoletion) {
        self.obsoletions.add_parameter(record);
    }

    pub fn get(&self, name: &str) -> Option<&RuleDescriptor> {
        self.by_name.get(name).map(|&i| &self.rules[i])
    }

    /// Registration index of a rule.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn descriptor(&self, index: usize) -> Option<&RuleDescriptor> {
        self.rules.get(index)
    }

    /// Rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleDescriptor> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|d| d.meta.name)
    }

    pub fn departments(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.departments.keys().copied()
    }

    pub fn is_department(&self, name: &str) -> bool {
        self.departments.contains_key(name)
    }

    /// Names of the rules in a department, in registration order.
    pub fn rules_in(&self, department: &str) -> Vec<&'static str> {
        self.departments
            .get(department)
            .map(|indices| indices.iter().map(|&i| self.rules[i].meta.name).collect())
            .unwrap_or_default()
    }

    pub fn is_immutable_department(&self, department: &str) -> bool {
        self.immutable_departments.contains(department)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    pub fn features(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }

    pub fn obsoletions(&self) -> &Obsoletions {
        &self.obsoletions
    }

    /// Default parameters of a rule, from its metadata.
    pub fn defaults(&self, name: &str) -> Option<&Map<String, Value>> {
        self.by_name.get(name).map(|&i| &self.defaults[i])
    }

    /// Default parameters by registration index.
    pub fn defaults_at(&self, index: usize) -> Option<&Map<String, Value>> {
        self.defaults.get(index)
    }

    /// The built-in defaults as one configuration object.
    ///
    /// Each rule's section holds its default parameters plus `Enabled`.
    pub fn default_config(&self) -> Map<String, Value> {
        self.rules
            .iter()
            .zip(&self.defaults)
            .map(|(d, defaults)| {
                let mut section = Map::new();
                section.insert("Enabled".into(), Value::Bool(d.meta.enabled_by_default));
                section.extend(defaults.clone());
                (d.meta.name.to_string(), Value::Object(section))
            })
            .collect()
    }

    /// Parameters a rule accepts: the common keys plus its defaults.
    pub fn supported_parameters(&self, name: &str) -> Vec<String> {
        let mut params: Vec<String> = crate::resolver::COMMON_KEYS
            .iter()
            .map(|k| k.to_string())
            .collect();
        if let Some(defaults) = self.defaults(name) {
            let extra: Vec<String> = defaults
                .keys()
                .filter(|k| !params.contains(k))
                .cloned()
                .collect();
            params.extend(extra);
        }
        params
    }

    /// Looks up a name given without its department.
    pub fn resolve_short_name(&self, short: &str) -> NameResolution<'_> {
        match self.by_short_name.get(short).map(Vec::as_slice) {
            Some([index]) => NameResolution::Unique(&self.rules[*index].meta),
            Some(indices) if !indices.is_empty() => NameResolution::Ambiguous(
                indices.iter().map(|&i| self.rules[i].meta.name).collect(),
            ),
            _ => NameResolution::Unknown,
        }
    }

    /// The closest known rule or department name, if any is close enough.
    pub fn suggest(&self, name: &str) -> Option<&'static str> {
        let needle = name.to_lowercase();
        let threshold = (needle.chars().count() / 3).max(2);
        self.names()
            .chain(self.departments())
            .map(|candidate| (levenshtein(&needle, &candidate.to_lowercase()), candidate))
            .filter(|(distance, _)| *distance <= threshold)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, candidate)| candidate)
    }
}

fn is_qualified_name(name: &str) -> bool {
    let valid = |part: &str| {
        part.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    name.split_once('/')
        .is_some_and(|(department, rule)| valid(department) && valid(rule))
}

fn parse_defaults(meta: &RuleMeta) -> Result<Map<String, Value>, RegistryError> {
    let invalid = |message: String| RegistryError::InvalidDefaultConfig {
        rule: meta.name.to_string(),
        message,
    };
    match serde_json::from_str::<Value>(meta.default_config) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("expected a JSON object".to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
