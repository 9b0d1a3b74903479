//! # coplint_rules
//!
//! The sample rules shipped with coplint, one module per department.
//!
//! | Rule | Correctable | Hook |
//! |------|-------------|------|
//! | `Layout/TrailingWhitespace` | yes | end of file |
//! | `Layout/LineLength` | no | end of file |
//! | `Layout/SpaceAroundOperators` | yes | nodes |
//! | `Style/StringLiterals` | yes | nodes |
//! | `Style/NumericLiterals` | yes | nodes |
//! | `Lint/Debugger` | no | nodes |
//! | `Naming/MethodName` | no | nodes |
//! | `Metrics/BlockNesting` | no | end of file |
//!
//! ## Example
//!
//! ```rust
//! use coplint_core::RuleRegistry;
//!
//! let mut registry = RuleRegistry::new();
//! coplint_rules::register(&mut registry).unwrap();
//! assert!(registry.contains("Style/StringLiterals"));
//! ```

use coplint_core::{ParameterObsoletion, RegistryError, RuleObsoletion, RuleRegistry};
use coplint_plugin::{RuleContext, RuleDescriptor, RuleError};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub mod layout;
pub mod lint;
pub mod metrics;
pub mod naming;
pub mod style;

/// Every rule in this crate, in registration order.
pub const DESCRIPTORS: [RuleDescriptor; 8] = [
    layout::trailing_whitespace::DESCRIPTOR,
    layout::line_length::DESCRIPTOR,
    layout::space_around_operators::DESCRIPTOR,
    style::string_literals::DESCRIPTOR,
    style::numeric_literals::DESCRIPTOR,
    lint::debugger::DESCRIPTOR,
    naming::method_name::DESCRIPTOR,
    metrics::block_nesting::DESCRIPTOR,
];

/// Registers every rule and the obsoletion records for rules and
/// parameters that used to exist.
pub fn register(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register_all(DESCRIPTORS)?;

    registry.add_rule_obsoletion(RuleObsoletion::renamed(
        "Style/DoubleQuotes",
        "Style/StringLiterals",
    ));
    registry.add_rule_obsoletion(
        RuleObsoletion::removed("Lint/Eval").with_reason("the language has no `eval`"),
    );
    registry.add_rule_obsoletion(RuleObsoletion::extracted("Performance", "coplint-performance"));
    registry.add_parameter_obsoletion(
        ParameterObsoletion::new(
            [layout::line_length::NAME, naming::method_name::NAME],
            "IgnoredPatterns",
        )
        .renamed_to("AllowedPatterns"),
    );
    Ok(())
}

/// Deserializes the rule's parameters. Keys missing from the configuration
/// fall back to the settings type's `Default`.
pub(crate) fn settings<T: DeserializeOwned>(cx: &RuleContext<'_>) -> Result<T, RuleError> {
    serde_json::from_value(Value::Object(cx.config().params.clone()))
        .map_err(|e| RuleError::failed(format!("invalid parameters for {}: {e}", cx.meta().name)))
}

/// Compiles `AllowedPatterns`-style regex lists.
pub(crate) fn compile_patterns(name: &str, patterns: &[String]) -> Result<Vec<regex::Regex>, RuleError> {
    patterns
        .iter()
        .map(|p| regex::Regex::new(p).map_err(|e| RuleError::invalid_parameter(name, e.to_string())))
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Runs a single rule through the engine.

    use std::path::Path;
    use std::sync::Arc;

    use coplint_core::{ConfigLayer, FileReport, LintOptions, Linter, RuleRegistry, StaticConfig};
    use coplint_parser::ScriptParser;
    use coplint_plugin::{Offense, RuleDescriptor};
    use serde_json::{Value, json};

    fn lint(descriptor: RuleDescriptor, src: &str, params: Value, autocorrect: bool) -> FileReport {
        let mut registry = RuleRegistry::new();
        registry.register(descriptor).unwrap();
        let linter = Linter::new(
            Arc::new(registry),
            Arc::new(ScriptParser::new()),
            LintOptions {
                autocorrect,
                ..LintOptions::default()
            },
        );
        let layer = ConfigLayer::from_value("test", json!({ descriptor.meta.name: params })).unwrap();
        let path = Path::new("test.cop");
        let config = linter
            .resolve_config(path, &StaticConfig::new(vec![layer]))
            .unwrap();
        linter.lint_source(path, src.as_bytes(), &config)
    }

    /// Offenses `descriptor` reports for `src`.
    pub fn inspect(descriptor: RuleDescriptor, src: &str, params: Value) -> Vec<Offense> {
        lint(descriptor, src, params, false).offenses
    }

    /// `src` after autocorrection with only `descriptor` enabled.
    pub fn correct(descriptor: RuleDescriptor, src: &str, params: Value) -> String {
        lint(descriptor, src, params, true)
            .corrected_source
            .unwrap_or_else(|| src.to_string())
    }

    /// `(line, column, message)` of each offense.
    pub fn positions(offenses: &[Offense]) -> Vec<(u32, u32, String)> {
        offenses
            .iter()
            .map(|o| (o.location.start.line, o.location.start.column, o.message.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplint_core::NameResolution;
    use pretty_assertions::assert_eq;

    #[test]
    fn registers_every_rule_once() {
        let mut registry = RuleRegistry::new();
        register(&mut registry).unwrap();

        for descriptor in DESCRIPTORS {
            assert!(registry.contains(descriptor.name()), "{}", descriptor.name());
        }
        assert!(matches!(
            registry.resolve_short_name("LineLength"),
            NameResolution::Unique(meta) if meta.name == "Layout/LineLength"
        ));
        assert!(matches!(
            register(&mut registry),
            Err(RegistryError::DuplicateRule(_))
        ));
    }

    #[test]
    fn records_obsolete_names() {
        let mut registry = RuleRegistry::new();
        register(&mut registry).unwrap();
        let obsoletions = registry.obsoletions();

        assert_eq!(
            obsoletions.rule_message("Style/DoubleQuotes", |_| false).as_deref(),
            Some("The `Style/DoubleQuotes` rule has been renamed to `Style/StringLiterals`.")
        );
        assert!(obsoletions.rule_message("Performance/Count", |_| false).is_some());
        assert!(obsoletions.rule_message("Performance/Count", |f| f == "coplint-performance").is_none());
        assert_eq!(
            obsoletions
                .parameter("Layout/LineLength", "IgnoredPatterns")
                .and_then(|p| p.alternative.as_deref()),
            Some("AllowedPatterns")
        );
    }

    #[test]
    fn every_default_configuration_is_an_object() {
        for descriptor in DESCRIPTORS {
            let value: Value = serde_json::from_str(descriptor.meta.default_config).unwrap();
            assert!(value.is_object(), "{}", descriptor.name());
        }
    }
}
