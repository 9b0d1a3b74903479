//! Engine error types.

use coplint_ast::Span;
use thiserror::Error;

/// Errors raised while building the rule registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two rules share a qualified name.
    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),

    /// The name is not of the form `Department/Name`.
    #[error("invalid rule name `{0}`: expected `Department/Name`")]
    InvalidName(String),

    /// The rule's default configuration is not a JSON object.
    #[error("invalid default configuration for `{rule}`: {message}")]
    InvalidDefaultConfig { rule: String, message: String },
}

/// Fatal configuration problems.
///
/// Any of these stops a run before a single file is inspected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A configuration file could not be read or parsed.
    #[error("failed to load configuration from {source_name}: {message}")]
    Load { source_name: String, message: String },

    #[error("unrecognized rule or department `{name}` found in {source_name}{}", did_you_mean(.suggestion))]
    UnknownRule {
        name: String,
        source_name: String,
        suggestion: Option<String>,
    },

    /// A bare rule name matches rules in several departments.
    #[error("ambiguous rule name `{name}` found in {source_name}; it could mean {}", candidates.join(", "))]
    AmbiguousRule {
        name: String,
        source_name: String,
        candidates: Vec<String>,
    },

    /// The rule was renamed, removed or moved to a feature that is not loaded.
    #[error("{message} (obsolete configuration found in {source_name})")]
    ObsoleteRule { message: String, source_name: String },

    #[error("{message} (obsolete configuration found in {source_name})")]
    ObsoleteParameter { message: String, source_name: String },

    /// An attempt to disable a rule or department that cannot be disabled.
    #[error("`{name}` cannot be disabled (found in {source_name})")]
    Immutable { name: String, source_name: String },

    #[error("invalid severity `{value}` for `{section}` found in {source_name}; valid severities are {}", valid_severities())]
    InvalidSeverity {
        section: String,
        value: String,
        source_name: String,
    },

    #[error("invalid EnforcedStyle `{value}` for `{rule}` found in {source_name}; supported styles are {}", supported.join(", "))]
    InvalidEnforcedStyle {
        rule: String,
        value: String,
        supported: Vec<String>,
        source_name: String,
    },

    /// `AllCops.Require` names a feature nobody registered.
    #[error("required feature `{feature}` (found in {source_name}) is not available")]
    UnresolvableRequire { feature: String, source_name: String },

    /// A value has the wrong type.
    #[error("`{key}` in {source_name} must be {expected}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        source_name: String,
    },

    #[error("invalid pattern `{pattern}` found in {source_name}: {message}")]
    InvalidPattern {
        pattern: String,
        source_name: String,
        message: String,
    },
}

impl ConfigError {
    /// Creates a load error.
    pub fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_value(
        key: impl Into<String>,
        expected: &'static str,
        source_name: &str,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            expected,
            source_name: source_name.to_string(),
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!("\nDid you mean `{s}`?"))
        .unwrap_or_default()
}

fn valid_severities() -> String {
    coplint_plugin::Severity::ALL
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Violations of the edit-application invariants.
///
/// Planning never produces these; seeing one means an edit list was built
/// by hand or a planner bug slipped through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    #[error("edits at {first:?} and {second:?} overlap")]
    Overlap { first: Span, second: Span },

    #[error("edit at {span:?} is outside the buffer of length {len}")]
    OutOfBounds { span: Span, len: u32 },

    #[error("edit boundary {offset} is not on a character boundary")]
    NotCharBoundary { offset: u32 },
}

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum LinterError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("File error: {0}")]
    File(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LinterError {
    /// Creates a file error.
    pub fn file(message: impl Into<String>) -> Self {
        Self::File(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_rule_mentions_suggestion() {
        let err = ConfigError::UnknownRule {
            name: "Layout/LineLenght".into(),
            source_name: ".coplint.json".into(),
            suggestion: Some("Layout/LineLength".into()),
        };
        assert_eq!(
            err.to_string(),
            "unrecognized rule or department `Layout/LineLenght` found in .coplint.json\nDid you mean `Layout/LineLength`?"
        );
    }

    #[test]
    fn invalid_severity_lists_valid_names() {
        let err = ConfigError::InvalidSeverity {
            section: "Style".into(),
            value: "loud".into(),
            source_name: "cfg".into(),
        };
        assert!(
            err.to_string()
                .ends_with("info, refactor, convention, warning, error, fatal")
        );
    }

    #[test]
    fn config_errors_convert_into_linter_errors() {
        let err: LinterError = ConfigError::load("x.json", "bad").into();
        assert!(matches!(err, LinterError::Config(ConfigError::Load { .. })));
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
