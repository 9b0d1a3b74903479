//! Records of rules and parameters that no longer exist.
//!
//! Configurations naming an obsolete rule fail with a message pointing at
//! the replacement. Obsolete parameters warn or fail depending on the
//! record.

/// What happened to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleObsoletion {
    Renamed {
        old: String,
        new: String,
    },
    Removed {
        old: String,
        alternatives: Vec<String>,
        reason: Option<String>,
    },
    /// Moved to a separately loaded feature.
    Extracted {
        old: String,
        feature: String,
    },
}

impl RuleObsoletion {
    pub fn renamed(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self::Renamed {
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn removed(old: impl Into<String>) -> Self {
        Self::Removed {
            old: old.into(),
            alternatives: Vec::new(),
            reason: None,
        }
    }

    pub fn extracted(old: impl Into<String>, feature: impl Into<String>) -> Self {
        Self::Extracted {
            old: old.into(),
            feature: feature.into(),
        }
    }

    /// Adds alternatives or a reason to a removal record.
    pub fn with_alternatives<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        if let Self::Removed { alternatives, .. } = &mut self {
            alternatives.extend(names.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_reason(mut self, why: impl Into<String>) -> Self {
        if let Self::Removed { reason, .. } = &mut self {
            *reason = Some(why.into());
        }
        self
    }

    /// True if the record applies to `name`.
    ///
    /// Extraction records may name a whole department (`Performance`) or a
    /// single rule.
    fn applies_to(&self, name: &str) -> bool {
        match self {
            Self::Renamed { old, .. } | Self::Removed { old, .. } => old == name,
            Self::Extracted { old, .. } => {
                old == name
                    || name
                        .split_once('/')
                        .is_some_and(|(department, _)| department == old)
            }
        }
    }

    fn message(&self, name: &str) -> String {
        match self {
            Self::Renamed { old, new } => {
                format!("The `{old}` rule has been renamed to `{new}`.")
            }
            Self::Removed {
                old,
                alternatives,
                reason,
            } => {
                let mut message = format!("The `{old}` rule has been removed");
                if !alternatives.is_empty() {
                    let names: Vec<String> =
                        alternatives.iter().map(|a| format!("`{a}`")).collect();
                    message.push_str(&format!(". Please use {} instead.", names.join(" or ")));
                } else if let Some(reason) = reason {
                    message.push_str(&format!(" since {reason}."));
                } else {
                    message.push('.');
                }
                message
            }
            Self::Extracted { feature, .. } => {
                format!("`{name}` has been extracted to the `{feature}` feature.")
            }
        }
    }
}

/// How hard an obsolete parameter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObsoletionSeverity {
    #[default]
    Warning,
    Error,
}

/// A parameter that was renamed or removed from some rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterObsoletion {
    pub rules: Vec<String>,
    pub parameter: String,
    pub alternative: Option<String>,
    pub reason: Option<String>,
    pub severity: ObsoletionSeverity,
}

impl ParameterObsoletion {
    pub fn new<S: Into<String>>(
        rules: impl IntoIterator<Item = S>,
        parameter: impl Into<String>,
    ) -> Self {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
            parameter: parameter.into(),
            alternative: None,
            reason: None,
            severity: ObsoletionSeverity::Warning,
        }
    }

    pub fn renamed_to(mut self, alternative: impl Into<String>) -> Self {
        self.alternative = Some(alternative.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn fatal(mut self) -> Self {
        self.severity = ObsoletionSeverity::Error;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == ObsoletionSeverity::Error
    }

    pub fn message(&self, rule: &str) -> String {
        let param = &self.parameter;
        let mut message = format!("obsolete parameter `{param}` (for `{rule}`): ");
        match (&self.alternative, &self.reason) {
            (Some(alternative), _) => {
                message.push_str(&format!("`{param}` has been renamed to `{alternative}`."));
            }
            (None, Some(reason)) => message.push_str(&format!("`{param}` has been removed: {reason}.")),
            (None, None) => message.push_str(&format!("`{param}` has been removed.")),
        }
        message
    }
}

/// All obsoletion records known to a registry.
#[derive(Debug, Clone, Default)]
pub struct Obsoletions {
    rules: Vec<RuleObsoletion>,
    parameters: Vec<ParameterObsoletion>,
}

impl Obsoletions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, record: RuleObsoletion) {
        self.rules.push(record);
    }

    pub fn add_parameter(&mut self, record: ParameterObsoletion) {
        self.parameters.push(record);
    }

    /// The message for an obsolete rule name, if `name` is obsolete.
    ///
    /// Extraction records are ignored once the feature is loaded.
    pub fn rule_message(&self, name: &str, has_feature: impl Fn(&str) -> bool) -> Option<String> {
        self.rules
            .iter()
            .filter(|record| record.applies_to(name))
            .find(|record| match record {
                RuleObsoletion::Extracted { feature, .. } => !has_feature(feature),
                _ => true,
            })
            .map(|record| record.message(name))
    }

    pub fn parameter(&self, rule: &str, parameter: &str) -> Option<&ParameterObsoletion> {
        self.parameters
            .iter()
            .find(|p| p.parameter == parameter && p.rules.iter().any(|r| r == rule))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.parameters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn records() -> Obsoletions {
        let mut o = Obsoletions::new();
        o.add_rule(RuleObsoletion::renamed("Style/DoubleQuotes", "Style/StringLiterals"));
        o.add_rule(
            RuleObsoletion::removed("Lint/Eval").with_alternatives(["Security/Eval"]),
        );
        o.add_rule(RuleObsoletion::removed("Style/Tabs").with_reason("tabs are a layout concern"));
        o.add_rule(RuleObsoletion::extracted("Performance", "coplint-performance"));
        o.add_parameter(
            ParameterObsoletion::new(["Layout/LineLength"], "IgnoredPatterns")
                .renamed_to("AllowedPatterns"),
        );
        o.add_parameter(ParameterObsoletion::new(["Style/Foo"], "Legacy").fatal());
        o
    }

    #[test]
    fn renamed_rule_message() {
        assert_eq!(
            records().rule_message("Style/DoubleQuotes", |_| false).as_deref(),
            Some("The `Style/DoubleQuotes` rule has been renamed to `Style/StringLiterals`.")
        );
    }

    #[test]
    fn removed_rule_messages() {
        let o = records();
        assert_eq!(
            o.rule_message("Lint/Eval", |_| false).as_deref(),
            Some("The `Lint/Eval` rule has been removed. Please use `Security/Eval` instead.")
        );
        assert_eq!(
            o.rule_message("Style/Tabs", |_| false).as_deref(),
            Some("The `Style/Tabs` rule has been removed since tabs are a layout concern.")
        );
    }

    #[test]
    fn extraction_depends_on_loaded_features() {
        let o = records();
        assert_eq!(
            o.rule_message("Performance/Count", |_| false).as_deref(),
            Some("`Performance/Count` has been extracted to the `coplint-performance` feature.")
        );
        assert_eq!(
            o.rule_message("Performance/Count", |f| f == "coplint-performance"),
            None
        );
        assert_eq!(o.rule_message("Style/StringLiterals", |_| false), None);
    }

    #[test]
    fn parameter_records() {
        let o = records();
        let renamed = o.parameter("Layout/LineLength", "IgnoredPatterns").unwrap();
        assert!(!renamed.is_error());
        assert_eq!(
            renamed.message("Layout/LineLength"),
            "obsolete parameter `IgnoredPatterns` (for `Layout/LineLength`): `IgnoredPatterns` has been renamed to `AllowedPatterns`."
        );
        assert!(o.parameter("Style/Foo", "Legacy").unwrap().is_error());
        assert!(o.parameter("Layout/LineLength", "Legacy").is_none());
    }
}
