//! Offense and edit types.

use std::fmt;
use std::str::FromStr;

use coplint_ast::{Location, Span};
use serde::{Deserialize, Serialize};

use crate::ParseSeverityError;

/// Severity level for offenses, in ascending order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Refactor,
    #[default]
    Convention,
    Warning,
    Error,
    /// Reserved for problems that stop a file from being inspected.
    Fatal,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Info,
        Severity::Refactor,
        Severity::Convention,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Single-letter code used in compact output.
    pub const fn code(self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Refactor => 'R',
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Refactor => "refactor",
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// What happened to the correction for an offense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    /// The rule offers no correction.
    #[default]
    Uncorrectable,
    /// A correction is available but was not applied.
    Correctable,
    /// The correction was applied.
    Corrected,
    /// A correction was offered but conflicted with an earlier one.
    Withheld,
}

impl CorrectionStatus {
    /// Returns true when a correction was offered, applied or not.
    pub const fn is_offered(self) -> bool {
        !matches!(self, CorrectionStatus::Uncorrectable)
    }
}

/// A reported rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offense {
    /// Qualified name of the rule, `Department/Name`.
    pub rule: String,

    pub message: String,

    /// Byte span in the source.
    pub span: Span,

    /// Line/column location of `span`.
    pub location: Location,

    pub severity: Severity,

    #[serde(default)]
    pub correction: CorrectionStatus,
}

impl Offense {
    /// Creates a new offense with the default severity.
    pub fn new(
        rule: impl Into<String>,
        message: impl Into<String>,
        span: Span,
        location: Location,
    ) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            span,
            location,
            severity: Severity::default(),
            correction: CorrectionStatus::Uncorrectable,
        }
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the correction status.
    pub fn with_correction(mut self, correction: CorrectionStatus) -> Self {
        self.correction = correction;
        self
    }

    /// 1-indexed line the offense starts on.
    pub fn line(&self) -> u32 {
        self.location.start.line
    }

    /// Department part of the rule name.
    pub fn department(&self) -> &str {
        self.rule.split_once('/').map_or("", |(dept, _)| dept)
    }

    /// Reporting order: line, then column, then rule name.
    pub fn sort_key(&self) -> (u32, u32, &str) {
        (
            self.location.start.line,
            self.location.start.column,
            self.rule.as_str(),
        )
    }
}

/// A proposed text replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edit {
    /// The byte span to replace.
    pub span: Span,

    /// The replacement text.
    pub replacement: String,
}

impl Edit {
    /// Creates a new edit.
    pub fn new(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    /// Creates an edit that inserts text at a position.
    pub fn insert(offset: u32, text: impl Into<String>) -> Self {
        Self::new(Span::empty(offset), text)
    }

    /// Creates an edit that deletes a span.
    pub fn delete(span: Span) -> Self {
        Self::new(span, String::new())
    }
}
