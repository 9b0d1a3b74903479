//! Rule error types.

use thiserror::Error;

/// Errors a rule callback may return.
///
/// The engine treats any of these like a crash: the rule is disabled for the
/// rest of the file and the failure is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule could not complete its check.
    #[error("{0}")]
    Failed(String),

    /// A configuration parameter has an unusable value.
    #[error("invalid value for parameter `{name}`: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// What is wrong with it.
        message: String,
    },
}

impl RuleError {
    /// Creates a failure error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid severity `{0}`; valid values are info, refactor, convention, warning, error and fatal")]
pub struct ParseSeverityError(pub String);
