//! Parse error types.

use coplint_ast::Position;
use thiserror::Error;

/// Errors that can occur during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The source text is not valid for the grammar.
    #[error("{message} (line {}, column {})", position.line, position.column)]
    Syntax {
        /// Error message.
        message: String,
        /// Where the error was detected.
        position: Position,
    },

    /// The input bytes are not valid UTF-8.
    #[error("invalid byte sequence in UTF-8 (line {}, column {})", position.line, position.column)]
    InvalidEncoding {
        /// Position of the first invalid byte.
        position: Position,
    },
}

impl ParseError {
    /// Creates a new syntax error.
    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Creates a new encoding error.
    pub fn invalid_encoding(position: Position) -> Self {
        Self::InvalidEncoding { position }
    }

    /// Where the error was detected.
    pub fn position(&self) -> Position {
        match self {
            Self::Syntax { position, .. } | Self::InvalidEncoding { position } => *position,
        }
    }

    /// The message without the position suffix.
    pub fn message(&self) -> String {
        match self {
            Self::Syntax { message, .. } => message.clone(),
            Self::InvalidEncoding { .. } => "invalid byte sequence in UTF-8".to_string(),
        }
    }
}
