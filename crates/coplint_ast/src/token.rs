//! Lexical tokens and comments.

use serde::Serialize;

use crate::{SourceBuffer, Span};

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Identifier,
    Keyword,
    Integer,
    Float,
    String,
    Operator,
    Punctuation,
    Newline,
}

/// A lexical unit with its source range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

/// A source comment, kept apart from the tree.
///
/// Comments are related to nodes by position only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub span: Span,
    /// Full comment text, including the leading `#`.
    pub text: String,
}

impl Comment {
    /// Creates a new comment.
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    /// Line the comment starts on.
    pub fn line(&self, buffer: &SourceBuffer) -> u32 {
        buffer.position(self.span.start).line
    }

    /// Returns true when code precedes the comment on its line.
    pub fn is_trailing(&self, buffer: &SourceBuffer) -> bool {
        let line = self.line(buffer);
        buffer
            .line(line)
            .map(|info| {
                let before = Span::new(info.start, self.span.start);
                !buffer.slice(before).trim().is_empty()
            })
            .unwrap_or(false)
    }
}
