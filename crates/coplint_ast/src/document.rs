//! Parsed representation of one file.

use std::path::{Path, PathBuf};

use crate::{Comment, SourceBuffer, SyntaxTree, Token};

/// Syntax tree, tokens, comments and text of one file for one pass.
///
/// Built once by a parser and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: Option<PathBuf>,
    buffer: SourceBuffer,
    tree: SyntaxTree,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl SourceDocument {
    pub fn new(
        buffer: SourceBuffer,
        tree: SyntaxTree,
        tokens: Vec<Token>,
        comments: Vec<Comment>,
    ) -> Self {
        Self {
            path: None,
            buffer,
            tree,
            tokens,
            comments,
        }
    }

    /// Attaches the path the document was read from.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Comments starting on the given 1-indexed line.
    pub fn comments_on_line(&self, line: u32) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .filter(move |c| c.line(&self.buffer) == line)
    }
}
