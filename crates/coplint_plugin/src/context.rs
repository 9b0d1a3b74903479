//! Read-only view of the current file handed to rules.

use std::path::Path;

use coplint_ast::{SourceBuffer, SourceDocument, Span, Token};

use crate::{Offense, RuleConfig, RuleMeta};

/// Everything a rule may look at while checking one file.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    meta: &'a RuleMeta,
    config: &'a RuleConfig,
    document: &'a SourceDocument,
}

impl<'a> RuleContext<'a> {
    pub fn new(meta: &'a RuleMeta, config: &'a RuleConfig, document: &'a SourceDocument) -> Self {
        Self {
            meta,
            config,
            document,
        }
    }

    pub fn meta(&self) -> &'a RuleMeta {
        self.meta
    }

    /// This rule's slice of the effective configuration.
    pub fn config(&self) -> &'a RuleConfig {
        self.config
    }

    pub fn document(&self) -> &'a SourceDocument {
        self.document
    }

    pub fn buffer(&self) -> &'a SourceBuffer {
        self.document.buffer()
    }

    pub fn path(&self) -> Option<&'a Path> {
        self.document.path()
    }

    /// Source text covered by `span`.
    pub fn source(&self, span: Span) -> &'a str {
        self.document.buffer().slice(span)
    }

    /// Tokens lying entirely within `span`.
    pub fn tokens_in(&self, span: Span) -> &'a [Token] {
        let tokens = self.document.tokens();
        let start = tokens.partition_point(|t| t.span.start < span.start);
        let end = tokens.partition_point(|t| t.span.end <= span.end);
        tokens.get(start..end.max(start)).unwrap_or_default()
    }

    /// Creates an offense attributed to this rule at `span`.
    pub fn offense(&self, span: Span, message: impl Into<String>) -> Offense {
        Offense::new(
            self.meta.name,
            message,
            span,
            self.document.buffer().location(span),
        )
        .with_severity(self.meta.default_severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplint_ast::Position;
    use coplint_parser::{Parser, ScriptParser};
    use pretty_assertions::assert_eq;

    const META: crate::RuleMeta = crate::RuleMeta::new("Lint/Test", "Test rule.")
        .severity(crate::Severity::Warning);

    #[test]
    fn offense_is_attributed_and_located() {
        let doc = ScriptParser::new().parse("x = 1\ny = 22\n").unwrap();
        let config = RuleConfig::enabled();
        let cx = RuleContext::new(&META, &config, &doc);

        let offense = cx.offense(Span::new(10, 12), "two digits");
        assert_eq!(offense.rule, "Lint/Test");
        assert_eq!(offense.severity, crate::Severity::Warning);
        assert_eq!(offense.location.start, Position::new(2, 4));
        assert_eq!(cx.source(offense.span), "22");
    }

    #[test]
    fn tokens_in_returns_contained_tokens() {
        let doc = ScriptParser::new().parse("foo(1, 2)\n").unwrap();
        let config = RuleConfig::enabled();
        let cx = RuleContext::new(&META, &config, &doc);

        let texts: Vec<_> = cx
            .tokens_in(Span::new(3, 9))
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(texts, vec!["(", "1", ",", "2", ")"]);
    }
}
