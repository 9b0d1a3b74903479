//! Layout/SpaceAroundOperators: binary and assignment operators need a
//! space on each side.
//!
//! A line break after an operator counts as space.
//!
//! # Example
//!
//! ```text
//! x=a+1      # two offenses, corrected to `x = a + 1`
//! ```

use coplint_ast::{Node, NodeKind, Span, TokenKind};
use coplint_plugin::{
    Edit, Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta,
};

pub const NAME: &str = "Layout/SpaceAroundOperators";

const META: RuleMeta = RuleMeta::new(NAME, "Checks that operators have space around them.")
    .interest(Interest::Kinds(&[NodeKind::Operator, NodeKind::Assign]))
    .autocorrect();

pub const DESCRIPTOR: RuleDescriptor =
    RuleDescriptor::new(META, || Box::new(SpaceAroundOperators));

struct SpaceAroundOperators;

impl Rule for SpaceAroundOperators {
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let operator = if node.is(NodeKind::Assign) {
            cx.tokens_in(node.span())
                .iter()
                .find(|t| t.kind == TokenKind::Operator && t.text == "=")
                .map(|t| t.span)
        } else {
            Some(node.span())
        };
        let Some(span) = operator else {
            return Ok(Vec::new());
        };

        let (before, after) = missing_space(cx, span);
        if !before && !after {
            return Ok(Vec::new());
        }
        let op = cx.source(span);
        Ok(vec![cx.offense(
            span,
            format!("Surrounding space missing for operator `{op}`."),
        )])
    }

    fn correct(&self, offense: &Offense, cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        let (before, after) = missing_space(cx, offense.span);
        let op = cx.source(offense.span);
        let replacement = format!(
            "{}{op}{}",
            if before { " " } else { "" },
            if after { " " } else { "" }
        );
        Ok(Some(Edit::new(offense.span, replacement)))
    }
}

/// Whether the space before and the space after `span` are missing.
fn missing_space(cx: &RuleContext<'_>, span: Span) -> (bool, bool) {
    let text = cx.buffer().text();
    let before = text
        .get(..span.start as usize)
        .and_then(|s| s.chars().next_back())
        .is_some_and(|c| !c.is_whitespace());
    let after = text
        .get(span.end as usize..)
        .and_then(|s| s.chars().next())
        .is_some_and(|c| !c.is_whitespace());
    (before, after)
}
