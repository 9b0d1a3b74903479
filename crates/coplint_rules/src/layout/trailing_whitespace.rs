//! Layout/TrailingWhitespace: spaces or tabs at the end of a line.
//!
//! Runs once per file after the traversal and looks at raw lines, so it
//! also sees whitespace after comments and on otherwise empty lines.
//!
//! # Example
//!
//! ```text
//! x = 1␣␣     # offense, corrected to `x = 1`
//! ```

use coplint_ast::Span;
use coplint_plugin::{Edit, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta};

pub const NAME: &str = "Layout/TrailingWhitespace";

const MESSAGE: &str = "Trailing whitespace detected.";

const META: RuleMeta = RuleMeta::new(NAME, "Checks for trailing whitespace.").autocorrect();

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(TrailingWhitespace));

struct TrailingWhitespace;

impl Rule for TrailingWhitespace {
    fn finish(&mut self, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let buffer = cx.buffer();
        let offenses = buffer
            .lines()
            .filter_map(|(_, line)| {
                let text = buffer.slice(line.span());
                let kept = text.trim_end_matches([' ', '\t']).len() as u32;
                (kept < line.span().len()).then(|| {
                    cx.offense(Span::new(line.start + kept, line.end), MESSAGE)
                })
            })
            .collect();
        Ok(offenses)
    }

    fn correct(&self, offense: &Offense, _cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        Ok(Some(Edit::delete(offense.span)))
    }
}
