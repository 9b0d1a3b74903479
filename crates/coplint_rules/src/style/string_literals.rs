//! Style/StringLiterals: consistent quoting of string literals.
//!
//! Only literals whose body reads the same in both quote styles are
//! reported: no backslashes, and no quote character of the preferred style.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | EnforcedStyle | `single_quotes` \| `double_quotes` | `single_quotes` | Preferred quotes |
//!
//! # Example
//!
//! ```json
//! { "Style/StringLiterals": { "EnforcedStyle": "double_quotes" } }
//! ```

use coplint_ast::{Node, NodeKind};
use coplint_plugin::{
    Edit, Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta,
};

pub const NAME: &str = "Style/StringLiterals";

const META: RuleMeta = RuleMeta::new(NAME, "Checks if uses of quotes match the configured preference.")
    .interest(Interest::Kinds(&[NodeKind::Str]))
    .autocorrect()
    .config(
        r#"{ "EnforcedStyle": "single_quotes", "SupportedStyles": ["single_quotes", "double_quotes"] }"#,
    );

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(StringLiterals));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Single,
    Double,
}

impl Style {
    fn from_config(cx: &RuleContext<'_>) -> Result<Self, RuleError> {
        match cx.config().enforced_style().unwrap_or("single_quotes") {
            "single_quotes" => Ok(Style::Single),
            "double_quotes" => Ok(Style::Double),
            other => Err(RuleError::invalid_parameter(
                "EnforcedStyle",
                format!("unsupported style `{other}`"),
            )),
        }
    }

    fn quote(self) -> char {
        match self {
            Style::Single => '\'',
            Style::Double => '"',
        }
    }

    fn message(self) -> &'static str {
        match self {
            Style::Single => {
                "Prefer single-quoted strings when you don't need string interpolation or special symbols."
            }
            Style::Double => {
                "Prefer double-quoted strings unless you need single quotes to avoid extra backslashes for escaping."
            }
        }
    }
}

struct StringLiterals;

impl Rule for StringLiterals {
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let style = Style::from_config(cx)?;
        let text = cx.source(node.span());
        match requote(text, style) {
            Some(_) => Ok(vec![cx.offense(node.span(), style.message())]),
            None => Ok(Vec::new()),
        }
    }

    fn correct(&self, offense: &Offense, cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        let style = Style::from_config(cx)?;
        Ok(requote(cx.source(offense.span), style).map(|text| Edit::new(offense.span, text)))
    }
}

/// `literal` in the preferred quotes, or `None` if it already uses them or
/// cannot switch without changing meaning.
fn requote(literal: &str, style: Style) -> Option<String> {
    let quote = style.quote();
    if literal.starts_with(quote) || literal.len() < 2 {
        return None;
    }
    let body = literal.get(1..literal.len() - 1)?;
    if body.contains('\\') || body.contains(quote) {
        return None;
    }
    Some(format!("{quote}{body}{quote}"))
}
