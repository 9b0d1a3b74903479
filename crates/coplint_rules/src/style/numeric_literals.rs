//! Style/NumericLiterals: large numbers grouped with `_` every three digits.
//!
//! Only the integer part of a float is considered.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | MinDigits | integer | 5 | Shortest integer part that must be grouped |
//! | Strict | boolean | false | Also reject a short trailing group (`10_00`) |
//!
//! # Example
//!
//! ```json
//! { "Style/NumericLiterals": { "MinDigits": 6, "Strict": true } }
//! ```

use std::sync::LazyLock;

use coplint_ast::{Node, NodeKind};
use coplint_plugin::{
    Edit, Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta,
};
use regex::Regex;
use serde::Deserialize;

use crate::settings;

pub const NAME: &str = "Style/NumericLiterals";

const MESSAGE: &str = "Add underscores to large numeric literals to improve their readability.";

const META: RuleMeta = RuleMeta::new(NAME, "Checks for big numeric literals without `_` in them.")
    .interest(Interest::Kinds(&[NodeKind::Int, NodeKind::Float]))
    .autocorrect()
    .config(r#"{ "MinDigits": 5, "Strict": false }"#);

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(NumericLiterals));

static LONG_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d{4}").ok());
static SHORT_GROUP: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"_\d{1,2}_").ok());
static SHORT_LAST_GROUP: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"_\d{1,2}(_|$)").ok());

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Config {
    min_digits: usize,
    strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_digits: 5,
            strict: false,
        }
    }
}

struct NumericLiterals;

impl Rule for NumericLiterals {
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let config: Config = settings(cx)?;
        let literal = Literal::split(cx.source(node.span()));
        if !literal.is_misgrouped(&config) {
            return Ok(Vec::new());
        }
        Ok(vec![cx.offense(node.span(), MESSAGE)])
    }

    fn correct(&self, offense: &Offense, cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        let literal = Literal::split(cx.source(offense.span));
        Ok(Some(Edit::new(offense.span, literal.regrouped())))
    }
}

/// A numeric literal split into sign, integer part and the rest.
struct Literal<'a> {
    sign: &'a str,
    integer: &'a str,
    rest: &'a str,
}

impl<'a> Literal<'a> {
    fn split(text: &'a str) -> Self {
        let (sign, unsigned) = match text.strip_prefix('-') {
            Some(unsigned) => ("-", unsigned),
            None => ("", text),
        };
        let end = unsigned.find('.').unwrap_or(unsigned.len());
        let (integer, rest) = unsigned.split_at(end);
        Self {
            sign,
            integer,
            rest,
        }
    }

    fn digits(&self) -> String {
        self.integer.chars().filter(|c| *c != '_').collect()
    }

    fn is_misgrouped(&self, config: &Config) -> bool {
        if self.digits().len() < config.min_digits {
            return false;
        }
        let short = if config.strict {
            &SHORT_LAST_GROUP
        } else {
            &SHORT_GROUP
        };
        let matches = |re: &LazyLock<Option<Regex>>| {
            re.as_ref().is_some_and(|re| re.is_match(self.integer))
        };
        !self.integer.contains('_') || matches(&LONG_RUN) || matches(short)
    }

    fn regrouped(&self) -> String {
        let digits = self.digits();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('_');
            }
            grouped.push(c);
        }
        format!("{}{grouped}{}", self.sign, self.rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{correct, inspect};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("1234", false, false)]
    #[case("12345", false, true)]
    #[case("12_345", false, false)]
    #[case("1_2345", false, true)]
    #[case("1_23_456", false, true)]
    #[case("123_45", false, false)]
    #[case("123_45", true, true)]
    #[case("-100000", false, true)]
    #[case("10000.5", false, true)]
    #[case("1.23456", false, false)]
    fn detects_misgrouped_literals(#[case] text: &str, #[case] strict: bool, #[case] expected: bool) {
        let config = Config {
            strict,
            ..Config::default()
        };
        assert_eq!(Literal::split(text).is_misgrouped(&config), expected);
    }

    #[rstest]
    #[case("12345", "12_345")]
    #[case("1234567", "1_234_567")]
    #[case("-100000", "-100_000")]
    #[case("1_23_456", "123_456")]
    #[case("10000.25", "10_000.25")]
    fn regroups_digits(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(Literal::split(text).regrouped(), expected);
    }

    #[test]
    fn min_digits_is_configurable() {
        let src = "x = 123456\n";
        assert_eq!(inspect(DESCRIPTOR, src, json!({})).len(), 1);
        assert!(inspect(DESCRIPTOR, src, json!({ "MinDigits": 7 })).is_empty());
    }

    #[test]
    fn corrects_in_place() {
        assert_eq!(
            correct(DESCRIPTOR, "f(100000, 12, -2500000)\n", json!({})),
            "f(100_000, 12, -2_500_000)\n"
        );
    }
}
