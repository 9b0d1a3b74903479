//! Layout/LineLength: lines longer than a configured maximum.
//!
//! Length is counted in characters, not bytes.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | Max | integer | 80 | Longest allowed line |
//! | AllowedPatterns | string[] | [] | Regexes; matching lines are never reported |
//! | AllowURI | boolean | true | Ignore lines whose overflow is a URI running to the end of the line |
//!
//! # Example
//!
//! ```json
//! {
//!   "Layout/LineLength": {
//!     "Max": 100,
//!     "AllowedPatterns": ["^\\s*# "]
//!   }
//! }
//! ```

use std::sync::LazyLock;

use coplint_ast::Span;
use coplint_plugin::{Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta};
use regex::Regex;
use serde::Deserialize;

use crate::{compile_patterns, settings};

pub const NAME: &str = "Layout/LineLength";

const META: RuleMeta = RuleMeta::new(NAME, "Checks that lines are not too long.")
    .config(r#"{ "Max": 80, "AllowedPatterns": [], "AllowURI": true }"#);

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(LineLength));

static URI: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://\S+").ok());

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Config {
    max: usize,
    allowed_patterns: Vec<String>,
    #[serde(rename = "AllowURI")]
    allow_uri: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max: 80,
            allowed_patterns: Vec::new(),
            allow_uri: true,
        }
    }
}

struct LineLength;

impl Rule for LineLength {
    fn finish(&mut self, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let config: Config = settings(cx)?;
        let allowed = compile_patterns("AllowedPatterns", &config.allowed_patterns)?;
        let buffer = cx.buffer();

        let mut offenses = Vec::new();
        for (_, line) in buffer.lines() {
            let text = buffer.slice(line.span());
            let length = text.chars().count();
            if length <= config.max
                || allowed.iter().any(|re| re.is_match(text))
                || (config.allow_uri && ends_with_uri(text, config.max))
            {
                continue;
            }
            let overflow = text
                .char_indices()
                .nth(config.max)
                .map_or(text.len(), |(i, _)| i) as u32;
            offenses.push(cx.offense(
                Span::new(line.start + overflow, line.end),
                format!("Line is too long. [{length}/{}]", config.max),
            ));
        }
        Ok(offenses)
    }
}

/// True if the line ends in a URI that starts within the limit.
fn ends_with_uri(text: &str, max: usize) -> bool {
    let Some(uri) = URI.as_ref().and_then(|re| re.find_iter(text).last()) else {
        return false;
    };
    uri.end() == text.trim_end().len() && text[..uri.start()].chars().count() <= max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inspect, positions};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn reports_from_the_first_character_past_the_limit() {
        let offenses = inspect(DESCRIPTOR, "x = 1\nlonger = 12345\n", json!({ "Max": 10 }));
        assert_eq!(
            positions(&offenses),
            vec![(2, 10, "Line is too long. [14/10]".to_string())]
        );
        assert_eq!(offenses[0].span, Span::new(16, 20));
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(inspect(DESCRIPTOR, "s = 'ééééé'\n", json!({ "Max": 11 })).is_empty());
        assert_eq!(inspect(DESCRIPTOR, "s = 'ééééé'\n", json!({ "Max": 10 })).len(), 1);
    }

    #[test]
    fn default_limit_is_eighty() {
        let line = format!("x = '{}'\n", "a".repeat(74));
        assert!(inspect(DESCRIPTOR, &line, json!({})).is_empty());
        let line = format!("x = '{}'\n", "a".repeat(75));
        assert_eq!(inspect(DESCRIPTOR, &line, json!({})).len(), 1);
    }

    #[test]
    fn allowed_patterns_skip_lines() {
        let src = "# https://example.com/a/very/long/path\nvalue = 1234567890\n";
        let offenses = inspect(
            DESCRIPTOR,
            src,
            json!({ "Max": 10, "AllowedPatterns": ["^value"], "AllowURI": false }),
        );
        assert_eq!(offenses.len(), 1);
        assert_eq!(offenses[0].line(), 1);
    }

    #[rstest]
    #[case("# see https://example.com/a/very/long/path\n", 0)]
    #[case("# see https://example.com/a/very/long/path and more\n", 1)]
    #[case("# a comment that is much too long before https://x.y\n", 1)]
    fn uris_at_the_end_of_a_line_are_allowed(#[case] src: &str, #[case] expected: usize) {
        assert_eq!(inspect(DESCRIPTOR, src, json!({ "Max": 20 })).len(), expected);
    }

    #[test]
    fn invalid_pattern_is_a_rule_failure() {
        let offenses = inspect(DESCRIPTOR, "x = 1\n", json!({ "AllowedPatterns": ["("] }));
        assert!(offenses.is_empty());
    }
}
