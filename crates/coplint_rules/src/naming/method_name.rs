//! Naming/MethodName: method names follow the configured case style.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | EnforcedStyle | `snake_case` \| `camelCase` | `snake_case` | Expected case |
//! | AllowedPatterns | string[] | [] | Regexes for names that are never reported |
//!
//! # Example
//!
//! ```json
//! { "Naming/MethodName": { "AllowedPatterns": ["^on[A-Z]"] } }
//! ```

use std::sync::LazyLock;

use coplint_ast::{Node, NodeKind, TokenKind};
use coplint_plugin::{
    Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta,
};
use regex::Regex;
use serde::Deserialize;

use crate::{compile_patterns, settings};

pub const NAME: &str = "Naming/MethodName";

const META: RuleMeta = RuleMeta::new(NAME, "Checks the case style of method names.")
    .interest(Interest::Kinds(&[NodeKind::Def]))
    .config(
        r#"{ "EnforcedStyle": "snake_case", "SupportedStyles": ["snake_case", "camelCase"], "AllowedPatterns": [] }"#,
    );

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(MethodName));

static SNAKE_CASE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^_*[\p{Ll}\d_]*[?!]?$").ok());
static CAMEL_CASE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^_*\p{Ll}[\p{L}\d]*[?!]?$").ok());

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Config {
    enforced_style: String,
    allowed_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enforced_style: "snake_case".to_string(),
            allowed_patterns: Vec::new(),
        }
    }
}

struct MethodName;

impl Rule for MethodName {
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let Some(name) = node.name() else {
            return Ok(Vec::new());
        };
        let config: Config = settings(cx)?;
        let style = match config.enforced_style.as_str() {
            "snake_case" => &SNAKE_CASE,
            "camelCase" => &CAMEL_CASE,
            other => {
                return Err(RuleError::invalid_parameter(
                    "EnforcedStyle",
                    format!("unsupported style `{other}`"),
                ));
            }
        };
        if style.as_ref().is_none_or(|re| re.is_match(name)) {
            return Ok(Vec::new());
        }
        if compile_patterns("AllowedPatterns", &config.allowed_patterns)?
            .iter()
            .any(|re| re.is_match(name))
        {
            return Ok(Vec::new());
        }

        let span = cx
            .tokens_in(node.span())
            .iter()
            .find(|t| t.kind == TokenKind::Identifier && t.text == name)
            .map_or(node.span(), |t| t.span);
        Ok(vec![cx.offense(
            span,
            format!("Use {} for method names.", config.enforced_style),
        )])
    }
}
