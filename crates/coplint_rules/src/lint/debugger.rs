//! Lint/Debugger: calls to debugger entry points left in the code.
//!
//! Both `byebug` and `byebug()` are reported.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | DebuggerMethods | string[] | see below | Method names that start a debugger |
//!
//! Default methods: `binding.irb`, `binding.pry`, `byebug`, `debugger`,
//! `remote_byebug`.
//!
//! # Example
//!
//! ```json
//! { "Lint/Debugger": { "DebuggerMethods": ["debugger", "breakpoint"] } }
//! ```

use coplint_ast::pattern::{self, Pattern};
use coplint_ast::{Node, NodeKind};
use coplint_plugin::{
    Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta, Severity,
};
use serde::Deserialize;

use crate::settings;

pub const NAME: &str = "Lint/Debugger";

const DEFAULT_METHODS: &[&str] = &["binding.irb", "binding.pry", "byebug", "debugger", "remote_byebug"];

const META: RuleMeta = RuleMeta::new(NAME, "Checks for debugger calls.")
    .severity(Severity::Warning)
    .interest(Interest::Kinds(&[NodeKind::Call, NodeKind::Ident]))
    .config(
        r#"{ "DebuggerMethods": ["binding.irb", "binding.pry", "byebug", "debugger", "remote_byebug"] }"#,
    );

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(Debugger::default()));

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Config {
    debugger_methods: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debugger_methods: DEFAULT_METHODS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

#[derive(Default)]
struct Debugger {
    /// Built from the configuration on the first node.
    pattern: Option<Pattern>,
}

impl Rule for Debugger {
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let pattern = match self.pattern.take() {
            Some(pattern) => pattern,
            None => {
                let config: Config = settings(cx)?;
                pattern::any_kind([NodeKind::Call, NodeKind::Ident])
                    .and(pattern::symbol_in(config.debugger_methods))
            }
        };
        let matched = pattern.matches(node);
        self.pattern = Some(pattern);

        if !matched {
            return Ok(Vec::new());
        }
        let source = cx.source(node.span());
        Ok(vec![cx.offense(
            node.span(),
            format!("Remove debugger entry point `{source}`."),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inspect, positions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reports_calls_and_bare_references() {
        let src = "def run\n  binding.pry\n  byebug()\n  debug_log(1)\nend\n";
        let offenses = inspect(DESCRIPTOR, src, json!({}));
        assert_eq!(
            positions(&offenses),
            vec![
                (2, 2, "Remove debugger entry point `binding.pry`.".to_string()),
                (3, 2, "Remove debugger entry point `byebug()`.".to_string()),
            ]
        );
        assert!(offenses.iter().all(|o| o.severity == Severity::Warning));
    }

    #[test]
    fn methods_are_configurable() {
        let src = "breakpoint()\ndebugger\n";
        let offenses = inspect(DESCRIPTOR, src, json!({ "DebuggerMethods": ["breakpoint"] }));
        assert_eq!(offenses.len(), 1);
        assert_eq!(offenses[0].line(), 1);
    }

    #[test]
    fn assignments_to_a_debugger_name_are_not_calls() {
        assert!(inspect(DESCRIPTOR, "debugger = 1\n", json!({})).is_empty());
    }
}
