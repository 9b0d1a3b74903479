//! Metrics/BlockNesting: `if` and `while` nested too deeply.
//!
//! Only the outermost construct past the limit is reported; anything nested
//! inside it is part of the same offense.
//!
//! # Configuration
//!
//! | Option | Type | Default | Description |
//! |--------|------|---------|-------------|
//! | Max | integer | 3 | Deepest allowed nesting |

use std::ops::ControlFlow;

use coplint_ast::{Node, NodeKind, Visitor, walk};
use coplint_plugin::{Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta};
use serde::Deserialize;

use crate::settings;

pub const NAME: &str = "Metrics/BlockNesting";

const META: RuleMeta = RuleMeta::new(NAME, "Avoid excessive block nesting.")
    .config(r#"{ "Max": 3 }"#);

pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(BlockNesting));

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Config {
    max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max: 3 }
    }
}

struct BlockNesting;

impl Rule for BlockNesting {
    fn finish(&mut self, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let config: Config = settings(cx)?;
        let mut depth = NestingDepth {
            max: config.max,
            depth: 0,
            too_deep: Vec::new(),
        };
        walk(cx.document().tree().root(), &mut depth);

        let message = format!("Avoid more than {} levels of block nesting.", config.max);
        Ok(depth
            .too_deep
            .into_iter()
            .map(|node| cx.offense(node.span(), message.clone()))
            .collect())
    }
}

struct NestingDepth<'t> {
    max: usize,
    depth: usize,
    too_deep: Vec<Node<'t>>,
}

fn is_block(node: Node<'_>) -> bool {
    matches!(node.kind(), NodeKind::If | NodeKind::While)
}

impl<'t> Visitor<'t> for NestingDepth<'t> {
    fn enter(&mut self, node: Node<'t>) -> ControlFlow<()> {
        if !is_block(node) {
            return ControlFlow::Continue(());
        }
        self.depth += 1;
        if self.depth > self.max {
            self.too_deep.push(node);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn leave(&mut self, node: Node<'t>) {
        if is_block(node) {
            self.depth -= 1;
        }
    }
}
