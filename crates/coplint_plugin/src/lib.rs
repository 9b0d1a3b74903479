//! # coplint_plugin
//!
//! The interface between the coplint engine and individual rules.
//!
//! This crate provides:
//! - [`Rule`], the trait every rule implements
//! - [`RuleMeta`] / [`RuleDescriptor`], the static record the registry stores
//! - [`RuleContext`], the read-only view a rule gets of the current file
//! - [`Offense`] and [`Edit`], the values rules hand back to the engine
//!
//! ## Example
//!
//! ```rust
//! use coplint_ast::{Node, NodeKind};
//! use coplint_plugin::{Interest, Offense, Rule, RuleContext, RuleDescriptor, RuleError, RuleMeta};
//!
//! const META: RuleMeta = RuleMeta::new("Lint/Example", "Flags every integer.")
//!     .interest(Interest::Kinds(&[NodeKind::Int]));
//!
//! #[derive(Default)]
//! struct Example;
//!
//! impl Rule for Example {
//!     fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
//!         Ok(vec![cx.offense(node.span(), "integer found")])
//!     }
//! }
//!
//! pub const DESCRIPTOR: RuleDescriptor = RuleDescriptor::new(META, || Box::new(Example));
//! ```

mod config;
mod context;
mod diagnostic;
mod error;
mod rule;

pub use config::RuleConfig;
pub use context::RuleContext;
pub use diagnostic::{CorrectionStatus, Edit, Offense, Severity};
pub use error::{ParseSeverityError, RuleError};
pub use rule::{Interest, Rule, RuleDescriptor, RuleFactory, RuleMeta};
