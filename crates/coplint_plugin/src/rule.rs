//! The rule trait and its static descriptor.

use coplint_ast::{Node, NodeKind};

use crate::{Edit, Offense, RuleContext, RuleError, Severity};

/// Which nodes a rule wants to be called for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    /// Every node.
    All,
    /// Only nodes of these kinds.
    Kinds(&'static [NodeKind]),
    /// No nodes; the rule only runs its end-of-file hook.
    None,
}

impl Interest {
    /// Returns true if a rule with this interest wants `kind`.
    pub fn wants(&self, kind: NodeKind) -> bool {
        match self {
            Interest::All => true,
            Interest::Kinds(kinds) => kinds.contains(&kind),
            Interest::None => false,
        }
    }
}

/// Static description of a rule.
///
/// Built in `const` context with the builder methods:
///
/// ```rust
/// use coplint_plugin::{RuleMeta, Severity};
///
/// const META: RuleMeta = RuleMeta::new("Layout/LineLength", "Checks line length.")
///     .severity(Severity::Convention)
///     .config(r#"{ "Max": 80 }"#);
/// assert_eq!(META.department(), "Layout");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMeta {
    /// Qualified name, `Department/Name`.
    pub name: &'static str,
    pub description: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
    pub interest: Interest,
    /// Whether the rule implements [`Rule::correct`].
    pub autocorrect: bool,
    /// Immutable rules cannot be disabled by configuration.
    pub immutable: bool,
    /// JSON object with the default value of every supported parameter.
    pub default_config: &'static str,
}

impl RuleMeta {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            default_severity: Severity::Convention,
            enabled_by_default: true,
            interest: Interest::None,
            autocorrect: false,
            immutable: false,
            default_config: "{}",
        }
    }

    pub const fn severity(mut self, severity: Severity) -> Self {
        self.default_severity = severity;
        self
    }

    pub const fn interest(mut self, interest: Interest) -> Self {
        self.interest = interest;
        self
    }

    pub const fn autocorrect(mut self) -> Self {
        self.autocorrect = true;
        self
    }

    pub const fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub const fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub const fn config(mut self, default_config: &'static str) -> Self {
        self.default_config = default_config;
        self
    }

    /// Department part of the name.
    pub fn department(&self) -> &'static str {
        self.name.split_once('/').map_or(self.name, |(dept, _)| dept)
    }

    /// Name without the department.
    pub fn short_name(&self) -> &'static str {
        self.name.split_once('/').map_or(self.name, |(_, name)| name)
    }
}

/// A rule implementation.
///
/// A fresh instance is created for every file, so fields may hold scratch
/// state collected during one traversal. Rules see the tree read-only and
/// report offenses and edits as return values.
pub trait Rule {
    /// Called once for every node the rule is interested in, in pre-order.
    fn check(&mut self, node: Node<'_>, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let _ = (node, cx);
        Ok(Vec::new())
    }

    /// Called once after the traversal.
    fn finish(&mut self, cx: &RuleContext<'_>) -> Result<Vec<Offense>, RuleError> {
        let _ = cx;
        Ok(Vec::new())
    }

    /// Returns the edit that fixes `offense`, if the rule can produce one.
    ///
    /// Only called for offenses this rule reported in the current pass.
    fn correct(&self, offense: &Offense, cx: &RuleContext<'_>) -> Result<Option<Edit>, RuleError> {
        let _ = (offense, cx);
        Ok(None)
    }
}

/// Creates a fresh rule instance.
pub type RuleFactory = fn() -> Box<dyn Rule>;

/// Registry entry: static metadata plus a factory.
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor {
    pub meta: RuleMeta,
    pub factory: RuleFactory,
}

impl RuleDescriptor {
    pub const fn new(meta: RuleMeta, factory: RuleFactory) -> Self {
        Self { meta, factory }
    }

    /// Creates a new instance of the rule.
    pub fn instantiate(&self) -> Box<dyn Rule> {
        (self.factory)()
    }

    pub fn name(&self) -> &'static str {
        self.meta.name
    }
}
