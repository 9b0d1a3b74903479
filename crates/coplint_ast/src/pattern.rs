//! Node patterns.
//!
//! Patterns are built from small combinators and matched against a node:
//!
//! ```rust
//! use coplint_ast::pattern::{self, Pattern};
//! use coplint_ast::NodeKind;
//!
//! // `debugger(...)` calls, but not inside a `def` named `debug`
//! let p: Pattern = pattern::kind(NodeKind::Call)
//!     .and(pattern::symbol("debugger"))
//!     .and(pattern::not(pattern::ancestor(
//!         pattern::kind(NodeKind::Def).and(pattern::symbol("debug")),
//!     )));
//! # let _ = p;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{Literal, Node, NodeKind};

type LeafPredicate = Arc<dyn Fn(&Literal) -> bool + Send + Sync>;

/// A composable predicate over syntax nodes.
#[derive(Clone)]
pub enum Pattern {
    /// Matches every node.
    Any,
    Kind(NodeKind),
    AnyKind(Vec<NodeKind>),
    Not(Box<Pattern>),
    All(Vec<Pattern>),
    Either(Vec<Pattern>),
    /// The `index`-th node child matches.
    Child(usize, Box<Pattern>),
    ChildCount(usize),
    /// Some child node matches.
    HasChild(Box<Pattern>),
    Parent(Box<Pattern>),
    /// Some ancestor matches.
    Ancestor(Box<Pattern>),
    /// Some strict descendant matches.
    Descendant(Box<Pattern>),
    /// Some leaf of the node satisfies the predicate.
    Leaf(LeafPredicate),
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("Any"),
            Pattern::Kind(k) => write!(f, "Kind({k})"),
            Pattern::AnyKind(ks) => f.debug_tuple("AnyKind").field(ks).finish(),
            Pattern::Not(p) => f.debug_tuple("Not").field(p).finish(),
            Pattern::All(ps) => f.debug_tuple("All").field(ps).finish(),
            Pattern::Either(ps) => f.debug_tuple("Either").field(ps).finish(),
            Pattern::Child(i, p) => f.debug_tuple("Child").field(i).field(p).finish(),
            Pattern::ChildCount(n) => f.debug_tuple("ChildCount").field(n).finish(),
            Pattern::HasChild(p) => f.debug_tuple("HasChild").field(p).finish(),
            Pattern::Parent(p) => f.debug_tuple("Parent").field(p).finish(),
            Pattern::Ancestor(p) => f.debug_tuple("Ancestor").field(p).finish(),
            Pattern::Descendant(p) => f.debug_tuple("Descendant").field(p).finish(),
            Pattern::Leaf(_) => f.write_str("Leaf(..)"),
        }
    }
}

impl Pattern {
    /// Tests `node` against this pattern.
    pub fn matches(&self, node: Node<'_>) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Kind(kind) => node.is(*kind),
            Pattern::AnyKind(kinds) => kinds.contains(&node.kind()),
            Pattern::Not(p) => !p.matches(node),
            Pattern::All(ps) => ps.iter().all(|p| p.matches(node)),
            Pattern::Either(ps) => ps.iter().any(|p| p.matches(node)),
            Pattern::Child(index, p) => node
                .child_nodes()
                .nth(*index)
                .is_some_and(|child| p.matches(child)),
            Pattern::ChildCount(n) => node.child_nodes().count() == *n,
            Pattern::HasChild(p) => node.child_nodes().any(|child| p.matches(child)),
            Pattern::Parent(p) => node.parent().is_some_and(|parent| p.matches(parent)),
            Pattern::Ancestor(p) => node.ancestors().any(|a| p.matches(a)),
            Pattern::Descendant(p) => node.descendants().skip(1).any(|d| p.matches(d)),
            Pattern::Leaf(pred) => node.leaves().any(|lit| pred(lit)),
        }
    }

    /// All nodes under (and including) `root` that match, in pre-order.
    pub fn find_all<'t>(&self, root: Node<'t>) -> Vec<Node<'t>> {
        root.descendants().filter(|n| self.matches(*n)).collect()
    }

    /// Both patterns must match.
    pub fn and(self, other: Pattern) -> Pattern {
        match self {
            Pattern::All(mut ps) => {
                ps.push(other);
                Pattern::All(ps)
            }
            p => Pattern::All(vec![p, other]),
        }
    }

    /// Either pattern may match.
    pub fn or(self, other: Pattern) -> Pattern {
        match self {
            Pattern::Either(mut ps) => {
                ps.push(other);
                Pattern::Either(ps)
            }
            p => Pattern::Either(vec![p, other]),
        }
    }
}

pub fn any() -> Pattern {
    Pattern::Any
}

pub fn kind(kind: NodeKind) -> Pattern {
    Pattern::Kind(kind)
}

pub fn any_kind(kinds: impl IntoIterator<Item = NodeKind>) -> Pattern {
    Pattern::AnyKind(kinds.into_iter().collect())
}

pub fn not(p: Pattern) -> Pattern {
    Pattern::Not(Box::new(p))
}

pub fn all(ps: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::All(ps.into_iter().collect())
}

pub fn either(ps: impl IntoIterator<Item = Pattern>) -> Pattern {
    Pattern::Either(ps.into_iter().collect())
}

pub fn child(index: usize, p: Pattern) -> Pattern {
    Pattern::Child(index, Box::new(p))
}

pub fn child_count(n: usize) -> Pattern {
    Pattern::ChildCount(n)
}

pub fn has_child(p: Pattern) -> Pattern {
    Pattern::HasChild(Box::new(p))
}

pub fn parent(p: Pattern) -> Pattern {
    Pattern::Parent(Box::new(p))
}

pub fn ancestor(p: Pattern) -> Pattern {
    Pattern::Ancestor(Box::new(p))
}

pub fn has_descendant(p: Pattern) -> Pattern {
    Pattern::Descendant(Box::new(p))
}

/// A symbol leaf (identifier or operator) equal to `name`.
pub fn symbol(name: impl Into<String>) -> Pattern {
    let name = name.into();
    leaf(move |lit| lit.as_symbol() == Some(name.as_str()))
}

/// A symbol leaf equal to any of `names`.
pub fn symbol_in<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Pattern {
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    leaf(move |lit| lit.as_symbol().is_some_and(|s| names.iter().any(|n| n == s)))
}

pub fn string(value: impl Into<String>) -> Pattern {
    let value = value.into();
    leaf(move |lit| lit.as_str() == Some(value.as_str()))
}

pub fn int(value: i64) -> Pattern {
    leaf(move |lit| lit.as_int() == Some(value))
}

pub fn leaf(pred: impl Fn(&Literal) -> bool + Send + Sync + 'static) -> Pattern {
    Pattern::Leaf(Arc::new(pred))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Child, Span, SyntaxTree, TreeBuilder};
    use pretty_assertions::assert_eq;

    /// def debug
    ///   debugger()
    /// end
    /// debugger(1)
    fn tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        let inner_args = b.node(NodeKind::Args, Span::new(25, 27), vec![]);
        let inner = b.node(
            NodeKind::Call,
            Span::new(12, 22),
            vec![Child::Leaf(Literal::Symbol("debugger".into())), Child::Node(inner_args)],
        );
        let def = b.node(
            NodeKind::Def,
            Span::new(0, 26),
            vec![Child::Leaf(Literal::Symbol("debug".into())), Child::Node(inner)],
        );
        let one = b.leaf(NodeKind::Int, Span::new(36, 37), Literal::Int(1));
        let outer_args = b.node(NodeKind::Args, Span::new(35, 38), vec![Child::Node(one)]);
        let outer = b.node(
            NodeKind::Call,
            Span::new(27, 38),
            vec![Child::Leaf(Literal::Symbol("debugger".into())), Child::Node(outer_args)],
        );
        let root = b.node(
            NodeKind::Program,
            Span::new(0, 38),
            vec![Child::Node(def), Child::Node(outer)],
        );
        b.finish(root)
    }

    #[test]
    fn matches_kind_and_symbol() {
        let tree = tree();
        let calls = (kind(NodeKind::Call).and(symbol("debugger"))).find_all(tree.root());
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn negated_ancestor_excludes_nested_calls() {
        let tree = tree();
        let p = kind(NodeKind::Call)
            .and(symbol("debugger"))
            .and(not(ancestor(kind(NodeKind::Def).and(symbol("debug")))));
        let found = p.find_all(tree.root());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span(), Span::new(27, 38));
    }

    #[test]
    fn child_patterns_descend_through_args() {
        let tree = tree();
        let with_int_arg = kind(NodeKind::Call).and(child(0, has_child(int(1))));
        let found = with_int_arg.find_all(tree.root());
        assert_eq!(found.len(), 1);

        let no_args = kind(NodeKind::Call).and(child(0, child_count(0)));
        assert_eq!(no_args.find_all(tree.root()).len(), 1);
    }

    #[test]
    fn either_and_descendant() {
        let tree = tree();
        let p = either([kind(NodeKind::Int), kind(NodeKind::Def)]);
        assert_eq!(p.find_all(tree.root()).len(), 2);

        let defs_with_calls = kind(NodeKind::Def).and(has_descendant(kind(NodeKind::Call)));
        assert_eq!(defs_with_calls.find_all(tree.root()).len(), 1);
        assert!(!has_descendant(kind(NodeKind::Program)).matches(tree.root()));
    }

    #[test]
    fn symbol_in_and_parent() {
        let tree = tree();
        let p = kind(NodeKind::Int).and(parent(kind(NodeKind::Args)));
        assert_eq!(p.find_all(tree.root()).len(), 1);
        assert_eq!(symbol_in(["debug", "pry"]).find_all(tree.root()).len(), 1);
        assert!(!any_kind([NodeKind::Str, NodeKind::Float]).matches(tree.root()));
        assert!(all([any(), kind(NodeKind::Program)]).matches(tree.root()));
    }
}
