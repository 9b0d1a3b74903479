//! Tree traversal.

use std::ops::ControlFlow;

use crate::Node;

/// Pre-order iterator: parent before children, children in source order.
///
/// Iterative, so deeply nested input cannot overflow the stack.
#[derive(Debug)]
pub struct Preorder<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Preorder<'t> {
    pub fn new(root: Node<'t>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.child_nodes());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Callbacks for a depth-first walk with both enter and leave events.
pub trait Visitor<'t> {
    /// Called before the children of `node`. Returning `Break` skips them.
    fn enter(&mut self, node: Node<'t>) -> ControlFlow<()> {
        let _ = node;
        ControlFlow::Continue(())
    }

    /// Called after the children of `node` (also when they were skipped).
    fn leave(&mut self, node: Node<'t>) {
        let _ = node;
    }
}

/// Walks the subtree rooted at `root`, calling `visitor` on every node.
pub fn walk<'t, V: Visitor<'t> + ?Sized>(root: Node<'t>, visitor: &mut V) {
    enum Step<'t> {
        Enter(Node<'t>),
        Leave(Node<'t>),
    }

    let mut stack = vec![Step::Enter(root)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                stack.push(Step::Leave(node));
                if visitor.enter(node).is_continue() {
                    let start = stack.len();
                    stack.extend(node.child_nodes().map(Step::Enter));
                    stack[start..].reverse();
                }
            }
            Step::Leave(node) => visitor.leave(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Child, Literal, NodeKind, Span, SyntaxTree, TreeBuilder};
    use pretty_assertions::assert_eq;

    /// program(assign(x, binary(1, +, 2)), ident(y))
    fn tree() -> SyntaxTree {
        let mut b = TreeBuilder::new();
        let one = b.leaf(NodeKind::Int, Span::new(4, 5), Literal::Int(1));
        let plus = b.leaf(NodeKind::Operator, Span::new(6, 7), Literal::Symbol("+".into()));
        let two = b.leaf(NodeKind::Int, Span::new(8, 9), Literal::Int(2));
        let binary = b.node(
            NodeKind::Binary,
            Span::new(4, 9),
            vec![Child::Node(one), Child::Node(plus), Child::Node(two)],
        );
        let assign = b.node(
            NodeKind::Assign,
            Span::new(0, 9),
            vec![Child::Leaf(Literal::Symbol("x".into())), Child::Node(binary)],
        );
        let y = b.leaf(NodeKind::Ident, Span::new(10, 11), Literal::Symbol("y".into()));
        let root = b.node(
            NodeKind::Program,
            Span::new(0, 11),
            vec![Child::Node(assign), Child::Node(y)],
        );
        b.finish(root)
    }

    #[test]
    fn preorder_visits_parents_first() {
        let tree = tree();
        let kinds: Vec<_> = tree.root().descendants().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Program,
                NodeKind::Assign,
                NodeKind::Binary,
                NodeKind::Int,
                NodeKind::Operator,
                NodeKind::Int,
                NodeKind::Ident,
            ]
        );
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl<'t> Visitor<'t> for Recorder {
        fn enter(&mut self, node: Node<'t>) -> ControlFlow<()> {
            self.events.push(format!("+{}", node.kind()));
            if node.is(NodeKind::Binary) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }

        fn leave(&mut self, node: Node<'t>) {
            self.events.push(format!("-{}", node.kind()));
        }
    }

    #[test]
    fn walk_emits_enter_and_leave_and_can_skip() {
        let tree = tree();
        let mut recorder = Recorder::default();
        walk(tree.root(), &mut recorder);

        assert_eq!(
            recorder.events,
            vec![
                "+program", "+assign", "+binary", "-binary", "-assign", "+ident", "-ident",
                "-program"
            ]
        );
    }
}
