//! Syntax tree definition.
//!
//! Nodes live in an index arena owned by [`SyntaxTree`]. A [`Node`] is a
//! cheap copyable handle into that arena; parent links are plain indices,
//! so ancestor queries need no reference counting.

use std::fmt;

use serde::Serialize;

use crate::Span;

/// Type tag of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Root of every file.
    Program,
    /// `def name(params) ... end`
    Def,
    /// Parameter list of a `def`.
    Params,
    /// `class Name ... end`
    Class,
    /// `if cond ... end`
    If,
    /// `while cond ... end`
    While,
    /// `name = value`
    Assign,
    /// `name(args)`
    Call,
    /// Argument list of a call.
    Args,
    /// `[a, b]`
    Array,
    /// `(expr)`
    Group,
    /// `lhs op rhs`
    Binary,
    /// Operator of a binary expression.
    Operator,
    Ident,
    Str,
    Int,
    Float,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; 17] = [
        NodeKind::Program,
        NodeKind::Def,
        NodeKind::Params,
        NodeKind::Class,
        NodeKind::If,
        NodeKind::While,
        NodeKind::Assign,
        NodeKind::Call,
        NodeKind::Args,
        NodeKind::Array,
        NodeKind::Group,
        NodeKind::Binary,
        NodeKind::Operator,
        NodeKind::Ident,
        NodeKind::Str,
        NodeKind::Int,
        NodeKind::Float,
    ];

    /// Dense index of this kind, usable for lookup tables.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for nodes that open a block closed by `end`.
    pub const fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Def | NodeKind::Class | NodeKind::If | NodeKind::While
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Program => "program",
            NodeKind::Def => "def",
            NodeKind::Params => "params",
            NodeKind::Class => "class",
            NodeKind::If => "if",
            NodeKind::While => "while",
            NodeKind::Assign => "assign",
            NodeKind::Call => "call",
            NodeKind::Args => "args",
            NodeKind::Array => "array",
            NodeKind::Group => "group",
            NodeKind::Binary => "binary",
            NodeKind::Operator => "operator",
            NodeKind::Ident => "ident",
            NodeKind::Str => "str",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// Decoded string contents.
    Str(String),
    Int(i64),
    Float(f64),
    /// Identifier or operator text.
    Symbol(String),
}

impl Literal {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Literal::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// Index of a node inside its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A child slot: either a nested node or a literal leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Child {
    Node(NodeId),
    Leaf(Literal),
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    children: Vec<Child>,
    parent: Option<NodeId>,
}

/// An immutable syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Returns the root node.
    pub fn root(&self) -> Node<'_> {
        self.node(self.root)
    }

    /// Returns a handle for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree's builder.
    pub fn node(&self, id: NodeId) -> Node<'_> {
        assert!(id.index() < self.nodes.len(), "node id out of range");
        Node { tree: self, id }
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Builds a [`SyntaxTree`] bottom-up.
///
/// Children are created before their parent; [`TreeBuilder::node`] wires the
/// parent links of every nested child.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its id.
    pub fn node(&mut self, kind: NodeKind, span: Span, children: Vec<Child>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in &children {
            if let Child::Node(child_id) = child {
                self.nodes[child_id.index()].parent = Some(id);
            }
        }
        self.nodes.push(NodeData {
            kind,
            span,
            children,
            parent: None,
        });
        id
    }

    /// Convenience for a node holding a single literal.
    pub fn leaf(&mut self, kind: NodeKind, span: Span, literal: Literal) -> NodeId {
        self.node(kind, span, vec![Child::Leaf(literal)])
    }

    /// Span of a node added earlier.
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// Finishes the tree with `root` as its root node.
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree {
            nodes: self.nodes,
            root,
        }
    }
}

/// A handle to a node in a [`SyntaxTree`].
///
/// Equality is identity: two handles are equal only when they refer to the
/// same node of the same tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("span", &self.span())
            .finish()
    }
}

impl<'t> Node<'t> {
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.tree.data(self.id).span
    }

    #[inline]
    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }

    /// All child slots, nodes and leaves, in source order.
    pub fn children(&self) -> &'t [Child] {
        &self.tree.data(self.id).children
    }

    /// Nested child nodes in source order.
    pub fn child_nodes(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let tree = self.tree;
        self.children().iter().filter_map(move |child| match child {
            Child::Node(id) => Some(Node { tree, id: *id }),
            Child::Leaf(_) => None,
        })
    }

    /// Literal leaves in source order.
    pub fn leaves(&self) -> impl Iterator<Item = &'t Literal> + use<'t> {
        self.children().iter().filter_map(|child| match child {
            Child::Leaf(lit) => Some(lit),
            Child::Node(_) => None,
        })
    }

    /// The `index`-th child slot, if it is a node.
    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        match self.children().get(index)? {
            Child::Node(id) => Some(Node {
                tree: self.tree,
                id: *id,
            }),
            Child::Leaf(_) => None,
        }
    }

    /// The `index`-th child slot, if it is a leaf.
    pub fn leaf(&self, index: usize) -> Option<&'t Literal> {
        match self.children().get(index)? {
            Child::Leaf(lit) => Some(lit),
            Child::Node(_) => None,
        }
    }

    /// The first symbol leaf, e.g. the name of an identifier or call.
    pub fn name(&self) -> Option<&'t str> {
        self.leaves().find_map(Literal::as_symbol)
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.tree.data(self.id).parent.map(|id| Node {
            tree: self.tree,
            id,
        })
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Position of this node among its parent's node children.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.child_nodes().position(|n| n == *self)
    }

    /// Sibling nodes, excluding this node.
    pub fn siblings(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        let me = *self;
        self.parent()
            .into_iter()
            .flat_map(|parent| parent.child_nodes())
            .filter(move |n| *n != me)
    }

    pub fn previous_sibling(&self) -> Option<Node<'t>> {
        let index = self.index_in_parent()?;
        let parent = self.parent()?;
        index
            .checked_sub(1)
            .and_then(|i| parent.child_nodes().nth(i))
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let index = self.index_in_parent()?;
        self.parent()?.child_nodes().nth(index + 1)
    }

    /// This node and all nodes below it, in pre-order.
    pub fn descendants(&self) -> crate::Preorder<'t> {
        crate::Preorder::new(*self)
    }

    /// Nearest ancestor of the given kind.
    pub fn enclosing(&self, kind: NodeKind) -> Option<Node<'t>> {
        self.ancestors().find(|n| n.is(kind))
    }
}
