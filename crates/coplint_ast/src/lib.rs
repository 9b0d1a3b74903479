//! # coplint_ast
//!
//! Syntax tree definitions for coplint.
//!
//! The tree is an index arena: nodes are stored in one vector per file and
//! addressed through copyable [`Node`] handles that know their parent, so
//! rules can ask for ancestors and siblings without owning anything.
//!
//! ## Example
//!
//! ```rust
//! use coplint_ast::{Child, Literal, NodeKind, Span, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new();
//! let value = builder.leaf(NodeKind::Int, Span::new(4, 5), Literal::Int(1));
//! let assign = builder.node(
//!     NodeKind::Assign,
//!     Span::new(0, 5),
//!     vec![Child::Leaf(Literal::Symbol("x".into())), Child::Node(value)],
//! );
//! let tree = builder.finish(assign);
//!
//! assert_eq!(tree.root().child(1).map(|n| n.kind()), Some(NodeKind::Int));
//! ```

mod document;
mod node;
pub mod pattern;
mod source;
mod span;
mod token;
pub mod visitor;

pub use document::SourceDocument;
pub use node::{Child, Literal, Node, NodeId, NodeKind, SyntaxTree, TreeBuilder};
pub use source::{LineInfo, SourceBuffer};
pub use span::{Location, Position, Span};
pub use token::{Comment, Token, TokenKind};
pub use visitor::{Preorder, Visitor, walk};
