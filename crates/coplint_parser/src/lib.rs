//! # coplint_parser
//!
//! Parsers that turn source text into a [`SourceDocument`].
//!
//! The engine only depends on the [`Parser`] trait; [`ScriptParser`] is the
//! bundled implementation for the line-oriented scripting language coplint
//! ships rules for.
//!
//! [`SourceDocument`]: coplint_ast::SourceDocument

mod error;
mod lexer;
mod script;
mod traits;

pub use error::ParseError;
pub use lexer::{Lexed, lex};
pub use script::ScriptParser;
pub use traits::{Parser, decode_utf8};
