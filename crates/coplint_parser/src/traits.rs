//! Parser trait definition.

use coplint_ast::{SourceBuffer, SourceDocument};

use crate::ParseError;

/// Trait for parsing source text into a [`SourceDocument`].
///
/// Parsers are shared across worker threads, so implementations must be
/// `Send + Sync` and keep no per-parse state in `self`.
///
/// # Example
///
/// ```rust,ignore
/// use coplint_parser::{Parser, ParseError};
/// use coplint_ast::SourceDocument;
///
/// struct MyParser;
///
/// impl Parser for MyParser {
///     fn name(&self) -> &str {
///         "my-parser"
///     }
///
///     fn extensions(&self) -> &[&str] {
///         &["myext"]
///     }
///
///     fn parse(&self, source: &str) -> Result<SourceDocument, ParseError> {
///         todo!()
///     }
/// }
/// ```
pub trait Parser: Send + Sync {
    /// Returns the name of this parser.
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles.
    ///
    /// Extensions should not include the leading dot (e.g., `["cop"]`).
    fn extensions(&self) -> &[&str];

    /// Parses the source text.
    fn parse(&self, source: &str) -> Result<SourceDocument, ParseError>;

    /// Decodes `bytes` as UTF-8 and parses the result.
    ///
    /// Invalid encoding is reported as a positioned [`ParseError`].
    fn parse_bytes(&self, bytes: &[u8]) -> Result<SourceDocument, ParseError> {
        self.parse(decode_utf8(bytes)?)
    }

    /// Returns true if this parser can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Decodes `bytes` as UTF-8.
///
/// The error carries the line and column of the first invalid byte.
pub fn decode_utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| {
        // The prefix is valid by construction.
        let prefix = String::from_utf8_lossy(&bytes[..e.valid_up_to()]);
        let buffer = SourceBuffer::new(prefix.as_ref());
        ParseError::invalid_encoding(buffer.position(e.valid_up_to() as u32))
    })
}
