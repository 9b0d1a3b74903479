//! Parser for the bundled scripting language.
//!
//! Grammar, one statement per line (or separated by `;`):
//!
//! ```text
//! stmt   := def | class | if | while | expr
//! def    := "def" IDENT [ "(" IDENT ("," IDENT)* ")" ] body "end"
//! class  := "class" IDENT body "end"
//! if     := "if" expr body "end"
//! while  := "while" expr body "end"
//! expr   := IDENT "=" expr | binary
//! binary := primary (OP primary)*          precedence: == != < > <= >=, + -, * /
//! primary:= INT | FLOAT | STRING | IDENT [ "(" args ")" ] | "[" args "]" | "(" expr ")"
//! ```

use coplint_ast::{
    Child, Literal, NodeId, NodeKind, SourceBuffer, SourceDocument, Span, Token, TokenKind,
    TreeBuilder,
};

use crate::lexer::{lex, unescape};
use crate::{ParseError, Parser};

/// Parser for `.cop` scripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptParser;

impl ScriptParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for ScriptParser {
    fn name(&self) -> &str {
        "script"
    }

    fn extensions(&self) -> &[&str] {
        &["cop", "script"]
    }

    fn parse(&self, source: &str) -> Result<SourceDocument, ParseError> {
        let buffer = SourceBuffer::new(source);
        let lexed = lex(&buffer)?;
        let mut state = State {
            buffer: &buffer,
            tokens: &lexed.tokens,
            pos: 0,
            builder: TreeBuilder::new(),
        };
        let root = state.program()?;
        let tree = state.builder.finish(root);
        Ok(SourceDocument::new(
            buffer.clone(),
            tree,
            lexed.tokens,
            lexed.comments,
        ))
    }
}

struct State<'a> {
    buffer: &'a SourceBuffer,
    tokens: &'a [Token],
    pos: usize,
    builder: TreeBuilder,
}

impl<'a> State<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: TokenKind, text: &str) -> bool {
        self.peek().is_some_and(|t| t.kind == kind && t.text == text)
    }

    fn at_punct(&self, punct: &str) -> bool {
        self.at(TokenKind::Punctuation, punct)
    }

    fn error_at(&self, message: impl Into<String>, offset: u32) -> ParseError {
        ParseError::syntax(message, self.buffer.position(offset))
    }

    /// Error pointing at the current token, or at the end of input.
    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Newline => {
                self.error_at(format!("unexpected end of line, expecting {expected}"), t.span.start)
            }
            Some(t) => self.error_at(
                format!("unexpected `{}`, expecting {expected}", t.text),
                t.span.start,
            ),
            None => self.error_at(
                format!("unexpected end of input, expecting {expected}"),
                self.buffer.len(),
            ),
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<&'a Token, ParseError> {
        if self.at_punct(punct) {
            self.advance().ok_or_else(|| self.unexpected(punct))
        } else {
            Err(self.unexpected(&format!("`{punct}`")))
        }
    }

    fn expect_identifier(&mut self) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn skip_separators(&mut self) {
        while self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Newline || (t.kind == TokenKind::Punctuation && t.text == ";"))
        {
            self.pos += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().is_some_and(|t| t.kind == TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn program(&mut self) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => break,
                Some(t) if t.kind == TokenKind::Keyword && t.text == "end" => {
                    return Err(self.error_at("unexpected `end`", t.span.start));
                }
                Some(_) => children.push(Child::Node(self.statement()?)),
            }
        }
        Ok(self.builder.node(
            NodeKind::Program,
            Span::new(0, self.buffer.len()),
            children,
        ))
    }

    /// Statements up to (and including) the `end` closing a block opened at `open`.
    fn body(&mut self, open: &Token) -> Result<(Vec<Child>, u32), ParseError> {
        let mut children = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => {
                    return Err(self.error_at(
                        format!("unexpected end of input, `{}` is missing its `end`", open.text),
                        self.buffer.len(),
                    ));
                }
                Some(t) if t.kind == TokenKind::Keyword && t.text == "end" => {
                    self.pos += 1;
                    return Ok((children, t.span.end));
                }
                Some(_) => children.push(Child::Node(self.statement()?)),
            }
        }
    }

    fn statement(&mut self) -> Result<NodeId, ParseError> {
        let node = match self.peek() {
            Some(t) if t.kind == TokenKind::Keyword => match t.text.as_str() {
                "def" => self.def()?,
                "class" => self.class()?,
                "if" | "while" => self.conditional()?,
                _ => return Err(self.unexpected("a statement")),
            },
            _ => self.expression()?,
        };

        match self.peek() {
            None => {}
            Some(t) if t.kind == TokenKind::Newline => {}
            Some(t) if t.kind == TokenKind::Punctuation && t.text == ";" => {}
            Some(t) if t.kind == TokenKind::Keyword && t.text == "end" => {}
            Some(_) => return Err(self.unexpected("end of statement")),
        }
        Ok(node)
    }

    fn def(&mut self) -> Result<NodeId, ParseError> {
        let open = self.advance().ok_or_else(|| self.unexpected("`def`"))?;
        let name = self.expect_identifier()?;

        let params = if self.at_punct("(") {
            let lparen = self.expect_punct("(")?;
            let mut params = Vec::new();
            self.skip_newlines();
            while !self.at_punct(")") {
                let param = self.expect_identifier()?;
                params.push(Child::Node(self.builder.leaf(
                    NodeKind::Ident,
                    param.span,
                    Literal::Symbol(param.text.clone()),
                )));
                self.skip_newlines();
                if !self.at_punct(")") {
                    self.expect_punct(",")?;
                    self.skip_newlines();
                }
            }
            let rparen = self.expect_punct(")")?;
            self.builder.node(
                NodeKind::Params,
                Span::new(lparen.span.start, rparen.span.end),
                params,
            )
        } else {
            self.builder
                .node(NodeKind::Params, Span::empty(name.span.end), Vec::new())
        };

        let (body, end) = self.body(open)?;
        let mut children = vec![Child::Leaf(Literal::Symbol(name.text.clone())), Child::Node(params)];
        children.extend(body);
        Ok(self
            .builder
            .node(NodeKind::Def, Span::new(open.span.start, end), children))
    }

    fn class(&mut self) -> Result<NodeId, ParseError> {
        let open = self.advance().ok_or_else(|| self.unexpected("`class`"))?;
        let name = self.expect_identifier()?;
        let (body, end) = self.body(open)?;
        let mut children = vec![Child::Leaf(Literal::Symbol(name.text.clone()))];
        children.extend(body);
        Ok(self
            .builder
            .node(NodeKind::Class, Span::new(open.span.start, end), children))
    }

    fn conditional(&mut self) -> Result<NodeId, ParseError> {
        let open = self.advance().ok_or_else(|| self.unexpected("a condition"))?;
        let kind = if open.text == "if" {
            NodeKind::If
        } else {
            NodeKind::While
        };
        let condition = self.expression()?;
        let (body, end) = self.body(open)?;
        let mut children = vec![Child::Node(condition)];
        children.extend(body);
        Ok(self
            .builder
            .node(kind, Span::new(open.span.start, end), children))
    }

    fn expression(&mut self) -> Result<NodeId, ParseError> {
        let is_assign = self.peek().is_some_and(|t| t.kind == TokenKind::Identifier)
            && self
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::Operator && t.text == "=");
        if !is_assign {
            return self.binary(0);
        }

        let name = self.expect_identifier()?;
        self.pos += 1;
        let value = self.expression()?;
        let end = self.span_of(value).end;
        Ok(self.builder.node(
            NodeKind::Assign,
            Span::new(name.span.start, end),
            vec![Child::Leaf(Literal::Symbol(name.text.clone())), Child::Node(value)],
        ))
    }

    fn binary(&mut self, level: usize) -> Result<NodeId, ParseError> {
        const LEVELS: [&[&str]; 3] = [&["==", "!=", "<", ">", "<=", ">="], &["+", "-"], &["*", "/"]];

        if level == LEVELS.len() {
            return self.primary();
        }

        let mut lhs = self.binary(level + 1)?;
        while let Some(op) = self
            .peek()
            .filter(|t| t.kind == TokenKind::Operator && LEVELS[level].contains(&t.text.as_str()))
        {
            self.pos += 1;
            self.skip_newlines();
            let rhs = self.binary(level + 1)?;
            let operator =
                self.builder
                    .leaf(NodeKind::Operator, op.span, Literal::Symbol(op.text.clone()));
            let span = Span::new(self.span_of(lhs).start, self.span_of(rhs).end);
            lhs = self.builder.node(
                NodeKind::Binary,
                span,
                vec![Child::Node(lhs), Child::Node(operator), Child::Node(rhs)],
            );
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("an expression"));
        };

        match token.kind {
            TokenKind::Integer => {
                self.pos += 1;
                self.integer(token, token.span, false)
            }
            TokenKind::Float => {
                self.pos += 1;
                self.float(token, token.span, false)
            }
            TokenKind::Operator if token.text == "-" => {
                // Only a minus glued to a number literal is accepted.
                match self.peek_at(1) {
                    Some(num) if num.span.start == token.span.end && num.kind == TokenKind::Integer => {
                        self.pos += 2;
                        self.integer(num, Span::new(token.span.start, num.span.end), true)
                    }
                    Some(num) if num.span.start == token.span.end && num.kind == TokenKind::Float => {
                        self.pos += 2;
                        self.float(num, Span::new(token.span.start, num.span.end), true)
                    }
                    _ => Err(self.unexpected("an expression")),
                }
            }
            TokenKind::String => {
                self.pos += 1;
                Ok(self
                    .builder
                    .leaf(NodeKind::Str, token.span, Literal::Str(unescape(&token.text))))
            }
            TokenKind::Identifier => {
                self.pos += 1;
                if self.at_punct("(") {
                    let (args, args_span) = self.list("(", ")")?;
                    let args = self.builder.node(NodeKind::Args, args_span, args);
                    Ok(self.builder.node(
                        NodeKind::Call,
                        Span::new(token.span.start, args_span.end),
                        vec![Child::Leaf(Literal::Symbol(token.text.clone())), Child::Node(args)],
                    ))
                } else {
                    Ok(self.builder.leaf(
                        NodeKind::Ident,
                        token.span,
                        Literal::Symbol(token.text.clone()),
                    ))
                }
            }
            TokenKind::Punctuation if token.text == "[" => {
                let (items, span) = self.list("[", "]")?;
                Ok(self.builder.node(NodeKind::Array, span, items))
            }
            TokenKind::Punctuation if token.text == "(" => {
                let open = self.expect_punct("(")?;
                self.skip_newlines();
                let inner = self.expression()?;
                self.skip_newlines();
                let close = self.expect_punct(")")?;
                Ok(self.builder.node(
                    NodeKind::Group,
                    Span::new(open.span.start, close.span.end),
                    vec![Child::Node(inner)],
                ))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Comma separated expressions between `open` and `close`; newlines are
    /// insignificant inside the brackets.
    fn list(&mut self, open: &str, close: &str) -> Result<(Vec<Child>, Span), ParseError> {
        let first = self.expect_punct(open)?;
        let mut items = Vec::new();
        self.skip_newlines();
        while !self.at_punct(close) {
            if self.peek().is_none() {
                return Err(self.error_at(
                    format!("unexpected end of input, `{open}` is not closed"),
                    self.buffer.len(),
                ));
            }
            items.push(Child::Node(self.expression()?));
            self.skip_newlines();
            if !self.at_punct(close) {
                self.expect_punct(",")?;
                self.skip_newlines();
            }
        }
        let last = self.expect_punct(close)?;
        Ok((items, Span::new(first.span.start, last.span.end)))
    }

    fn integer(&mut self, token: &Token, span: Span, negative: bool) -> Result<NodeId, ParseError> {
        let digits: String = token.text.chars().filter(|c| *c != '_').collect();
        let value = digits
            .parse::<i64>()
            .map_err(|_| self.error_at("integer literal is too large", token.span.start))?;
        let value = if negative { -value } else { value };
        Ok(self.builder.leaf(NodeKind::Int, span, Literal::Int(value)))
    }

    fn float(&mut self, token: &Token, span: Span, negative: bool) -> Result<NodeId, ParseError> {
        let digits: String = token.text.chars().filter(|c| *c != '_').collect();
        let value = digits
            .parse::<f64>()
            .map_err(|_| self.error_at("invalid float literal", token.span.start))?;
        let value = if negative { -value } else { value };
        Ok(self.builder.leaf(NodeKind::Float, span, Literal::Float(value)))
    }

    fn span_of(&self, id: NodeId) -> Span {
        self.builder.span(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplint_ast::{Node, Position};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(src: &str) -> SourceDocument {
        ScriptParser::new().parse(src).unwrap()
    }

    fn outline(node: Node<'_>) -> String {
        let children: Vec<String> = node.child_nodes().map(outline).collect();
        if children.is_empty() {
            node.kind().to_string()
        } else {
            format!("{}({})", node.kind(), children.join(" "))
        }
    }

    #[test]
    fn parses_statements_and_blocks() {
        let doc = parse("x = 1 + 2 * 3\ndef greet(name)\n  puts(\"hi\", name)\nend\n");
        assert_eq!(
            outline(doc.tree().root()),
            "program(assign(binary(int operator binary(int operator int))) \
             def(params(ident) call(args(str ident))))"
        );
    }

    #[test]
    fn block_spans_cover_their_end_keyword() {
        let src = "class Foo\n  if ready\n    go()\n  end\nend";
        let doc = parse(src);
        let class = doc.tree().root().child(0).unwrap();

        assert_eq!(class.kind(), NodeKind::Class);
        assert_eq!(class.span(), Span::new(0, src.len() as u32));
        assert_eq!(class.name(), Some("Foo"));
        let cond = class.child(1).unwrap();
        assert_eq!(doc.buffer().slice(cond.span()), "if ready\n    go()\n  end");
    }

    #[test]
    fn keeps_comments_outside_the_tree() {
        let doc = parse("# header\nx = 1 # trailing\n");
        assert_eq!(doc.comments().len(), 2);
        assert!(doc.comments()[1].is_trailing(doc.buffer()));
        assert_eq!(doc.tree().root().child_nodes().count(), 1);
    }

    #[test]
    fn decodes_literals() {
        let doc = parse("a = [1_000, -2, 1.5, 'x']");
        let array = doc.tree().root().child(0).unwrap().child(1).unwrap();
        let leaves: Vec<_> = array
            .child_nodes()
            .map(|n| n.leaf(0).cloned().unwrap())
            .collect();
        assert_eq!(
            leaves,
            vec![
                Literal::Int(1000),
                Literal::Int(-2),
                Literal::Float(1.5),
                Literal::Str("x".into())
            ]
        );
    }

    #[test]
    fn newlines_inside_brackets_are_insignificant() {
        let doc = parse("call(\n  1,\n  2\n)\n");
        let call = doc.tree().root().child(0).unwrap();
        assert_eq!(call.child(1).unwrap().child_nodes().count(), 2);
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        let doc = parse("");
        assert_eq!(doc.tree().root().kind(), NodeKind::Program);
        assert_eq!(doc.tree().root().child_nodes().count(), 0);
    }

    #[rstest]
    #[case::unclosed_block("def foo\n  bar\n", Position::new(2, 6))]
    #[case::stray_end("x = 1\nend\n", Position::new(2, 0))]
    #[case::unclosed_paren("foo(1,\n", Position::new(1, 7))]
    #[case::dangling_operator("x = 1 +\n", Position::new(1, 8))]
    #[case::two_expressions("x = 1 2\n", Position::new(1, 6))]
    #[case::unterminated_string("x = \"abc\n", Position::new(1, 4))]
    fn reports_syntax_errors_with_positions(#[case] src: &str, #[case] position: Position) {
        let err = ScriptParser::new().parse(src).unwrap_err();
        assert_eq!(err.position(), position, "{err}");
    }

    #[test]
    fn invalid_utf8_is_reported_at_the_first_bad_byte() {
        let err = ScriptParser::new()
            .parse_bytes(b"x = 1\ny = \"\xff\"\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidEncoding { .. }));
        assert_eq!(err.position(), Position::new(2, 5));
    }

    #[test]
    fn handles_extensions() {
        let parser = ScriptParser::new();
        assert!(parser.can_parse("cop"));
        assert!(parser.can_parse("COP"));
        assert!(!parser.can_parse("rs"));
    }
}
