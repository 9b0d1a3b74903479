//! Lexer for the bundled scripting language.

use coplint_ast::{Comment, SourceBuffer, Span, Token, TokenKind};

use crate::ParseError;

const KEYWORDS: &[&str] = &["def", "class", "if", "while", "end"];

const TWO_CHAR_OPERATORS: &[&str] = &["==", "!=", "<=", ">="];

/// Output of [`lex`]: code tokens and comments, kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

/// Splits `buffer` into tokens and comments.
pub fn lex(buffer: &SourceBuffer) -> Result<Lexed, ParseError> {
    Lexer {
        buffer,
        src: buffer.text(),
        pos: 0,
        tokens: Vec::new(),
        comments: Vec::new(),
    }
    .run()
}

struct Lexer<'a> {
    buffer: &'a SourceBuffer,
    src: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    comments: Vec<Comment>,
}

impl<'a> Lexer<'a> {
    fn run(mut self) -> Result<Lexed, ParseError> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                ' ' | '\t' | '\r' => self.bump(),
                '\n' => {
                    self.bump();
                    self.push(TokenKind::Newline, start);
                }
                '#' => self.comment(),
                '"' | '\'' => self.string(c)?,
                c if c.is_ascii_digit() => self.number(),
                c if c.is_alphabetic() || c == '_' => self.identifier(),
                '(' | ')' | '[' | ']' | ',' | ';' => {
                    self.bump();
                    self.push(TokenKind::Punctuation, start);
                }
                _ => self.operator(c)?,
            }
        }
        Ok(Lexed {
            tokens: self.tokens,
            comments: self.comments,
        })
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let span = Span::new(start as u32, self.pos as u32);
        self.tokens
            .push(Token::new(kind, span, &self.src[start..self.pos]));
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> ParseError {
        ParseError::syntax(message, self.buffer.position(offset as u32))
    }

    fn comment(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let end = self.src[start..self.pos].trim_end_matches('\r').len() + start;
        self.comments.push(Comment::new(
            Span::new(start as u32, end as u32),
            &self.src[start..end],
        ));
    }

    fn string(&mut self, quote: char) -> Result<(), ParseError> {
        let start = self.pos;
        self.bump();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated string meets end of line", start)),
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some(_) => self.bump(),
            }
        }
        self.push(TokenKind::String, start);
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        self.digits();
        let mut kind = TokenKind::Integer;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.digits();
            kind = TokenKind::Float;
        }
        self.push(kind, start);
    }

    fn digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn identifier(&mut self) {
        let start = self.pos;
        loop {
            while let Some(c) = self.peek() {
                if c.is_alphanumeric() || c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
            // `a.b` chains are lexed as one dotted identifier.
            let dotted = self.peek() == Some('.')
                && self
                    .peek_at(1)
                    .is_some_and(|c| c.is_alphabetic() || c == '_');
            if !dotted {
                break;
            }
            self.bump();
        }
        if matches!(self.peek(), Some('?' | '!')) && self.peek_at(1) != Some('=') {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        let kind = if KEYWORDS.contains(&text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start);
    }

    fn operator(&mut self, c: char) -> Result<(), ParseError> {
        let start = self.pos;
        let rest = &self.src[self.pos..];
        if TWO_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op)) {
            self.bump();
            self.bump();
        } else if matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=') {
            self.bump();
        } else {
            return Err(self.error(format!("unexpected character `{c}`"), start));
        }
        self.push(TokenKind::Operator, start);
        Ok(())
    }
}

/// Decodes the body of a quoted string token.
pub(crate) fn unescape(token: &str) -> String {
    let quote = token.chars().next().unwrap_or('"');
    let body = token
        .get(1..token.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match (quote, chars.next()) {
            ('"', Some('n')) => out.push('\n'),
            ('"', Some('t')) => out.push('\t'),
            (_, Some('\\')) => out.push('\\'),
            (q, Some(next)) if next == q => out.push(q),
            (_, Some(next)) => {
                out.push('\\');
                out.push(next);
            }
            (_, None) => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        lex(&SourceBuffer::new(src))
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn lexes_assignment_with_comment() {
        let buffer = SourceBuffer::new("x = 1_000 # big\r\n");
        let lexed = lex(&buffer).unwrap();

        let texts: Vec<_> = lexed.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "=", "1_000", "\n"]);
        assert_eq!(lexed.comments.len(), 1);
        assert_eq!(lexed.comments[0].text, "# big");
        assert_eq!(lexed.comments[0].span, Span::new(10, 15));
    }

    #[test]
    fn lexes_keywords_and_dotted_identifiers() {
        assert_eq!(
            kinds("def run\nbinding.pry\nend"),
            vec![
                (TokenKind::Keyword, "def".to_string()),
                (TokenKind::Identifier, "run".to_string()),
                (TokenKind::Newline, "\n".to_string()),
                (TokenKind::Identifier, "binding.pry".to_string()),
                (TokenKind::Newline, "\n".to_string()),
                (TokenKind::Keyword, "end".to_string()),
            ]
        );
    }

    #[test]
    fn lexes_operators() {
        let ops: Vec<_> = kinds("a==b != c<=d")
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Operator)
            .map(|(_, t)| t)
            .collect();
        assert_eq!(ops, vec!["==", "!=", "<="]);
    }

    #[test]
    fn lexes_floats_and_ints() {
        assert_eq!(
            kinds("1.5 2"),
            vec![
                (TokenKind::Float, "1.5".to_string()),
                (TokenKind::Integer, "2".to_string())
            ]
        );
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        let lexed = lex(&SourceBuffer::new("s = \"a # b\"")).unwrap();
        assert!(lexed.comments.is_empty());
        assert_eq!(lexed.tokens[2].text, "\"a # b\"");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex(&SourceBuffer::new("x = 1\ny = 'abc\n")).unwrap_err();
        assert_eq!(err.position(), coplint_ast::Position::new(2, 4));
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = lex(&SourceBuffer::new("x = @")).unwrap_err();
        assert!(err.to_string().contains("unexpected character `@`"));
    }

    #[rstest]
    #[case(r#""plain""#, "plain")]
    #[case(r#""tab\there""#, "tab\there")]
    #[case(r#""say \"hi\"""#, "say \"hi\"")]
    #[case(r"'it\'s'", "it's")]
    #[case(r"'keep\n'", "keep\\n")]
    fn unescapes_string_bodies(#[case] token: &str, #[case] expected: &str) {
        assert_eq!(unescape(token), expected);
    }
}
