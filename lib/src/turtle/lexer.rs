//! Turtle tokenizer.
//!
//! Drives a [`Scanner`] and groups code points into the lexemes the parser
//! consumes: IRI references, literals (with optional `@lang` or `^^<iri>`
//! suffix), prefixed/bare names, punctuation, and directives. Whitespace and
//! `#`-comments are skipped transparently.

use super::scanner::{Position, Scanner};
use crate::error::{Error, TextPosition};

fn position_of(p: Position) -> TextPosition {
    TextPosition {
        line: p.line,
        column: p.column,
    }
}

/// A single Turtle lexeme. The payload is always the raw source text of the
/// token (e.g. an IRI token carries its surrounding angle brackets, a
/// literal token carries its surrounding quotes and any `@lang`/`^^<iri>`
/// suffix) since that is the form the triple-tree builder renders back out.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Token {
    Iri(String),
    Literal(String),
    Name(String),
    Punct(char),
    Directive(String),
}

impl Token {
    /// The raw lexeme text, as it should appear when a triple is rendered.
    pub fn text(&self) -> &str {
        match self {
            Self::Iri(s) | Self::Literal(s) | Self::Name(s) | Self::Directive(s) => s,
            Self::Punct(_) => unreachable!("punctuation tokens are never rendered as terms"),
        }
    }
}

pub struct Lexer {
    scanner: Scanner,
}

const URI_CHARS: &str = ":/%#+-._~?=&@!$'()*,;";

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_namespaced_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ':' || c == '_' || c == '-'
}

fn is_language_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-'
}

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || URI_CHARS.contains(c)
}

impl Lexer {
    pub fn new(text: &str) -> Self {
        Self {
            scanner: Scanner::new(text),
        }
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::ParseError {
            position: position_of(self.scanner.position()),
            message: message.into(),
        }
    }

    /// The lexer's current position, for callers (the parser) that need to
    /// attach a location to a structural error of their own.
    pub fn position(&self) -> TextPosition {
        position_of(self.scanner.position())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.scanner.current() {
            if is_whitespace(c) {
                self.scanner.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comments_and_whitespace(&mut self) {
        loop {
            self.skip_whitespace();
            if self.scanner.current() == Some('#') {
                while let Some(c) = self.scanner.current() {
                    self.scanner.advance();
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Returns the next token, or `None` at end of input (end of input is
    /// not an error condition).
    pub fn next_token(&mut self) -> crate::error::Result<Option<Token>> {
        self.skip_comments_and_whitespace();
        let Some(first) = self.scanner.current() else {
            return Ok(None);
        };
        let token = match first {
            '<' => Token::Iri(self.parse_iri()?),
            '"' => self.parse_literal()?,
            '.' | ',' | ';' => {
                self.scanner.advance();
                Token::Punct(first)
            }
            '@' => Token::Directive(self.parse_directive_name()),
            c if is_namespaced_char(c) => Token::Name(self.parse_namespaced_value()),
            c => return Err(self.err(format!("unexpected character '{c}'"))),
        };
        Ok(Some(token))
    }

    /// Skips forward to (and past) the next `.`, tolerating only whitespace
    /// in between. Used to recover the parser's position after an error, or
    /// to fast-forward past a subject/predicate/object group.
    pub fn advance_past_period(&mut self) -> crate::error::Result<()> {
        while let Some(c) = self.scanner.current() {
            if c == '.' {
                self.scanner.advance();
                return Ok(());
            }
            if is_whitespace(c) {
                self.scanner.advance();
                continue;
            }
            return Err(self.err("triple did not end with a period"));
        }
        Ok(())
    }

    fn parse_namespaced_value(&mut self) -> String {
        let start = self.scanner.position().index;
        self.scanner.advance();
        while let Some(c) = self.scanner.current() {
            if is_namespaced_char(c) {
                self.scanner.advance();
            } else {
                break;
            }
        }
        self.scanner.substring_from(start)
    }

    fn parse_directive_name(&mut self) -> String {
        let start = self.scanner.position().index;
        self.scanner.advance(); // consume '@'
        while let Some(c) = self.scanner.current() {
            if c.is_ascii_alphabetic() {
                self.scanner.advance();
            } else {
                break;
            }
        }
        self.scanner.substring_from(start)
    }

    fn parse_language(&mut self) -> String {
        let start = self.scanner.position().index;
        self.scanner.advance(); // consume '@'
        while let Some(c) = self.scanner.current() {
            if is_language_char(c) {
                self.scanner.advance();
            } else {
                break;
            }
        }
        self.scanner.substring_from(start)
    }

    fn parse_iri(&mut self) -> crate::error::Result<String> {
        let start = self.scanner.position().index;
        self.scanner.advance(); // consume '<'
        loop {
            match self.scanner.current() {
                Some('>') => {
                    self.scanner.advance();
                    return Ok(self.scanner.substring_from(start));
                }
                Some(c) if is_uri_char(c) => self.scanner.advance(),
                Some(c) => return Err(self.err(format!("invalid character in IRI: '{c}'"))),
                None => return Err(self.err("IRI did not end with '>'")),
            }
        }
    }

    fn parse_type_suffix(&mut self) -> crate::error::Result<String> {
        // cursor is on the first '^'
        self.scanner.advance();
        if self.scanner.current() != Some('^') {
            return Err(self.err("invalid datatype delimiter, expected '^^'"));
        }
        self.scanner.advance();
        if self.scanner.current() != Some('<') {
            return Err(self.err("expected an IRI after '^^'"));
        }
        let iri = self.parse_iri()?;
        Ok(format!("^^{iri}"))
    }

    fn parse_literal(&mut self) -> crate::error::Result<Token> {
        let start = self.scanner.position().index;
        self.scanner.advance(); // consume opening quote
        loop {
            match self.scanner.current() {
                Some('\\') => {
                    // Escape: consume the backslash and whatever follows it
                    // verbatim (`\"` is the only escape the spec requires we
                    // honor so a quote inside the literal does not end it).
                    self.scanner.advance();
                    if self.scanner.current().is_some() {
                        self.scanner.advance();
                    }
                }
                Some('"') => {
                    self.scanner.advance();
                    let mut text = self.scanner.substring_from(start);
                    match self.scanner.current() {
                        Some('@') => {
                            text.push_str(&self.parse_language());
                        }
                        Some('^') => {
                            text.push_str(&self.parse_type_suffix()?);
                        }
                        _ => {}
                    }
                    return Ok(Token::Literal(text));
                }
                Some(_) => self.scanner.advance(),
                None => return Err(self.err("string literal did not end with '\"'")),
            }
        }
    }
}
