//! Drives the [`Lexer`] into a [`Tree`], honoring Turtle's `;`, `,`, `a`,
//! `@base` shorthand, then renders the tree into an ordered [`Graph`].

use super::lexer::{Lexer, Token};
use super::tree::Tree;
use crate::error::{Error, Result};
use crate::graph::{Graph, Triple};
use std::collections::HashMap;

/// Parses a Turtle document into a [`Graph`].
///
/// `blank_subject` is substituted for every bare `<>` subject or object
/// (and for any `@base <...>` directive target) — the mechanism by which a
/// caller passes a body whose unnamed subject is the resource being
/// created or replaced.
pub fn parse(text: &str, blank_subject: &str) -> Result<Graph> {
    let triples = parse_to_triples(text, blank_subject)?;
    Ok(Graph::from_triples(triples))
}

/// As [`parse`], but returns the flat triple list before the idempotent
/// append rules of [`Graph`] are applied — used by tests that want to
/// observe raw parse output.
pub fn parse_to_triples(text: &str, blank_subject: &str) -> Result<Vec<Triple>> {
    let mut parser = Parser::new(text);
    parser.run()?;
    let mut tree = parser.tree;
    let base = parser
        .directives
        .get("@base")
        .cloned()
        .unwrap_or_else(|| blank_subject.to_string());
    tree.substitute("<>", &base);
    Ok(tree.into_triples())
}

/// Parses a single `subject predicate object .` line with no Turtle
/// shorthand, i.e. N-Triples. The same tokenizer drives this; `,`/`;`/`a`
/// are simply never produced because the caller is expected to pass one
/// flat triple per call.
pub fn parse_ntriples_line(line: &str) -> Result<Triple> {
    let mut lexer = Lexer::new(line);
    let (subject, _) = expect_term(&mut lexer)?;
    let (predicate, _) = expect_term(&mut lexer)?;
    let (object, object_is_literal) = expect_term(&mut lexer)?;
    match lexer.next_token()? {
        Some(Token::Punct('.')) => {}
        _ => {
            return Err(Error::ParseError {
                position: lexer.position(),
                message: "N-Triples line did not end with '.'".to_string(),
            })
        }
    }
    Ok(Triple::new(subject, predicate, object, object_is_literal))
}

fn expect_term(lexer: &mut Lexer) -> Result<(String, bool)> {
    match lexer.next_token()? {
        Some(t @ Token::Literal(_)) => Ok((t.text().to_string(), true)),
        Some(t @ (Token::Iri(_) | Token::Name(_))) => Ok((t.text().to_string(), false)),
        other => Err(Error::ParseError {
            position: lexer.position(),
            message: format!("expected a term, found {other:?}"),
        }),
    }
}

struct Parser {
    lexer: Lexer,
    tree: Tree,
    directives: HashMap<String, String>,
    last_terminator: Terminator,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            lexer: Lexer::new(text),
            tree: Tree::new(),
            directives: HashMap::new(),
            last_terminator: Terminator::Period,
        }
    }

    fn run(&mut self) -> Result<()> {
        loop {
            let Some(token) = self.lexer.next_token()? else {
                return Ok(());
            };
            match token {
                Token::Directive(name) => self.parse_directive(name)?,
                Token::Iri(text) => self.parse_subject(text)?,
                Token::Name(text) => self.parse_subject(text)?,
                other => return Err(self.unexpected(other, "a subject or a directive")),
            }
        }
    }

    fn parse_directive(&mut self, name: String) -> Result<()> {
        let value = match self.lexer.next_token()? {
            Some(t @ (Token::Iri(_) | Token::Name(_))) => t.text().to_string(),
            other => return Err(self.unexpected_opt(other, "a directive value")),
        };
        match self.lexer.next_token()? {
            Some(Token::Punct('.')) => {}
            other => return Err(self.unexpected_opt(other, "'.' terminating the directive")),
        }
        self.directives.insert(name, value);
        Ok(())
    }

    /// Subject -> predicate loop -> object loop, for one subject.
    fn parse_subject(&mut self, subject: String) -> Result<()> {
        self.tree.add_subject(subject);
        loop {
            match self.lexer.next_token()? {
                Some(Token::Punct('.')) => return Ok(()),
                Some(t @ (Token::Iri(_) | Token::Name(_))) => {
                    self.tree.add_predicate(t.text().to_string());
                    self.parse_objects()?;
                }
                other => return Err(self.unexpected_opt(other, "a predicate or '.'")),
            }
            match self.last_terminator {
                Terminator::Period => return Ok(()),
                Terminator::Semicolon => continue,
            }
        }
    }

    fn parse_objects(&mut self) -> Result<()> {
        loop {
            match self.lexer.next_token()? {
                Some(Token::Iri(text)) => self.tree.add_object(text, false),
                Some(Token::Name(text)) => self.tree.add_object(text, false),
                Some(Token::Literal(text)) => self.tree.add_object(text, true),
                other => return Err(self.unexpected_opt(other, "an object")),
            }
            match self.lexer.next_token()? {
                Some(Token::Punct(',')) => continue,
                Some(Token::Punct(';')) => {
                    self.last_terminator = Terminator::Semicolon;
                    return Ok(());
                }
                Some(Token::Punct('.')) => {
                    self.last_terminator = Terminator::Period;
                    return Ok(());
                }
                other => return Err(self.unexpected_opt(other, "',', ';' or '.'")),
            }
        }
    }

    fn unexpected(&self, found: Token, expected: &str) -> Error {
        self.unexpected_opt(Some(found), expected)
    }

    fn unexpected_opt(&self, found: Option<Token>, expected: &str) -> Error {
        let position = self.lexer.position();
        let message = match found {
            Some(t) => format!("expected {expected}, found {t:?}"),
            None => format!("expected {expected}, found end of input"),
        };
        Error::ParseError { position, message }
    }
}

#[derive(Clone, Copy, Default)]
enum Terminator {
    #[default]
    Period,
    Semicolon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_semicolon_shorthand_yield_three_triples() {
        let triples = parse_to_triples("<s> <p> <o1>, <o2> ; <p2> <o3> .", "<s>").unwrap();
        assert_eq!(triples.len(), 3);
        assert_eq!(triples[0].predicate, "<p>");
        assert_eq!(triples[1].predicate, "<p>");
        assert_eq!(triples[2].predicate, "<p2>");
    }

    #[test]
    fn comments_are_elided() {
        let triples = parse_to_triples("# a header\n<s> <p> <o> . # trailing\n", "<s>").unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn base_directive_rewrites_bare_subject_and_object() {
        let triples =
            parse_to_triples("@base <http://x/r> .\n<> <p> <> .", "<should-not-be-used>").unwrap();
        assert_eq!(triples[0].subject, "<http://x/r>");
        assert_eq!(triples[0].object, "<http://x/r>");
    }

    #[test]
    fn blank_subject_falls_back_to_caller_supplied_uri_without_base() {
        let triples = parse_to_triples("<> <p> <o> .", "<http://x/me>").unwrap();
        assert_eq!(triples[0].subject, "<http://x/me>");
    }

    #[test]
    fn literals_with_language_and_datatype_suffixes_parse() {
        let triples =
            parse_to_triples(r#"<s> <p> "hi"@en ; <p2> "5"^^<http://x/int> ."#, "<s>").unwrap();
        assert_eq!(triples[0].object, "\"hi\"@en");
        assert!(triples[0].is_object_literal);
        assert_eq!(triples[1].object, "\"5\"^^<http://x/int>");
    }

    #[test]
    fn the_a_shorthand_round_trips_through_the_tree() {
        let triples = parse_to_triples("<s> a <http://x/Thing> .", "<s>").unwrap();
        assert_eq!(triples[0].predicate, "a");
    }

    #[test]
    fn unterminated_uri_reports_a_parse_error_with_position() {
        let err = parse_to_triples("<s> <p> <http://x", "<s>").unwrap_err();
        match err {
            Error::ParseError { .. } => {}
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn missing_terminating_period_reports_a_parse_error() {
        let err = parse_to_triples("<s> <p> <o>", "<s>").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn ntriples_line_parses_a_single_flat_triple() {
        let triple = parse_ntriples_line("<s> <p> \"o\" .").unwrap();
        assert_eq!(triple.subject, "<s>");
        assert_eq!(triple.object, "\"o\"");
        assert!(triple.is_object_literal);
    }

    #[test]
    fn roundtrip_preserves_triple_set_and_order() {
        let text = "<s> <p1> <o1> .\n<s> <p2> <o2> .\n";
        let graph = parse(text, "<s>").unwrap();
        let reparsed = parse(&graph.serialize(), "<s>").unwrap();
        assert_eq!(graph.serialize(), reparsed.serialize());
    }
}
