use std::ops::Range;

use serde::Serialize;
use tracing::trace;

use crate::ast::{Ast, Body, Identifier, NodeId, Param, Statement, StringLiteral};
use crate::grammar::Grammar;
use crate::tokenizer::{Token, TokenKind, TokenList};

/// Bodies nest through recursion; past this depth the parse is rejected.
pub const MAX_NESTING: usize = 128;

const IF: &str = "if";
const SWYK: &str = "swyk";
const NOTES: &str = "notes";
const MFUNC: &str = "MFunc";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum ParseErrorKind {
    #[error("expected {expected}, got '{actual}'")]
    Expected { expected: String, actual: String },
    #[error("expected {expected}, but no tokens are left")]
    UnexpectedEnd { expected: String },
    #[error("no statement starts with {kind} '{value}'")]
    UnknownStatement { kind: TokenKind, value: String },
    #[error("statements nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// A fatal syntax error. `line` and `column` are zero-based; `span` is a
/// byte range in the source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("line {}: {kind}", .line + 1)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub span: Range<usize>,
}

impl ParseError {
    fn at(token: &Token, kind: ParseErrorKind) -> Self {
        Self {
            kind,
            line: token.line,
            column: token.column,
            span: token.span(),
        }
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    grammar: &'t Grammar,
    ast: Ast,
    depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], grammar: &'t Grammar) -> Self {
        Self {
            tokens,
            cursor: 0,
            grammar,
            ast: Ast::new(),
            depth: 0,
        }
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn end_of_input(&self, expected: impl Into<String>) -> ParseError {
        let kind = ParseErrorKind::UnexpectedEnd {
            expected: expected.into(),
        };
        match self.tokens.last() {
            Some(last) => ParseError {
                kind,
                line: last.line,
                column: last.column + last.value.chars().count(),
                span: last.span().end..last.span().end,
            },
            None => ParseError {
                kind,
                line: 0,
                column: 0,
                span: 0..0,
            },
        }
    }

    fn peek(&self, expected: &str) -> Result<&'t Token, ParseError> {
        self.tokens
            .get(self.cursor)
            .ok_or_else(|| self.end_of_input(expected))
    }

    fn bump(&mut self, expected: &str) -> Result<&'t Token, ParseError> {
        let token = self.peek(expected)?;
        self.cursor += 1;
        Ok(token)
    }

    fn consume_expect(&mut self, literal: &str) -> Result<&'t Token, ParseError> {
        let expected = format!("'{literal}'");
        let token = self.peek(&expected)?;
        if token.value != literal {
            return Err(ParseError::at(
                token,
                ParseErrorKind::Expected {
                    expected,
                    actual: token.value.clone(),
                },
            ));
        }
        self.cursor += 1;
        Ok(token)
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> Result<&'t Token, ParseError> {
        let token = self.bump(expected)?;
        if token.kind != kind {
            return Err(ParseError::at(
                token,
                ParseErrorKind::Expected {
                    expected: expected.to_string(),
                    actual: token.value.clone(),
                },
            ));
        }
        Ok(token)
    }

    fn identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect_kind(TokenKind::Alnum, "identifier")?;
        Ok(Identifier(token.value.clone()))
    }

    fn type_name(&mut self) -> Result<Identifier, ParseError> {
        let token = self.bump("type name")?;
        if !self.grammar.is_type_name(&token.value) {
            return Err(ParseError::at(
                token,
                ParseErrorKind::Expected {
                    expected: "type name".to_string(),
                    actual: token.value.clone(),
                },
            ));
        }
        Ok(Identifier(token.value.clone()))
    }

    fn parse_program(mut self) -> Result<Ast, ParseError> {
        while !self.is_at_end() {
            let id = self.parse_statement()?;
            self.ast.attach_to_root(id);
        }
        Ok(self.ast)
    }

    fn parse_statement(&mut self) -> Result<NodeId, ParseError> {
        let token = self.peek("statement")?;
        trace!(%token, "Parsing statement");

        let statement = match token.value.as_str() {
            IF => self.parse_if()?,
            SWYK => self.parse_module()?,
            NOTES => self.parse_notes()?,
            MFUNC => self.parse_func()?,
            _ => {
                return Err(ParseError::at(
                    token,
                    ParseErrorKind::UnknownStatement {
                        kind: token.kind,
                        value: token.value.clone(),
                    },
                ))
            }
        };

        Ok(self.ast.push_statement(statement))
    }

    /// A body ends at `terminator` and holds at most one statement. The
    /// terminator itself is left for the caller.
    fn parse_body(&mut self, terminator: &str) -> Result<Body, ParseError> {
        let token = self.peek(&format!("'{terminator}'"))?;
        if token.value == terminator {
            return Ok(Body::Empty);
        }

        if self.depth >= MAX_NESTING {
            return Err(ParseError::at(
                token,
                ParseErrorKind::NestingTooDeep { limit: MAX_NESTING },
            ));
        }

        self.depth += 1;
        let nested = self.parse_statement();
        self.depth -= 1;
        Ok(Body::Nested(nested?))
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.consume_expect(IF)?;
        self.consume_expect("(")?;
        let condition = self.parse_body(")")?;
        self.consume_expect(")")?;
        self.consume_expect("{")?;
        let body = self.parse_body("}")?;
        self.consume_expect("}")?;

        Ok(Statement::IfStmt { condition, body })
    }

    fn parse_module(&mut self) -> Result<Statement, ParseError> {
        self.consume_expect(SWYK)?;
        let name = self.identifier()?;

        Ok(Statement::ModuleDecl { name })
    }

    fn parse_notes(&mut self) -> Result<Statement, ParseError> {
        self.consume_expect(NOTES)?;
        self.consume_expect("(")?;

        let mut entries = vec![];
        while self.peek("')'")?.value != ")" {
            let token = self.expect_kind(TokenKind::String, "string literal")?;
            entries.push(StringLiteral(token.value.clone()));
        }
        self.consume_expect(")")?;

        Ok(Statement::NotesDecl { entries })
    }

    /// Parameters are `Type name` pairs with no separator between them.
    fn parse_func(&mut self) -> Result<Statement, ParseError> {
        self.consume_expect(MFUNC)?;
        let name = self.identifier()?;
        trace!(name = name.as_str(), "Parsing function declaration");

        self.consume_expect("(")?;
        let mut params = vec![];
        while self.peek("')'")?.value != ")" {
            let ty = self.type_name()?;
            let name = self.identifier()?;
            params.push(Param { ty, name });
        }
        self.consume_expect(")")?;

        self.consume_expect("{")?;
        let body = self.parse_body("}")?;
        self.consume_expect("}")?;

        Ok(Statement::FuncDecl { name, params, body })
    }
}

/// Parses a token stream with the built-in [`Grammar::MIDDLETON`] tables.
pub fn parse(tokens: &TokenList) -> Result<Ast, ParseError> {
    parse_with(tokens, &Grammar::MIDDLETON)
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn parse_with(tokens: &TokenList, grammar: &Grammar) -> Result<Ast, ParseError> {
    let ast = Parser::new(&tokens.tokens, grammar).parse_program()?;
    trace!(node_count = ast.len(), "Parsed token stream");
    Ok(ast)
}
