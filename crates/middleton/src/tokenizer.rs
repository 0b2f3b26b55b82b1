//! An eager tokenizer for MiddletonScript source.
//!
//! The whole source is scanned in a single left-to-right pass before the
//! parser runs. Characters are sorted into three classes (whitespace,
//! alphanumeric, everything else); runs of the same class become one token,
//! except that every "other" character is a token of its own. Double quotes
//! toggle a verbatim string mode with no escape processing.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::grammar::Grammar;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharClass {
    Whitespace,
    Alnum,
    Other,
}

impl CharClass {
    pub fn of(c: char) -> Self {
        if c.is_whitespace() {
            CharClass::Whitespace
        } else if c.is_alphabetic() || c.is_numeric() {
            CharClass::Alnum
        } else {
            CharClass::Other
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Whitespace,
    Alnum,
    Other,
    String,
    Keyword,
    Type,
}

impl From<CharClass> for TokenKind {
    fn from(class: CharClass) -> Self {
        match class {
            CharClass::Whitespace => TokenKind::Whitespace,
            CharClass::Alnum => TokenKind::Alnum,
            CharClass::Other => TokenKind::Other,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Alnum => "alnum",
            TokenKind::Other => "other",
            TokenKind::String => "string",
            TokenKind::Keyword => "keyword",
            TokenKind::Type => "type",
        };
        f.write_str(name)
    }
}

/// One lexical unit. `line` and `column` are zero-based and refer to the
/// first character; `start` is its byte offset in the source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub start: usize,
}

impl Token {
    pub fn span(&self) -> Range<usize> {
        self.start..self.start + self.value.len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} '{}' {}:{}>",
            self.kind, self.value, self.line, self.column
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    pub tokens: Vec<Token>,
}

impl TokenList {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LexError {
    #[error("unterminated string literal starting on line {}", .line + 1)]
    UnterminatedString {
        line: usize,
        column: usize,
        start: usize,
    },
}

impl LexError {
    pub fn span(&self) -> Range<usize> {
        match self {
            LexError::UnterminatedString { start, .. } => *start..*start + 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Position {
    offset: usize,
    line: usize,
    column: usize,
}

impl Position {
    fn advance(&mut self, c: char) {
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }
}

/// Scanner state for a single pass. Nothing here outlives the call.
struct Scanner<'g> {
    grammar: &'g Grammar,
    tokens: Vec<Token>,
    buffer: String,
    buffer_at: Position,
    run: Option<CharClass>,
}

impl<'g> Scanner<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            tokens: vec![],
            buffer: String::new(),
            buffer_at: Position::default(),
            run: None,
        }
    }

    fn begin(&mut self, c: char, at: Position) {
        self.buffer.push(c);
        self.buffer_at = at;
    }

    fn append(&mut self, c: char, at: Position) {
        if self.buffer.is_empty() {
            self.buffer_at = at;
        }
        self.buffer.push(c);
    }

    /// Emits the buffer as a token unless it is blank, then clears it.
    fn flush(&mut self) {
        if self.buffer.trim().is_empty() {
            self.buffer.clear();
            return;
        }

        let value = std::mem::take(&mut self.buffer);
        let kind = self.categorize(&value);
        self.tokens.push(Token {
            value,
            kind,
            line: self.buffer_at.line,
            column: self.buffer_at.column,
            start: self.buffer_at.offset,
        });
    }

    fn categorize(&self, value: &str) -> TokenKind {
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            return TokenKind::String;
        }

        if self.grammar.is_reserved_word(value) {
            TokenKind::Keyword
        } else if self.grammar.is_type_name(value) {
            TokenKind::Type
        } else {
            value
                .chars()
                .next()
                .map(|first| CharClass::of(first).into())
                .unwrap_or(TokenKind::Whitespace)
        }
    }
}

/// Tokenizes `source` with the built-in [`Grammar::MIDDLETON`] tables.
pub fn tokenize(source: &str) -> Result<TokenList, LexError> {
    tokenize_with(source, &Grammar::MIDDLETON)
}

#[tracing::instrument(level = "trace", skip_all)]
pub fn tokenize_with(source: &str, grammar: &Grammar) -> Result<TokenList, LexError> {
    let mut scanner = Scanner::new(grammar);
    let mut position = Position::default();
    let mut open_quote: Option<Position> = None;

    for c in source.chars() {
        let at = position;
        position.advance(c);

        if c == '"' {
            if open_quote.is_none() {
                scanner.flush();
                scanner.begin(c, at);
                open_quote = Some(at);
            } else {
                scanner.buffer.push(c);
                scanner.flush();
                open_quote = None;
            }
            scanner.run = None;
            continue;
        }

        if open_quote.is_some() {
            scanner.buffer.push(c);
            continue;
        }

        let class = CharClass::of(c);
        if scanner.run != Some(class) || class == CharClass::Other {
            scanner.flush();
            scanner.begin(c, at);
            if class == CharClass::Other {
                scanner.flush();
            }
        } else {
            scanner.append(c, at);
        }
        scanner.run = Some(class);
    }

    if let Some(at) = open_quote {
        return Err(LexError::UnterminatedString {
            line: at.line,
            column: at.column,
            start: at.offset,
        });
    }

    scanner.flush();
    trace!(token_count = scanner.tokens.len(), "Tokenized source");

    Ok(TokenList {
        tokens: scanner.tokens,
    })
}
