//! Front end for MiddletonScript: source text to tokens to a parse tree.
//!
//! ```
//! let compilation = middleton::compile("swyk hello").unwrap();
//! assert_eq!(compilation.tokens.len(), 2);
//! assert_eq!(compilation.ast.top_level().count(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod driver;
pub mod grammar;
pub mod parser;
pub mod repl;
pub mod tokenizer;

use serde::Serialize;
use tracing::debug;

use crate::ast::Ast;
use crate::grammar::Grammar;
use crate::parser::ParseError;
use crate::tokenizer::{LexError, TokenList};

#[derive(Clone, Debug, Serialize)]
pub struct Compilation {
    pub tokens: TokenList,
    pub ast: Ast,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("tokenization failed: {0}")]
    Lex(#[from] LexError),
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::Lex(LexError::UnterminatedString { line, .. }) => *line,
            CompileError::Parse(error) => error.line,
        }
    }
}

pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    compile_with(source, &Grammar::MIDDLETON)
}

pub fn compile_with(source: &str, grammar: &Grammar) -> Result<Compilation, CompileError> {
    let tokens = tokenizer::tokenize_with(source, grammar)?;
    debug!(token_count = tokens.len(), "Tokenized source");

    let ast = parser::parse_with(&tokens, grammar)?;
    debug!(statement_count = ast.top_level().count(), "Parsed source");

    Ok(Compilation { tokens, ast })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_program() {
        let source = r#"
swyk middleton

notes (
    "middleton:fmt"
    "middleton:os"
)

MFunc main(MFunc callback) {
    if () { swyk nested }
}
"#;
        let compilation = compile(source).expect("compile");
        assert_eq!(
            compilation.ast.to_string(),
            "Root
  ModuleDecl middleton
  NotesDecl (\"middleton:fmt\" \"middleton:os\")
  FuncDecl main(MFunc callback)
    IfStmt
      ModuleDecl nested
"
        );
    }

    #[test]
    fn errors_keep_their_stage() {
        let err = compile("notes (\"open").expect_err("should fail");
        assert!(matches!(err, CompileError::Lex(_)));
        assert_eq!(err.line(), 0);

        let err = compile("swyk a\nswyk \"b\"").expect_err("should fail");
        assert!(matches!(err, CompileError::Parse(_)));
        assert_eq!(err.line(), 1);
        assert_eq!(
            err.to_string(),
            "parse failed: line 2: expected identifier, got '\"b\"'"
        );
    }

    #[test]
    fn blank_source_compiles_to_empty_root() {
        let compilation = compile("  \n\t").expect("compile");
        assert!(compilation.tokens.is_empty());
        assert!(compilation.ast.is_empty());
    }
}
