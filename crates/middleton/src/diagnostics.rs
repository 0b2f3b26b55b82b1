use std::collections::HashMap;
use std::fmt;
use std::io::IsTerminal;
use std::ops::Range;
use std::path::Path;

use ariadne::{sources, Config, IndexType, Label, Report, ReportKind};

use crate::parser::ParseError;
use crate::tokenizer::LexError;
use crate::CompileError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticStage {
    Tokenize,
    Parse,
    Io,
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticStage::Tokenize => "tokenize",
            DiagnosticStage::Parse => "parse",
            DiagnosticStage::Io => "io",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLabel {
    pub file_id: String,
    pub span: Range<usize>,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct CompilerDiagnostic {
    pub code: String,
    pub stage: DiagnosticStage,
    pub message: String,
    pub labels: Vec<SourceLabel>,
    pub notes: Vec<String>,
    pub sources: HashMap<String, String>,
}

impl CompilerDiagnostic {
    pub fn new(
        code: impl Into<String>,
        stage: DiagnosticStage,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            stage,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            sources: HashMap::new(),
        }
    }

    pub fn with_source(mut self, file_id: impl Into<String>, source: impl Into<String>) -> Self {
        self.sources.insert(file_id.into(), source.into());
        self
    }

    pub fn with_label(
        mut self,
        file_id: impl Into<String>,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(SourceLabel {
            file_id: file_id.into(),
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn render_plain(&self) -> String {
        self.render_with_color(false)
    }

    pub fn render_terminal_auto(&self) -> String {
        self.render_with_color(std::io::stderr().is_terminal())
    }

    fn render_with_color(&self, use_color: bool) -> String {
        let (primary_file_id, primary_span) = if let Some(label) = self.labels.first() {
            (label.file_id.clone(), sanitize_span(&label.span))
        } else if let Some((file_id, _)) = self.sources.iter().next() {
            (file_id.clone(), 0..1)
        } else {
            ("<unknown>".to_string(), 0..1)
        };

        let mut report = Report::build(
            ReportKind::Error,
            (primary_file_id.clone(), primary_span.clone()),
        )
        .with_code(self.code.clone())
        .with_message(format!("error[{}]: {}", self.stage, self.message))
        .with_config(
            Config::default()
                .with_color(use_color)
                .with_index_type(IndexType::Byte),
        );

        for label in &self.labels {
            report = report.with_label(
                Label::new((label.file_id.clone(), sanitize_span(&label.span)))
                    .with_message(label.message.clone()),
            );
        }

        for note in &self.notes {
            report = report.with_note(note.clone());
        }

        let mut source_entries = self
            .sources
            .iter()
            .map(|(id, src)| (id.clone(), src.clone()))
            .collect::<Vec<_>>();
        if !source_entries.iter().any(|(id, _)| id == &primary_file_id) {
            source_entries.push((primary_file_id.clone(), String::new()));
        }

        let mut output = Vec::new();
        match report.finish().write(sources(source_entries), &mut output) {
            Ok(()) => String::from_utf8_lossy(&output).trim_end().to_string(),
            Err(_) => self.fallback_render(),
        }
    }

    fn fallback_render(&self) -> String {
        let mut out = format!("error[{}:{}]: {}", self.stage, self.code, self.message);
        for note in &self.notes {
            out.push('\n');
            out.push_str("note: ");
            out.push_str(note);
        }
        out
    }
}

impl fmt::Display for CompilerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_plain())
    }
}

pub fn diagnostic_from_lex_error(
    source: &str,
    source_path: Option<&Path>,
    error: &LexError,
) -> CompilerDiagnostic {
    let file_id = file_id_from_path(source_path);
    let span = clamp_span(source, error.span());
    let LexError::UnterminatedString { line, column, .. } = error;
    CompilerDiagnostic::new("MID-TOKENIZE-001", DiagnosticStage::Tokenize, "tokenization failed")
        .with_source(file_id.clone(), source.to_string())
        .with_label(file_id, span, "string literal is never closed")
        .with_note(format!("at line {}, column {}", line + 1, column + 1))
}

pub fn diagnostic_from_parse_error(
    source: &str,
    source_path: Option<&Path>,
    error: &ParseError,
) -> CompilerDiagnostic {
    let file_id = file_id_from_path(source_path);
    let span = clamp_span(source, error.span.clone());
    CompilerDiagnostic::new("MID-PARSE-001", DiagnosticStage::Parse, "parse failed")
        .with_source(file_id.clone(), source.to_string())
        .with_label(file_id, span, error.kind.to_string())
        .with_note(format!(
            "at line {}, column {}",
            error.line + 1,
            error.column + 1
        ))
}

pub fn diagnostic_from_compile_error(
    source: &str,
    source_path: Option<&Path>,
    error: &CompileError,
) -> CompilerDiagnostic {
    match error {
        CompileError::Lex(error) => diagnostic_from_lex_error(source, source_path, error),
        CompileError::Parse(error) => diagnostic_from_parse_error(source, source_path, error),
    }
}

pub fn diagnostic_from_anyhow(
    message: impl Into<String>,
    error: &anyhow::Error,
    source_path: Option<&Path>,
) -> CompilerDiagnostic {
    let mut diagnostic = CompilerDiagnostic::new("MID-IO-001", DiagnosticStage::Io, message);
    if let Some(path) = source_path {
        diagnostic = diagnostic.with_note(format!("while processing {}", path.display()));
    }

    let mut causes = error.chain();
    if let Some(primary) = causes.next() {
        diagnostic.message = format!("{}: {}", diagnostic.message, primary);
    }
    for cause in causes {
        diagnostic = diagnostic.with_note(format!("caused by: {cause}"));
    }

    diagnostic
}

pub fn file_id_from_path(path: Option<&Path>) -> String {
    path.map(|value| value.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

pub fn sanitize_span(span: &Range<usize>) -> Range<usize> {
    if span.end <= span.start {
        span.start..span.start.saturating_add(1)
    } else {
        span.clone()
    }
}

/// Keeps a label inside the source. Empty spans widen to one character, and
/// end-of-input errors point at the last character.
fn clamp_span(source: &str, span: Range<usize>) -> Range<usize> {
    let start = span.start.min(source.len());
    let end = span.end.clamp(start, source.len());
    if start < end {
        return start..end;
    }

    if start == source.len() {
        return match source.char_indices().next_back() {
            Some((last, _)) => last..source.len(),
            None => 0..0,
        };
    }
    start..next_char_boundary(source, start)
}

fn next_char_boundary(source: &str, start: usize) -> usize {
    source[start..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(source.len())
}

#[cfg(test)]
mod tests {
    use super::{
        diagnostic_from_anyhow, diagnostic_from_lex_error, diagnostic_from_parse_error,
        CompilerDiagnostic, DiagnosticStage,
    };
    use crate::parser::parse;
    use crate::tokenizer::tokenize;

    #[test]
    fn lex_error_label_marks_opening_quote() {
        let source = "swyk a\nnotes (\"oops\n";
        let err = tokenize(source).expect_err("tokenizer should fail");
        let diagnostic = diagnostic_from_lex_error(source, None, &err);
        assert_eq!(diagnostic.stage, DiagnosticStage::Tokenize);
        assert_eq!(diagnostic.labels.len(), 1);
        let span = diagnostic.labels[0].span.clone();
        assert_eq!(&source[span], "\"");
        assert_eq!(diagnostic.notes, ["at line 2, column 8"]);
    }

    #[test]
    fn parse_error_label_marks_offending_token() {
        let source = "swyk a\nbanana\n";
        let tokens = tokenize(source).expect("tokenize");
        let err = parse(&tokens).expect_err("parser should fail");
        let diagnostic = diagnostic_from_parse_error(source, None, &err);
        let span = diagnostic.labels[0].span.clone();
        assert_eq!(&source[span], "banana");
        assert_eq!(
            diagnostic.labels[0].message,
            "no statement starts with alnum 'banana'"
        );
    }

    #[test]
    fn end_of_input_label_stays_in_bounds() {
        let source = "swyk";
        let tokens = tokenize(source).expect("tokenize");
        let err = parse(&tokens).expect_err("parser should fail");
        let diagnostic = diagnostic_from_parse_error(source, None, &err);
        assert_eq!(diagnostic.labels[0].span, 3..4);
        let text = diagnostic.render_plain();
        assert!(text.contains("MID-PARSE-001"), "{text}");
        assert!(text.contains("parse failed"), "{text}");
    }

    #[test]
    fn plain_rendering_does_not_contain_ansi_sequences() {
        let source = "MFunc main(int x) {}";
        let tokens = tokenize(source).expect("tokenize");
        let err = parse(&tokens).expect_err("parser should fail");
        let text = diagnostic_from_parse_error(source, None, &err).render_plain();
        assert!(!text.contains("\u{1b}["));
        assert!(text.contains("expected type name, got 'int'"), "{text}");
    }

    #[test]
    fn anyhow_chain_becomes_notes() {
        let error = anyhow::anyhow!("permission denied").context("failed to read source");
        let diagnostic = diagnostic_from_anyhow("could not load input", &error, None);
        assert_eq!(
            diagnostic.message,
            "could not load input: failed to read source"
        );
        assert_eq!(diagnostic.notes, ["caused by: permission denied"]);
    }

    #[test]
    fn rendering_works_without_labels_or_sources() {
        let diagnostic = CompilerDiagnostic::new("MID-IO-001", DiagnosticStage::Io, "io failed")
            .with_note("missing file");
        let text = diagnostic.render_plain();
        assert!(text.contains("io failed"), "{text}");
        assert!(text.contains("MID-IO-001"), "{text}");
    }
}
