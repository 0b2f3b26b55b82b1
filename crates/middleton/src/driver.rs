//! Runs the front end over files on disk.
//!
//! Every input is handled on its own: one file failing to read, tokenize or
//! parse is reported and the rest still run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::diagnostics::{diagnostic_from_anyhow, diagnostic_from_compile_error, CompilerDiagnostic};
use crate::{compile, Compilation};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Emit {
    Tokens,
    Ast,
}

impl Emit {
    /// Appended to the input file name.
    pub fn suffix(self) -> &'static str {
        match self {
            Emit::Tokens => ".tokens.json",
            Emit::Ast => ".ast.json",
        }
    }
}

pub fn sidecar_path(source_path: &Path, emit: Emit) -> PathBuf {
    let mut name = OsString::from(source_path.as_os_str());
    name.push(emit.suffix());
    PathBuf::from(name)
}

/// Expands directory arguments into the files they contain when
/// `expand_dirs` is set. Subdirectories are skipped, not descended into.
pub fn collect_inputs(paths: &[PathBuf], expand_dirs: bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut inputs = vec![];
    for path in paths {
        if !(expand_dirs && path.is_dir()) {
            inputs.push(path.clone());
            continue;
        }

        let mut files = vec![];
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("failed to read directory {}", path.display()))?;
        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read directory {}", path.display()))?;
            if entry.file_type()?.is_dir() {
                trace!(path = %entry.path().display(), "Skipping subdirectory");
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        debug!(dir = %path.display(), file_count = files.len(), "Expanded directory");
        inputs.extend(files);
    }
    Ok(inputs)
}

#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<Compilation, CompilerDiagnostic>,
}

pub fn check_file(path: &Path, emit: &[Emit]) -> FileOutcome {
    let result = check_file_inner(path, emit);
    FileOutcome {
        path: path.to_path_buf(),
        result,
    }
}

fn check_file_inner(path: &Path, emit: &[Emit]) -> Result<Compilation, CompilerDiagnostic> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read source {}", path.display()))
        .map_err(|err| diagnostic_from_anyhow("could not load input", &err, Some(path)))?;
    trace!(source_len = source.len(), "Read input file");

    let compilation = compile(&source)
        .map_err(|err| diagnostic_from_compile_error(&source, Some(path), &err))?;

    for kind in emit {
        let written = match kind {
            Emit::Tokens => write_sidecar(path, *kind, &compilation.tokens),
            Emit::Ast => write_sidecar(path, *kind, &compilation.ast),
        };
        written.map_err(|err| diagnostic_from_anyhow("could not write output", &err, Some(path)))?;
    }

    Ok(compilation)
}

fn write_sidecar(path: &Path, emit: Emit, value: &impl Serialize) -> anyhow::Result<()> {
    let out_path = sidecar_path(path, emit);
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&out_path, json)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    info!(path = %out_path.display(), "Wrote sidecar");
    Ok(())
}

/// Checks every input in order and returns one outcome per input.
pub fn check_all(inputs: &[PathBuf], emit: &[Emit]) -> Vec<FileOutcome> {
    inputs.iter().map(|path| check_file(path, emit)).collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::diagnostics::DiagnosticStage;

    #[test]
    fn directory_expansion_skips_subdirectories() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        fs::write(tmp.path().join("b.mid"), "swyk b").expect("write b");
        fs::write(tmp.path().join("a.mid"), "swyk a").expect("write a");
        fs::create_dir(tmp.path().join("nested")).expect("create nested");
        fs::write(tmp.path().join("nested").join("c.mid"), "swyk c").expect("write c");

        let single = tmp.path().join("a.mid");
        let inputs = collect_inputs(&[tmp.path().to_path_buf(), single.clone()], true)
            .expect("collect inputs");
        assert_eq!(
            inputs,
            [tmp.path().join("a.mid"), tmp.path().join("b.mid"), single]
        );
    }

    #[test]
    fn directories_pass_through_without_expansion() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let inputs =
            collect_inputs(&[tmp.path().to_path_buf()], false).expect("collect inputs");
        assert_eq!(inputs, [tmp.path().to_path_buf()]);

        let outcomes = check_all(&inputs, &[]);
        let diagnostic = outcomes[0].result.as_ref().expect_err("reading a directory fails");
        assert_eq!(diagnostic.stage, DiagnosticStage::Io);
    }

    #[test]
    fn failures_do_not_stop_later_files() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let bad = tmp.path().join("bad.mid");
        let missing = tmp.path().join("missing.mid");
        let good = tmp.path().join("good.mid");
        fs::write(&bad, "banana").expect("write bad");
        fs::write(&good, "swyk good").expect("write good");

        let outcomes = check_all(&[bad, missing, good.clone()], &[]);
        assert_eq!(outcomes.len(), 3);

        let parse_failure = outcomes[0].result.as_ref().expect_err("bad should fail");
        assert_eq!(parse_failure.stage, DiagnosticStage::Parse);
        let io_failure = outcomes[1].result.as_ref().expect_err("missing should fail");
        assert_eq!(io_failure.stage, DiagnosticStage::Io);

        assert_eq!(outcomes[2].path, good);
        let compilation = outcomes[2].result.as_ref().expect("good should pass");
        assert_eq!(compilation.ast.top_level().count(), 1);
    }

    #[test]
    fn sidecars_are_written_next_to_the_input() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let source = tmp.path().join("main.mid");
        fs::write(&source, "swyk main\nnotes (\"middleton:fmt\")").expect("write main");

        let outcome = check_file(&source, &[Emit::Tokens, Emit::Ast]);
        assert!(outcome.result.is_ok());

        let tokens_path = tmp.path().join("main.mid.tokens.json");
        let ast_path = tmp.path().join("main.mid.ast.json");
        assert_eq!(sidecar_path(&source, Emit::Tokens), tokens_path);

        let tokens: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tokens_path).expect("read tokens"))
                .expect("tokens json");
        assert_eq!(tokens["tokens"][0]["value"], "swyk");
        assert_eq!(tokens["tokens"][0]["kind"], "keyword");
        assert_eq!(tokens["tokens"][4]["kind"], "string");

        let ast: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ast_path).expect("read ast"))
                .expect("ast json");
        assert_eq!(ast["nodes"][0]["payload"], "Root");
        assert_eq!(
            ast["nodes"][1]["payload"]["Statement"]["ModuleDecl"]["name"],
            "main"
        );
    }

    #[test]
    fn failed_files_write_no_sidecars() {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let source = tmp.path().join("broken.mid");
        fs::write(&source, "swyk").expect("write broken");

        let outcome = check_file(&source, &[Emit::Ast]);
        assert!(outcome.result.is_err());
        assert!(!PathBuf::from(format!("{}.ast.json", source.display())).exists());
    }
}
