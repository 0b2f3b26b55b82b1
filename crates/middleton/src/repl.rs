//! A line-at-a-time loop over the front end. Each line is compiled on its
//! own; errors are printed and the loop keeps going until end of input.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::compile;
use crate::diagnostics::diagnostic_from_compile_error;

pub const PROMPT: &str = ">> ";

pub fn run(input: impl BufRead, mut output: impl Write, use_color: bool) -> anyhow::Result<()> {
    writeln!(output, "NOTE: the MiddletonScript REPL is experimental!")?;

    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        debug!(line_len = line.len(), "Read REPL line");

        match compile(&line) {
            Ok(compilation) => {
                for token in compilation.tokens.iter() {
                    writeln!(output, "{token}")?;
                }
                write!(output, "{}", compilation.ast)?;
            }
            Err(err) => {
                let diagnostic = diagnostic_from_compile_error(&line, None, &err);
                let rendered = if use_color {
                    diagnostic.render_terminal_auto()
                } else {
                    diagnostic.render_plain()
                };
                writeln!(output, "{rendered}")?;
            }
        }
    }

    Ok(())
}
