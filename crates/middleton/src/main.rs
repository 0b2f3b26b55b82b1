use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use middleton::driver::{self, Emit};
use middleton::repl;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

fn main() -> anyhow::Result<()> {
    initialize_logging()?;

    let cli = Middleton::parse();

    match cli.subcmd {
        MiddletonSubcommand::Check(check) => run_check(check),
        MiddletonSubcommand::Repl => {
            let stdin = std::io::stdin();
            repl::run(
                stdin.lock(),
                std::io::stdout(),
                std::io::stderr().is_terminal(),
            )
        }
    }
}

fn run_check(check: Check) -> anyhow::Result<()> {
    let inputs = driver::collect_inputs(&check.paths, check.dirs)?;
    debug!(input_count = inputs.len(), "Collected inputs");

    let outcomes = driver::check_all(&inputs, &check.emit);
    let mut failed = 0;
    for outcome in &outcomes {
        println!("# {}", outcome.path.display());
        match &outcome.result {
            Ok(compilation) => {
                if check.show_tokens {
                    for token in compilation.tokens.iter() {
                        println!("{token}");
                    }
                }
                print!("{}", compilation.ast);
            }
            Err(diagnostic) => {
                failed += 1;
                eprintln!("{}", diagnostic.render_terminal_auto());
            }
        }
    }

    info!(total = outcomes.len(), failed, "Checked inputs");
    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{failed} of {} input(s) failed",
            outcomes.len()
        ));
    }
    Ok(())
}

fn initialize_logging() -> anyhow::Result<()> {
    let env_filter = env::var("RUST_LOG").unwrap_or_default();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_str(&env_filter)?),
        )
        .init();
    Ok(())
}

#[derive(clap::Parser)]
#[clap(name = "middleton", about = "Tokenize and parse MiddletonScript sources.")]
struct Middleton {
    #[clap(subcommand)]
    subcmd: MiddletonSubcommand,
}

#[derive(clap::Subcommand)]
enum MiddletonSubcommand {
    /// Tokenize and parse source files, printing each parse tree
    Check(Check),
    /// Read source one line at a time from standard input
    Repl,
}

#[derive(clap::Parser, Debug)]
struct Check {
    /// Source files, or directories when --dirs is given
    #[clap(required = true)]
    paths: Vec<PathBuf>,

    /// Treat directory arguments as the files directly inside them
    #[clap(short, long)]
    dirs: bool,

    /// Write a JSON sidecar next to each input
    #[clap(short, long, value_enum)]
    emit: Vec<Emit>,

    /// Print the token stream before the parse tree
    #[clap(long)]
    show_tokens: bool,
}
