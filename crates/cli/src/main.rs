//! Command-line entry point for RepCRec.
//!
//! Two modes, matching spec Section 6: a file argument splits its
//! contents into `// Test` blocks and runs each against a fresh engine;
//! with no argument, the whole of stdin runs against a single engine and
//! no block headers are printed.

mod format;
mod runner;
mod script;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Run a RepCRec transaction script.
#[derive(Debug, Parser)]
#[command(name = "repcrec", version, about)]
struct Cli {
    /// Script file to run. Its contents are split into `// Test` blocks,
    /// each run against a fresh engine. Omit to read one script from
    /// stdin instead, run as a single unbroken stream.
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match run(cli, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("repcrec: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> io::Result<()> {
    match cli.file {
        Some(path) => {
            let contents = fs::read_to_string(&path)?;
            runner::run_file(&contents, out);
        }
        None => {
            let mut contents = String::new();
            io::stdin().read_to_string(&mut contents)?;
            runner::run_stream(&contents, out);
        }
    }
    Ok(())
}
