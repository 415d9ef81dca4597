extern crate alloc;

use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use const_format::formatcp;
use tracing_subscriber::EnvFilter;

use lambda::{expr::LAMBDA, run, Options, RunError};

mod lambda;

const SYNTAX: &str = formatcp!(
    "Syntax:
  {LAMBDA}x.body, \\x.body    abstraction, the body extends as far right as possible
  {LAMBDA}x y.body          same as {LAMBDA}x.{LAMBDA}y.body
  f a b                application, left-associative
  name = term;         definition, visible to everything after it
  # ...                comment to end of line

Set RUST_LOG=debug (or trace) to log evaluation progress to stderr."
);

/// Evaluates untyped lambda calculus terms to normal form.
#[derive(Parser, Debug)]
#[command(version, about, after_help = SYNTAX)]
struct Args {
    /// Program text. Read from --file or stdin when omitted.
    program: Option<String>,

    #[arg(short, long, conflicts_with = "program")]
    file: Option<PathBuf>,

    /// Give up after this many beta-reductions.
    #[arg(long, value_name = "N")]
    max_steps: Option<usize>,

    /// Print the parsed term without evaluating it.
    #[arg(long)]
    parse_only: bool,

    /// Also print the free variables of the result.
    #[arg(long)]
    free_variables: bool,

    /// Fail unless the result is alpha-equivalent to TERM.
    #[arg(long, value_name = "TERM")]
    expect: Option<String>,
}

fn read_source(args: &Args) -> Result<String, RunError> {
    if let Some(prog) = &args.program {
        return Ok(prog.clone());
    }
    if let Some(path) = &args.file {
        return Ok(fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn execute(args: &Args) -> Result<(), RunError> {
    let prog = read_source(args)?;
    let res = run(
        &prog,
        Options {
            max_steps: args.max_steps,
            parse_only: args.parse_only,
            expect: args.expect.as_deref(),
        },
    )?;

    println!("{res}");
    if args.free_variables {
        println!("free: {}", res.free_variables());
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match execute(&Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
