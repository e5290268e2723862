//! Ruby lint command-line tool.
//!
//! Reads a Ruby file (or stdin), lints it and prints either the sectioned
//! text report or the JSON report used at the WASM boundary.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use ruby_lint::{codec, lint, LintOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ruby-lint", about = "Report syntax errors and style warnings in Ruby source")]
struct Cli {
    /// Ruby file to lint; reads stdin when omitted
    file: Option<PathBuf>,

    /// Include the parse tree dump
    #[arg(long)]
    dump: bool,

    /// Print the JSON report instead of text sections
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        // stdout carries the report, so logs go to stderr as plain text.
        .with_ansi(false)
        .with_writer(io::stderr)
        .init();

    let source = read_source(cli.file.as_ref())?;
    let result = lint(&source, LintOptions::default().with_parse_dump(cli.dump));

    if cli.json {
        println!("{}", codec::encode(&result).context("failed to encode report")?);
    } else {
        print!("{}", result.render_text());
    }
    Ok(())
}

fn read_source(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "ruby_lint=warn,ruby_parser=warn",
        1 => "ruby_lint=debug,ruby_parser=debug",
        _ => "ruby_lint=trace,ruby_parser=trace,ruby_lint_cli=trace",
    }
}
