//! # edict-cli
//!
//! Command-line interface for Edict.
//!
//! Reads a record stream, runs zero or more rule files over it in order and
//! writes the result. Logging goes to stderr and is configured via `RUST_LOG`.

mod args;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use edict_pipeline::{Edict, EdictOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "edict")]
#[command(about = "Transform record streams with Edict rule files")]
#[command(version)]
struct Cli {
    /// Rule files to apply, in order; none copies input to output
    #[arg(value_name = "EDICT_FILE")]
    edict_files: Vec<PathBuf>,

    /// Read data from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Protocol used to read the input
    #[arg(short = 'r', long, default_value = "csv")]
    read_protocol: String,

    /// Protocol used to write the output
    #[arg(short = 'w', long, default_value = "csv")]
    write_protocol: String,

    /// Protocol argument, e.g. -a pattern="{date} {amount}"
    #[arg(short = 'a', long = "arg", value_name = "KEY=VALUE", value_parser = args::parse_key_value)]
    protocol_args: Vec<(String, String)>,

    /// JSON file holding protocol arguments; -a values take precedence
    #[arg(long, value_name = "JSON")]
    args_file: Option<PathBuf>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input '{}'", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Parsed command line");

    let protocol_args = args::protocol_args(cli.args_file.as_deref(), &cli.protocol_args)?;
    let options = EdictOptions::new()
        .read_protocol(&cli.read_protocol)
        .write_protocol(&cli.write_protocol)
        .protocol_args(protocol_args);
    let edict = Edict::from_files(&cli.edict_files)?.with_options(options);

    let input = open_input(cli.input.as_ref())?;
    let mut output = open_output(cli.output.as_ref())?;
    edict.run(input, &mut output)?;
    Ok(())
}
