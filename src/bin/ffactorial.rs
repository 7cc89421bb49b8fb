// ffactorial -- print the exact factorial of each number
//
// Usage: ffactorial [OPTIONS] [NUMBER]...
//        (reads from stdin if no arguments given)

use std::io::{self, BufWriter, Read, Write};
use std::process;

use anyhow::Context;
use clap::Parser;

use ffactorial::common::logging::{LoggingConfig, init_logging};
use ffactorial::common::{io_error_msg, reset_sigpipe};
use ffactorial::request::{format_json_array, format_lines, parse_json_bytes, parse_text, parse_tokens};
use ffactorial::{EngineConfig, FactorialEngine};

const TOOL_NAME: &str = "ffactorial";

#[derive(Parser)]
#[command(
    name = "ffactorial",
    version,
    about = "Print the exact factorial of each NUMBER",
    allow_negative_numbers = true
)]
struct Cli {
    /// Read a {"numbers": [...]} request from stdin and print a JSON array
    #[arg(long = "json", conflicts_with = "numbers")]
    json: bool,

    /// Scan N spans concurrently (default: number of CPUs)
    #[arg(long = "parallel", value_name = "N")]
    parallel: Option<usize>,

    /// Use a single span when the largest number is below M
    #[arg(long = "threshold", value_name = "M")]
    threshold: Option<u64>,

    /// Log engine activity to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Numbers to compute; read from stdin if none are given
    numbers: Vec<String>,
}

fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_to_string(&mut input)
        .map_err(|e| anyhow::anyhow!(io_error_msg(&e)))
        .context("reading standard input")?;
    Ok(input)
}

/// Raw request body; encoding problems are left to the JSON decoder.
fn read_stdin_bytes() -> anyhow::Result<Vec<u8>> {
    let mut body = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut body)
        .map_err(|e| anyhow::anyhow!(io_error_msg(&e)))
        .context("reading standard input")?;
    Ok(body)
}

fn engine_config(cli: &Cli) -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Some(n) = cli.parallel {
        config = config.with_parallelism(n);
    }
    if let Some(m) = cli.threshold {
        config = config.with_threshold(m);
    }
    config
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    // The whole batch is validated before any work is dispatched.
    let values = if cli.json {
        parse_json_bytes(&read_stdin_bytes()?)?
    } else if cli.numbers.is_empty() {
        parse_text(&read_stdin()?)?
    } else {
        parse_tokens(cli.numbers.as_slice())?
    };

    let engine = FactorialEngine::new(engine_config(cli))?;
    let results = engine.compute(&values)?;

    let rendered = if cli.json {
        let mut s = format_json_array(&results);
        s.push('\n');
        s
    } else {
        format_lines(&values, &results)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::with_capacity(256 * 1024, stdout.lock());
    if out.write_all(rendered.as_bytes()).is_err() || out.flush().is_err() {
        // Broken pipe or write error; exit cleanly
        process::exit(0);
    }
    Ok(())
}

fn main() {
    reset_sigpipe();

    let cli = Cli::parse();
    init_logging(if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    });

    if let Err(e) = run(&cli) {
        eprintln!("{}: {:#}", TOOL_NAME, e);
        process::exit(1);
    }
}
