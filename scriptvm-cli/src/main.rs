mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, OutputFormat};
use scriptvm::{run_in_this_context, AmbientScope, RunOptions, ScriptValue, VmConfig};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    configure_logging(cli.verbose, cli.debug, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => VmConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => VmConfig::load()?,
    };
    let scope = AmbientScope::initialize(config)?;

    let mut sources = Vec::new();
    if let Some(file) = &cli.file {
        sources.push(read_source(file)?);
    }
    sources.extend(cli.eval.iter().cloned());

    let mut last = ScriptValue::Undefined;
    for source in sources {
        last = run_in_this_context(source, RunOptions::default())?;
    }
    tracing::debug!("Last completion value: {:?}", last);

    if !cli.quiet {
        match cli.format {
            OutputFormat::Text => println!("{}", last),
            OutputFormat::Json => println!("{}", serde_json::to_string(&last)?),
        }
    }

    if cli.globals {
        let globals = scope.user_globals()?;
        println!("{}", serde_json::to_string_pretty(&globals)?);
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("reading script from stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading script {}", path.display()))
}

fn configure_logging(verbose: bool, debug: bool, quiet: bool) {
    use tracing::Level;
    use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

    let log_level = if quiet {
        Level::ERROR
    } else if debug {
        Level::DEBUG
    } else if verbose {
        Level::TRACE
    } else {
        Level::WARN
    };

    registry()
        .with(EnvFilter::new(format!("{log_level}")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
