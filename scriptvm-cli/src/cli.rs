use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "scriptvm")]
#[command(version)]
#[command(about = "Run JavaScript in a single shared global scope")]
#[command(long_about = "
scriptvm evaluates JavaScript files and snippets in one ambient global scope.
The file runs first, then each --eval snippet in order; globals declared by
earlier code are visible to later code. The value of the last evaluated
expression is printed.
")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["file", "eval"])
))]
pub struct Cli {
    /// Script file to run (`-` reads stdin)
    pub file: Option<PathBuf>,

    /// Source snippet to run after the file
    #[arg(short, long = "eval", value_name = "CODE")]
    pub eval: Vec<String>,

    /// Configuration file (toml, yaml or json)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How to print the last completion value
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print user-defined globals as JSON after running
    #[arg(long)]
    pub globals: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}
