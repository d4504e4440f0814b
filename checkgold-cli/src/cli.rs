//! CLI argument parsing for checkgold.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use thiserror::Error;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("{flag} must not be empty")]
    EmptyCommand { flag: &'static str },

    #[error("{flag} has an unclosed {quote} quote")]
    UnclosedQuote { flag: &'static str, quote: char },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),
}

/// Golden-output regression harness for the pydantic mypy plugin.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "checkgold")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Harness config file. Defaults to ./checkgold.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root the checker runs in (overrides the config).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Checker command line, split on whitespace; quote paths with spaces
    /// (overrides the config).
    #[arg(long, global = true)]
    pub checker: Option<String>,

    /// Interpreter command line, split like `--checker` (overrides the config).
    #[arg(long, global = true)]
    pub python: Option<String>,

    /// Use this checker version instead of asking the checker.
    #[arg(long, global = true, value_name = "VERSION")]
    pub checker_version: Option<String>,

    /// Use this interpreter version instead of asking the interpreter.
    #[arg(long, global = true, value_name = "VERSION")]
    pub python_version: Option<String>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the fixture matrix and the malformed-config case.
    Run(RunArgs),
    /// List fixtures and whether they would be skipped.
    List(ListArgs),
    /// Print the modules expected to type-check cleanly.
    Modules,
    /// Validate the plugin options in a checker config file.
    CheckConfig(CheckConfigArgs),
    /// Check the package's re-exports and export lists.
    Exports,
    /// Import every clean-checking module.
    ImportModules,
    /// Parse version strings the way the harness does.
    ParseVersion(ParseVersionArgs),
}

/// Report format.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Only run fixtures whose `<config>::<module>` id matches this glob.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Write missing golden files from the actual output (the cases fail).
    #[arg(long)]
    pub create_missing: bool,

    /// Do not run the malformed-config case.
    #[arg(long)]
    pub skip_malformed_config: bool,

    /// Report format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Only list fixtures whose id matches this glob.
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct CheckConfigArgs {
    /// Checker config file (`.ini` or `.toml`).
    pub path: PathBuf,
}

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionArgs {
    /// Version strings, e.g. `0.940+dev.04cac4b.dirty`.
    #[arg(required = true)]
    pub versions: Vec<String>,
}

/// Split a command-line override into program and arguments.
///
/// Words are separated by whitespace. Single or double quotes group text
/// with spaces into one word; there are no escapes or expansions.
pub fn split_command(raw: &str, flag: &'static str) -> Result<Vec<String>, CliError> {
    let mut parts = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => word.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    parts.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            None => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if let Some(quote) = quote {
        return Err(CliError::UnclosedQuote { flag, quote });
    }
    if in_word {
        parts.push(word);
    }
    if parts.is_empty() {
        return Err(CliError::EmptyCommand { flag });
    }
    Ok(parts)
}

/// Parse CLI arguments from an iterator (for testing).
pub fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
