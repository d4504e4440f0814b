//! checkgold CLI.
//!
//! Argument parsing, command orchestration and exit codes for the
//! `checkgold` binary.

pub mod cli;
pub mod commands;
pub mod exit;

pub use cli::{
    parse_from, split_command, CheckConfigArgs, Cli, CliError, Command, ListArgs, OutputFormat,
    ParseVersionArgs, RunArgs,
};
pub use commands::{
    ensure_clean, ensure_passed, execute_check_config, execute_exports, execute_import_modules,
    execute_list, execute_modules, execute_parse_version, execute_run, load_config,
    render_report, resolve_environment, CommandError, CommandResult,
};
