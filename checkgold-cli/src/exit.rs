//! Exit codes for the checkgold CLI.

use checkgold_harness::{CaseErrorKind, ConfigError, PluginConfigError};

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments or configuration.
    pub const CONFIG_ERROR: i32 = 1;
    /// IO error.
    pub const IO_ERROR: i32 = 2;
    /// Checker or interpreter could not be run.
    pub const CHECKER_ERROR: i32 = 3;
    /// A golden file is missing from every output root.
    pub const GOLDEN_NOT_FOUND: i32 = 4;
    /// One or more cases failed.
    pub const CASES_FAILED: i32 = 10;
    /// The package's export contract is broken.
    pub const EXPORT_CONTRACT: i32 = 11;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::CONFIG_ERROR,
        CommandError::Config(ConfigError::Read(_)) => codes::IO_ERROR,
        CommandError::Config(_) => codes::CONFIG_ERROR,
        CommandError::Matrix(_) => codes::CONFIG_ERROR,
        CommandError::Filesystem(_) => codes::IO_ERROR,
        CommandError::PluginConfig(PluginConfigError::Read(_)) => codes::IO_ERROR,
        CommandError::PluginConfig(_) => codes::CONFIG_ERROR,
        CommandError::Checker(_) => codes::CHECKER_ERROR,
        CommandError::Probe(_) => codes::CHECKER_ERROR,
        CommandError::CasesErrored { kind, .. } => match kind {
            CaseErrorKind::GoldenNotFound => codes::GOLDEN_NOT_FOUND,
            CaseErrorKind::Checker => codes::CHECKER_ERROR,
            CaseErrorKind::Filesystem => codes::IO_ERROR,
            CaseErrorKind::NoOutputRoot => codes::CONFIG_ERROR,
        },
        CommandError::Output(_) => codes::IO_ERROR,
        CommandError::CasesFailed { .. } => codes::CASES_FAILED,
        CommandError::ExportContract(_) => codes::EXPORT_CONTRACT,
    }
}
