//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `run` / `list` - the fixture matrix
//! - `modules` / `check-config` / `parse-version` - inspection helpers
//! - `exports` / `import-modules` - the package's public surface

pub mod exports;
pub mod inspect;
pub mod run;

pub use exports::{ensure_clean, execute_exports, execute_import_modules};
pub use inspect::{
    execute_check_config, execute_modules, execute_parse_version, format_version_tuple,
};
pub use run::{ensure_passed, execute_list, execute_run, render_report};

use std::path::Path;

use checkgold_fs::{Filesystem, FsError};
use checkgold_harness::{
    CaseErrorKind, Checker, CheckerError, ConfigError, Environment, HarnessConfig, MatrixError,
    PluginConfigError, ProbeError, DEFAULT_CONFIG_FILE,
};
use checkgold_version::{parse_version, VersionTuple};
use thiserror::Error;

use crate::cli::{split_command, Cli, CliError};

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Matrix(#[from] MatrixError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("{0}")]
    PluginConfig(#[from] PluginConfigError),

    #[error("checker error: {0}")]
    Checker(#[from] CheckerError),

    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    #[error("{errored} of {total} cases could not run; first: {first}")]
    CasesErrored {
        errored: usize,
        total: usize,
        kind: CaseErrorKind,
        first: String,
    },

    #[error("{failed} of {total} cases failed")]
    CasesFailed { failed: usize, total: usize },

    #[error("export contract violated ({0} problems)")]
    ExportContract(usize),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Load the harness config and apply CLI overrides.
///
/// An explicit `--config` must exist; otherwise `checkgold.toml` in the
/// working directory is used when present, and built-in defaults when not.
pub fn load_config<F: Filesystem>(cli: &Cli, fs: &F) -> CommandResult<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            if !fs.is_file(path) {
                return Err(CliError::ConfigNotFound(path.display().to_string()).into());
            }
            HarnessConfig::load(fs, path)?
        }
        None if fs.is_file(Path::new(DEFAULT_CONFIG_FILE)) => {
            HarnessConfig::load(fs, Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => HarnessConfig::default(),
    };

    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(raw) = &cli.checker {
        config.checker = split_command(raw, "--checker")?;
    }
    if let Some(raw) = &cli.python {
        config.python = split_command(raw, "--python")?;
    }
    Ok(config)
}

/// Installed tool versions, from overrides or by asking the tools.
pub fn resolve_environment<C, I>(cli: &Cli, checker: &C, interpreter: I) -> CommandResult<Environment>
where
    C: Checker,
    I: FnOnce() -> Result<VersionTuple, ProbeError>,
{
    let checker_version = match &cli.checker_version {
        Some(raw) => parse_version(raw),
        None => checker.version()?,
    };
    let interpreter_version = match &cli.python_version {
        Some(raw) => parse_version(raw),
        None => interpreter()?,
    };
    Ok(Environment::new(checker_version, interpreter_version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_from;
    use checkgold_fs::MockFilesystem;
    use checkgold_harness::MockChecker;
    use std::path::PathBuf;

    #[test]
    fn test_load_config_defaults_without_file() {
        let fs = MockFilesystem::new();
        let cli = parse_from(["checkgold", "modules"]).unwrap();
        assert_eq!(load_config(&cli, &fs).unwrap(), HarnessConfig::default());
    }

    #[test]
    fn test_load_config_picks_up_default_file() {
        let fs = MockFilesystem::new();
        fs.add_file(DEFAULT_CONFIG_FILE, "package = \"mylib\"\n");
        let cli = parse_from(["checkgold", "modules"]).unwrap();
        assert_eq!(load_config(&cli, &fs).unwrap().package, "mylib");
    }

    #[test]
    fn test_load_config_explicit_missing() {
        let fs = MockFilesystem::new();
        let cli = parse_from(["checkgold", "--config", "nope.toml", "modules"]).unwrap();
        assert!(matches!(
            load_config(&cli, &fs),
            Err(CommandError::InvalidArgument(CliError::ConfigNotFound(_)))
        ));
    }

    #[test]
    fn test_load_config_overrides() {
        let fs = MockFilesystem::new();
        fs.add_file("ci.toml", "root = \"/ignored\"\nchecker = [\"mypy\"]\n");
        let cli = parse_from([
            "checkgold",
            "--config",
            "ci.toml",
            "--root",
            "/src",
            "--python",
            "python3.11 -X dev",
            "modules",
        ])
        .unwrap();

        let config = load_config(&cli, &fs).unwrap();
        assert_eq!(config.root, PathBuf::from("/src"));
        assert_eq!(config.checker, vec!["mypy"]);
        assert_eq!(config.python, vec!["python3.11", "-X", "dev"]);
    }

    #[test]
    fn test_resolve_environment_overrides_skip_probing() {
        let checker = MockChecker::new(VersionTuple::new(&[1, 4, 1]));
        let cli = parse_from([
            "checkgold",
            "--checker-version",
            "0.940+dev.04cac4b5d9.dirty",
            "--python-version",
            "3.7",
            "modules",
        ])
        .unwrap();

        let env = resolve_environment(&cli, &checker, || panic!("interpreter probed")).unwrap();
        assert_eq!(env.checker, VersionTuple::new(&[0, 940]));
        assert_eq!(env.interpreter, VersionTuple::new(&[3, 7]));
    }

    #[test]
    fn test_resolve_environment_asks_tools() {
        let checker = MockChecker::new(VersionTuple::new(&[1, 4, 1]));
        let cli = parse_from(["checkgold", "modules"]).unwrap();

        let env = resolve_environment(&cli, &checker, || Ok(VersionTuple::new(&[3, 11, 4]))).unwrap();
        assert_eq!(env.checker, VersionTuple::new(&[1, 4, 1]));
        assert_eq!(env.interpreter, VersionTuple::new(&[3, 11, 4]));
    }
}
