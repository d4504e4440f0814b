//! The type checker seam.
//!
//! [`CommandChecker`] runs the checker as a subprocess. A plugin that rejects
//! its configuration aborts the checker with a Python traceback; the final
//! `ValueError: ...` line of such a traceback is surfaced as
//! [`CheckerError::Value`] from the invocation itself rather than being left
//! on stderr.

use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, RwLock};

use checkgold_version::{parse_tool_version, VersionTuple};
use thiserror::Error;

const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";
const VALUE_ERROR_PREFIX: &str = "ValueError: ";

/// Errors raised by a checker invocation.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The checker aborted with a value error (its message is kept verbatim).
    #[error("{0}")]
    Value(String),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} was terminated by a signal")]
    Terminated { program: String },

    #[error("checker command is empty")]
    EmptyCommand,
}

/// Captured result of one checker run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckerOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CheckerOutput {
    pub fn new(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }
}

/// A static type checker that can be invoked with an argument list.
pub trait Checker {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Run the checker synchronously.
    fn run(&self, args: &[String]) -> Result<CheckerOutput, CheckerError>;

    /// Installed checker version; unknown if it cannot be determined.
    fn version(&self) -> Result<VersionTuple, CheckerError>;
}

/// Runs the checker as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandChecker {
    name: String,
    program: String,
    prefix: Vec<String>,
    workdir: Option<PathBuf>,
}

impl CommandChecker {
    /// Build from a full command line, e.g. `["python", "-m", "mypy"]`.
    pub fn from_command_line(command: &[String]) -> Result<Self, CheckerError> {
        let (program, prefix) = command.split_first().ok_or(CheckerError::EmptyCommand)?;
        Ok(Self {
            name: "mypy".to_string(),
            program: program.clone(),
            prefix: prefix.to_vec(),
            workdir: None,
        })
    }

    /// Directory the checker runs in; fixture paths are relative to it.
    pub fn with_workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = Some(workdir);
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn launch_error(&self, source: std::io::Error) -> CheckerError {
        CheckerError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl Checker for CommandChecker {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, args: &[String]) -> Result<CheckerOutput, CheckerError> {
        let output = self
            .command()
            .args(args)
            .output()
            .map_err(|e| self.launch_error(e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if let Some(message) = value_error_message(&stderr) {
            return Err(CheckerError::Value(message));
        }

        let exit_code = output.status.code().ok_or_else(|| CheckerError::Terminated {
            program: self.program.clone(),
        })?;

        Ok(CheckerOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    fn version(&self) -> Result<VersionTuple, CheckerError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .map_err(|e| self.launch_error(e))?;
        Ok(parse_tool_version(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Message of the final `ValueError` in a Python traceback, if `stderr`
/// holds one.
pub fn value_error_message(stderr: &str) -> Option<String> {
    if !stderr.contains(TRACEBACK_HEADER) {
        return None;
    }
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| line.trim().strip_prefix(VALUE_ERROR_PREFIX))
        .map(|message| message.to_string())
}

/// Canned checker response for [`MockChecker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    Output(CheckerOutput),
    ValueError(String),
}

#[derive(Debug, Clone)]
struct MockRule {
    module: String,
    config: Option<String>,
    response: MockResponse,
}

/// Scripted checker for tests. Responses are matched on the module path
/// suffix (first argument) and optionally the config file suffix; unmatched
/// invocations succeed with empty output.
#[derive(Debug, Clone, Default)]
pub struct MockChecker {
    version: VersionTuple,
    rules: Vec<MockRule>,
    calls: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MockChecker {
    pub fn new(version: VersionTuple) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Respond to any config for this module.
    pub fn on_module(mut self, module: &str, response: MockResponse) -> Self {
        self.rules.push(MockRule {
            module: module.to_string(),
            config: None,
            response,
        });
        self
    }

    /// Respond to this module under this config only.
    pub fn on(mut self, module: &str, config: &str, response: MockResponse) -> Self {
        self.rules.push(MockRule {
            module: module.to_string(),
            config: Some(config.to_string()),
            response,
        });
        self
    }

    /// Argument lists of every invocation so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.read().unwrap().clone()
    }
}

impl Checker for MockChecker {
    fn name(&self) -> &str {
        "mypy"
    }

    fn run(&self, args: &[String]) -> Result<CheckerOutput, CheckerError> {
        self.calls.write().unwrap().push(args.to_vec());

        let module = args.first().map(String::as_str).unwrap_or("");
        let rule = self.rules.iter().find(|rule| {
            module.ends_with(&rule.module)
                && rule
                    .config
                    .as_ref()
                    .map_or(true, |config| args.iter().any(|a| a.ends_with(config.as_str())))
        });

        match rule.map(|r| &r.response) {
            Some(MockResponse::Output(output)) => Ok(output.clone()),
            Some(MockResponse::ValueError(message)) => Err(CheckerError::Value(message.clone())),
            None => Ok(CheckerOutput::default()),
        }
    }

    fn version(&self) -> Result<VersionTuple, CheckerError> {
        Ok(self.version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // -------------------------------------------
    // value_error_message
    // -------------------------------------------

    #[test]
    fn test_value_error_extracted_from_traceback() {
        let stderr = "Traceback (most recent call last):\n  File \"mypy/main.py\", line 1\n    ...\nValueError: Configuration value must be a boolean for key: init_forbid_extra\n";
        assert_eq!(
            value_error_message(stderr).as_deref(),
            Some("Configuration value must be a boolean for key: init_forbid_extra")
        );
    }

    #[test]
    fn test_other_exception_not_extracted() {
        let stderr = "Traceback (most recent call last):\n  File \"x\"\nKeyError: 'a'\n";
        assert_eq!(value_error_message(stderr), None);
    }

    #[test]
    fn test_value_error_without_traceback_ignored() {
        assert_eq!(value_error_message("ValueError: loose text\n"), None);
        assert_eq!(value_error_message(""), None);
    }

    // -------------------------------------------
    // CommandChecker
    // -------------------------------------------

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(
            CommandChecker::from_command_line(&[]),
            Err(CheckerError::EmptyCommand)
        ));
    }

    #[test]
    fn test_launch_failure() {
        let checker =
            CommandChecker::from_command_line(&args(&["/nonexistent/checkgold-no-such-binary"])).unwrap();
        let err = checker.run(&args(&["a.py"])).unwrap_err();
        assert!(matches!(err, CheckerError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_checker_captures_streams() {
        let checker = CommandChecker::from_command_line(&args(&[
            "sh",
            "-c",
            "echo \"$0:1: error: x\"; echo warn >&2; exit 1",
        ]))
        .unwrap();
        let output = checker.run(&args(&["m.py"])).unwrap();
        assert_eq!(output.stdout, "m.py:1: error: x\n");
        assert_eq!(output.stderr, "warn\n");
        assert_eq!(output.exit_code, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_checker_surfaces_value_error() {
        let checker = CommandChecker::from_command_line(&args(&[
            "sh",
            "-c",
            "printf 'Traceback (most recent call last):\\nValueError: bad key\\n' >&2; exit 2",
        ]))
        .unwrap();
        let err = checker.run(&args(&["m.py"])).unwrap_err();
        assert!(matches!(err, CheckerError::Value(ref m) if m == "bad key"));
        assert_eq!(err.to_string(), "bad key");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_checker_version() {
        let checker = CommandChecker::from_command_line(&args(&[
            "sh",
            "-c",
            "echo 'mypy 1.4.1 (compiled: yes)'",
        ]))
        .unwrap();
        assert_eq!(checker.version().unwrap(), VersionTuple::new(&[1, 4, 1]));
    }

    // -------------------------------------------
    // MockChecker
    // -------------------------------------------

    #[test]
    fn test_mock_checker_matches_module_and_config() {
        let checker = MockChecker::new(VersionTuple::new(&[1, 0, 1]))
            .on(
                "plugin_fail.py",
                "mypy-plugin.ini",
                MockResponse::Output(CheckerOutput::new("out", "", 1)),
            )
            .on_module("fail1.py", MockResponse::ValueError("boom".into()));

        let hit = checker
            .run(&args(&["tests/plugin_fail.py", "--config-file", "configs/mypy-plugin.ini"]))
            .unwrap();
        assert_eq!(hit.exit_code, 1);

        let miss = checker
            .run(&args(&["tests/plugin_fail.py", "--config-file", "configs/mypy-default.ini"]))
            .unwrap();
        assert_eq!(miss, CheckerOutput::default());

        assert!(matches!(
            checker.run(&args(&["fail1.py"])),
            Err(CheckerError::Value(_))
        ));
        assert_eq!(checker.calls().len(), 3);
    }
}
