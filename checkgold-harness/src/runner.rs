//! Runs fixtures through the checker and judges the results.

use std::path::{Path, PathBuf};

use checkgold_fs::{Filesystem, FsError};
use checkgold_version::VersionTuple;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checker::{Checker, CheckerError};
use crate::logger::Logger;
use crate::matrix::{Environment, Fixture};
use crate::normalize::{prepare_expected, Normalizer, DEFAULT_SOURCE_MARKER};
use crate::plugin_config::PluginConfigError;
use crate::report::{CaseErrorKind, CaseFailure, CaseOutcome, CaseStatus, RunReport};
use crate::resolver::{default_output_roots, OutputResolver, OutputRoot, ResolveError};

/// `--disable-recursive-aliases` exists from this checker version on.
pub const RECURSIVE_ALIASES_FLAG_SINCE: [u64; 2] = [0, 990];

/// Errors that stop a single case from being judged.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("checker error: {0}")]
    Checker(#[from] CheckerError),

    #[error("filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("no output root applies to checker version {0}")]
    NoOutputRoot(VersionTuple),
}

impl RunError {
    pub fn kind(&self) -> CaseErrorKind {
        match self {
            RunError::Resolve(_) => CaseErrorKind::GoldenNotFound,
            RunError::Checker(_) => CaseErrorKind::Checker,
            RunError::Fs(_) => CaseErrorKind::Filesystem,
            RunError::NoOutputRoot(_) => CaseErrorKind::NoOutputRoot,
        }
    }
}

/// Directory layout and behavior switches for a run.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Base directory for filesystem lookups (golden files).
    pub root: PathBuf,
    /// Directory of input modules, relative to the checker's workdir.
    pub modules_dir: PathBuf,
    /// Directory of checker configs, relative to the checker's workdir.
    pub configs_dir: PathBuf,
    /// Parent of the per-config cache directories.
    pub cache_root: PathBuf,
    pub output_roots: Vec<OutputRoot>,
    pub source_marker: String,
    /// Write missing golden files (the case still fails).
    pub create_missing: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            modules_dir: PathBuf::from("tests/mypy/modules"),
            configs_dir: PathBuf::from("tests/mypy/configs"),
            cache_root: PathBuf::from(".mypy_cache"),
            output_roots: default_output_roots(),
            source_marker: DEFAULT_SOURCE_MARKER.to_string(),
            create_missing: false,
        }
    }
}

/// A config the plugin must reject with a value error naming `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MalformedConfigCase {
    pub config: String,
    pub module: String,
    pub key: String,
}

impl Default for MalformedConfigCase {
    fn default() -> Self {
        Self {
            config: "pyproject-plugin-bad-param.toml".to_string(),
            module: "success.py".to_string(),
            key: "init_forbid_extra".to_string(),
        }
    }
}

impl MalformedConfigCase {
    pub fn id(&self) -> String {
        format!("{}::{}", self.config, self.module)
    }

    /// The exact message the checker must fail with.
    pub fn expected_message(&self) -> String {
        PluginConfigError::NotBoolean {
            key: self.key.clone(),
        }
        .to_string()
    }
}

/// Cache directory for a config: `<cache_root>/test-<config stem>`.
///
/// Each config gets its own cache so results from one preset never leak into
/// another.
pub fn cache_dir_for(cache_root: &Path, config: &str) -> PathBuf {
    let stem = Path::new(config)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.to_string());
    cache_root.join(format!("test-{stem}"))
}

/// Checker arguments for one module/config pair.
pub fn build_invocation(
    options: &RunnerOptions,
    config: &str,
    module: &str,
    checker_version: &VersionTuple,
    show_traceback: bool,
) -> Vec<String> {
    let mut args = vec![
        options.modules_dir.join(module).display().to_string(),
        "--config-file".to_string(),
        options.configs_dir.join(config).display().to_string(),
        "--cache-dir".to_string(),
        cache_dir_for(&options.cache_root, config).display().to_string(),
        "--show-error-codes".to_string(),
    ];
    if show_traceback {
        args.push("--show-traceback".to_string());
    }
    if *checker_version >= VersionTuple::new(&RECURSIVE_ALIASES_FLAG_SINCE) {
        args.push("--disable-recursive-aliases".to_string());
    }
    args
}

/// Drives fixtures through a checker.
pub struct Runner<'a, C: Checker, F: Filesystem, L: Logger> {
    checker: &'a C,
    fs: &'a F,
    logger: &'a L,
    options: RunnerOptions,
    env: Environment,
    normalizer: Normalizer,
}

impl<'a, C: Checker, F: Filesystem, L: Logger> Runner<'a, C, F, L> {
    pub fn new(checker: &'a C, fs: &'a F, logger: &'a L, options: RunnerOptions, env: Environment) -> Self {
        let normalizer = Normalizer::new(&options.source_marker);
        Self {
            checker,
            fs,
            logger,
            options,
            env,
            normalizer,
        }
    }

    fn resolver(&self) -> OutputResolver<'_, F> {
        OutputResolver::new(self.fs, &self.options.root, &self.options.output_roots)
    }

    fn invoke(&self, args: &[String]) -> Result<crate::checker::CheckerOutput, CheckerError> {
        self.logger
            .verbose(&format!("Executing: {} {}", self.checker.name(), args.join(" ")));
        self.checker.run(args)
    }

    /// Run every fixture, then the malformed-config case if given. A case
    /// that cannot be judged is recorded as errored and the run goes on.
    pub fn run_all(&self, fixtures: &[Fixture], malformed: Option<&MalformedConfigCase>) -> RunReport {
        let mut report = RunReport::new(self.env.checker.clone(), self.env.interpreter.clone());
        for fixture in fixtures {
            report.push(self.settle(&fixture.id(), self.run_case(fixture)));
        }
        if let Some(case) = malformed {
            report.push(self.settle(&case.id(), self.run_malformed_config(case)));
        }
        report
    }

    fn settle(&self, id: &str, result: Result<CaseOutcome, RunError>) -> CaseOutcome {
        result.unwrap_or_else(|err| {
            self.logger.info(&format!("{id}: {err}"));
            CaseOutcome::errored(id, err.kind(), &err.to_string())
        })
    }

    /// Run one fixture.
    pub fn run_case(&self, fixture: &Fixture) -> Result<CaseOutcome, RunError> {
        let id = fixture.id();
        if let Some(reason) = fixture.skip_reason(&self.env) {
            self.logger.verbose(&format!("skipping {id}: {reason}"));
            return Ok(CaseOutcome::skipped(&id, reason));
        }

        let installed = &self.env.checker;
        let resolver = self.resolver();

        // `Some(Ok(path))` golden found, `Some(Err(target))` golden missing and
        // creation enabled, `None` clean run expected.
        let golden: Option<Result<PathBuf, PathBuf>> = match &fixture.expected {
            None => None,
            Some(file) => match resolver.resolve(file, installed) {
                Ok(path) => Some(Ok(path)),
                Err(err) if self.options.create_missing => {
                    let target = resolver
                        .creation_target(file, installed)
                        .ok_or_else(|| RunError::NoOutputRoot(installed.clone()))?;
                    self.logger.debug(&format!("{err}; will create {}", target.display()));
                    Some(Err(target))
                }
                Err(err) => return Err(err.into()),
            },
        };

        let args = build_invocation(&self.options, &fixture.config, &fixture.module, installed, true);
        let output = self.invoke(&args)?;
        let actual = self.normalizer.normalize(&output.stdout);

        let failure = self.judge(fixture, &output, &actual, golden)?;
        let status = match failure {
            Some(failure) => CaseStatus::Failed { failure },
            None => CaseStatus::Passed,
        };

        Ok(CaseOutcome {
            id,
            command: args,
            actual_output: actual,
            status,
        })
    }

    fn judge(
        &self,
        fixture: &Fixture,
        output: &crate::checker::CheckerOutput,
        actual: &str,
        golden: Option<Result<PathBuf, PathBuf>>,
    ) -> Result<Option<CaseFailure>, RunError> {
        if !output.stderr.is_empty() {
            return Ok(Some(CaseFailure::Stderr {
                stderr: output.stderr.clone(),
            }));
        }

        let expected_code = if fixture.expects_clean() { 0 } else { 1 };
        if output.exit_code != expected_code {
            return Ok(Some(CaseFailure::ExitCode {
                expected: expected_code,
                actual: output.exit_code,
            }));
        }

        let expected = match golden {
            None => String::new(),
            Some(Ok(path)) => prepare_expected(&self.fs.read_file(&path)?),
            Some(Err(target)) => {
                self.fs.write_atomic(&target, actual.as_bytes())?;
                self.logger
                    .info(&format!("wrote actual output to {}", target.display()));
                return Ok(Some(CaseFailure::GoldenCreated {
                    path: target.display().to_string(),
                }));
            }
        };

        let (actual, expected) = self.normalizer.comparable(actual, &expected, &self.env.checker);
        if actual != expected {
            return Ok(Some(CaseFailure::OutputMismatch { expected, actual }));
        }
        Ok(None)
    }

    /// Run the malformed-config case. The checker must fail with a value
    /// error carrying exactly the expected message.
    pub fn run_malformed_config(&self, case: &MalformedConfigCase) -> Result<CaseOutcome, RunError> {
        let args = build_invocation(&self.options, &case.config, &case.module, &self.env.checker, false);
        let expected = case.expected_message();

        let (status, actual_output) = match self.invoke(&args) {
            Err(CheckerError::Value(message)) if message == expected => (CaseStatus::Passed, String::new()),
            Err(CheckerError::Value(message)) => (
                CaseStatus::Failed {
                    failure: CaseFailure::WrongValueError {
                        expected,
                        actual: message,
                    },
                },
                String::new(),
            ),
            Err(err) => return Err(err.into()),
            Ok(output) => (
                CaseStatus::Failed {
                    failure: CaseFailure::MissingValueError { expected },
                },
                self.normalizer.normalize(&output.stdout),
            ),
        };

        Ok(CaseOutcome {
            id: case.id(),
            command: args,
            actual_output,
            status,
        })
    }
}
