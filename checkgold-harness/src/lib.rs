//! Golden-output regression harness for a type-checker plugin.
//!
//! Runs the checker over a matrix of (config, module) fixtures, normalizes
//! its diagnostics, and compares them with golden files picked from
//! version-scoped output directories. Also checks that a malformed plugin
//! config is rejected with the right message and that the package's export
//! lists are consistent.

pub mod checker;
pub mod config;
pub mod exports;
pub mod logger;
pub mod matrix;
pub mod modules;
pub mod normalize;
pub mod plugin_config;
pub mod report;
pub mod resolver;
pub mod runner;

pub use checker::{Checker, CheckerError, CheckerOutput, CommandChecker, MockChecker, MockResponse};
pub use config::{ConfigError, HarnessConfig, DEFAULT_CONFIG_FILE};
pub use exports::{
    check_exports_resolvable, check_modules_import, check_reexports, ExportProbe, ExportSource,
    ExportViolation, ProbeError, PythonProbe,
};
pub use logger::{Logger, MockLogger, StderrLogger, Verbosity};
pub use matrix::{default_matrix, filter_fixtures, Environment, Fixture, MatrixError, SkipCondition};
pub use modules::executable_modules;
pub use normalize::Normalizer;
pub use plugin_config::{PluginConfigError, PluginSettings};
pub use report::{CaseErrorKind, CaseFailure, CaseOutcome, CaseStatus, RunReport, Summary};
pub use resolver::{OutputResolver, OutputRoot, ResolveError};
pub use runner::{MalformedConfigCase, RunError, Runner, RunnerOptions};
