//! Harness configuration (`checkgold.toml`).
//!
//! Every field has a default, so an empty file describes the stock pydantic
//! mypy plugin layout. Relative directories are resolved against `root`.

use std::path::{Path, PathBuf};

use checkgold_fs::{Filesystem, FsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::exports::{default_export_sources, ExportSource};
use crate::matrix::{default_matrix, Fixture};
use crate::normalize::DEFAULT_SOURCE_MARKER;
use crate::resolver::{default_output_roots, OutputRoot};
use crate::runner::{MalformedConfigCase, RunnerOptions};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "checkgold.toml";

/// Errors from loading the harness config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] FsError),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Working directory of the checker; golden roots are resolved here too.
    pub root: PathBuf,
    /// Command line that runs the checker.
    pub checker: Vec<String>,
    /// Command line that runs the interpreter (version and export probes).
    pub python: Vec<String>,
    pub modules_dir: PathBuf,
    pub configs_dir: PathBuf,
    pub cache_root: PathBuf,
    pub source_marker: String,
    /// Dotted package the input modules import as.
    pub module_package: String,
    /// Package whose export contract is checked.
    pub package: String,
    #[serde(rename = "output_root")]
    pub output_roots: Vec<OutputRoot>,
    pub malformed_config: MalformedConfigCase,
    #[serde(rename = "export_source")]
    pub export_sources: Vec<ExportSource>,
    /// Replaces the built-in matrix when present.
    #[serde(rename = "fixture", skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<Vec<Fixture>>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            checker: vec!["python".into(), "-m".into(), "mypy".into()],
            python: vec!["python".into()],
            modules_dir: PathBuf::from("tests/mypy/modules"),
            configs_dir: PathBuf::from("tests/mypy/configs"),
            cache_root: PathBuf::from(".mypy_cache"),
            source_marker: DEFAULT_SOURCE_MARKER.to_string(),
            module_package: "tests.mypy.modules".to_string(),
            package: "pydantic".to_string(),
            output_roots: default_output_roots(),
            malformed_config: MalformedConfigCase::default(),
            export_sources: default_export_sources(),
            fixtures: None,
        }
    }
}

impl HarnessConfig {
    pub fn load<F: Filesystem>(fs: &F, path: &Path) -> Result<Self, ConfigError> {
        let text = fs.read_file(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: HarnessConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checker.is_empty() {
            return Err(ConfigError::Invalid("checker command is empty".into()));
        }
        if self.python.is_empty() {
            return Err(ConfigError::Invalid("python command is empty".into()));
        }
        if self.source_marker.is_empty() {
            return Err(ConfigError::Invalid("source_marker is empty".into()));
        }
        if self.output_roots.is_empty() {
            return Err(ConfigError::Invalid("at least one output_root is required".into()));
        }
        if let Some(fixtures) = &self.fixtures {
            let mut seen = std::collections::HashSet::new();
            for fixture in fixtures {
                if !seen.insert(fixture.id()) {
                    return Err(ConfigError::Invalid(format!("duplicate fixture {}", fixture.id())));
                }
            }
        }
        Ok(())
    }

    /// The configured matrix, or the built-in one.
    pub fn fixtures(&self) -> Vec<Fixture> {
        self.fixtures.clone().unwrap_or_else(default_matrix)
    }

    /// Path of a checker config file on disk.
    pub fn config_path(&self, config: &str) -> PathBuf {
        self.root.join(&self.configs_dir).join(config)
    }

    pub fn runner_options(&self, create_missing: bool) -> RunnerOptions {
        RunnerOptions {
            root: self.root.clone(),
            modules_dir: self.modules_dir.clone(),
            configs_dir: self.configs_dir.clone(),
            cache_root: self.cache_root.clone(),
            output_roots: self.output_roots.clone(),
            source_marker: self.source_marker.clone(),
            create_missing,
        }
    }
}
