//! The fixture matrix: which module is checked under which config, and what
//! output is expected.
//!
//! Skip gating is evaluated at collection time against an [`Environment`]
//! holding the installed checker and interpreter versions.

use checkgold_version::VersionTuple;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from matrix selection.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("invalid fixture filter pattern: {0}")]
    InvalidPattern(String),

    #[error("no fixtures match filter: {0}")]
    NoMatch(String),
}

/// Installed tool versions that skip conditions are evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub checker: VersionTuple,
    pub interpreter: VersionTuple,
}

impl Environment {
    pub fn new(checker: VersionTuple, interpreter: VersionTuple) -> Self {
        Self {
            checker,
            interpreter,
        }
    }
}

/// Predicate over the environment under which a fixture is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCondition {
    /// Installed checker is strictly newer than the version.
    CheckerAbove(VersionTuple),
    /// Installed checker is strictly older than the version.
    CheckerBelow(VersionTuple),
    /// Interpreter is strictly older than the version.
    InterpreterBelow(VersionTuple),
    /// Any of the nested conditions holds.
    Any(Vec<SkipCondition>),
}

impl SkipCondition {
    pub fn holds(&self, env: &Environment) -> bool {
        match self {
            SkipCondition::CheckerAbove(v) => env.checker > *v,
            SkipCondition::CheckerBelow(v) => env.checker < *v,
            SkipCondition::InterpreterBelow(v) => env.interpreter < *v,
            SkipCondition::Any(conditions) => conditions.iter().any(|c| c.holds(env)),
        }
    }
}

/// A skip condition with the reason reported when it applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRule {
    pub when: SkipCondition,
    pub reason: String,
}

/// One (config, module, expected output) case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Checker configuration file name, relative to the configs directory.
    pub config: String,
    /// Input module file name, relative to the modules directory.
    pub module: String,
    /// Golden output file name; `None` means the run must be clean.
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipRule>,
}

impl Fixture {
    pub fn new(config: &str, module: &str, expected: Option<&str>) -> Self {
        Self {
            config: config.to_string(),
            module: module.to_string(),
            expected: expected.map(str::to_string),
            skip: None,
        }
    }

    /// Attach a skip rule.
    pub fn skip_when(mut self, when: SkipCondition, reason: &str) -> Self {
        self.skip = Some(SkipRule {
            when,
            reason: reason.to_string(),
        });
        self
    }

    /// Stable identifier, `<config>::<module>`.
    pub fn id(&self) -> String {
        format!("{}::{}", self.config, self.module)
    }

    pub fn expects_clean(&self) -> bool {
        self.expected.is_none()
    }

    /// The skip reason if this fixture's rule holds in `env`.
    pub fn skip_reason(&self, env: &Environment) -> Option<&str> {
        self.skip
            .as_ref()
            .filter(|rule| rule.when.holds(env))
            .map(|rule| rule.reason.as_str())
    }
}

fn v(parts: &[u64]) -> VersionTuple {
    VersionTuple::new(parts)
}

/// The plugin regression matrix.
pub fn default_matrix() -> Vec<Fixture> {
    let newer_than_1_0_1 = || SkipCondition::CheckerAbove(v(&[1, 0, 1]));
    const NEWER_REASON: &str = "Need to handle some more things for mypy >=1.1.1";

    vec![
        Fixture::new("mypy-plugin.ini", "plugin_success.py", None),
        Fixture::new("mypy-plugin.ini", "plugin_fail.py", Some("plugin-fail.txt")),
        Fixture::new("mypy-plugin.ini", "custom_constructor.py", Some("custom_constructor.txt")),
        Fixture::new("mypy-plugin-strict.ini", "plugin_success.py", Some("plugin-success-strict.txt")),
        Fixture::new("mypy-plugin-strict.ini", "plugin_fail.py", Some("plugin-fail-strict.txt")),
        Fixture::new("mypy-plugin-strict.ini", "fail_defaults.py", Some("fail_defaults.txt")),
        Fixture::new("mypy-default.ini", "success.py", None)
            .skip_when(newer_than_1_0_1(), NEWER_REASON),
        Fixture::new("mypy-default.ini", "fail1.py", Some("fail1.txt")),
        Fixture::new("mypy-default.ini", "fail2.py", Some("fail2.txt")),
        Fixture::new("mypy-default.ini", "fail3.py", Some("fail3.txt")),
        Fixture::new("mypy-default.ini", "fail4.py", Some("fail4.txt")),
        Fixture::new("mypy-default.ini", "plugin_success.py", Some("plugin_success.txt")),
        Fixture::new("mypy-plugin-strict-no-any.ini", "dataclass_no_any.py", None),
        Fixture::new("pyproject-default.toml", "success.py", None)
            .skip_when(newer_than_1_0_1(), NEWER_REASON),
        Fixture::new("pyproject-default.toml", "fail1.py", Some("fail1.txt")),
        Fixture::new("pyproject-default.toml", "fail2.py", Some("fail2.txt")),
        Fixture::new("pyproject-default.toml", "fail3.py", Some("fail3.txt")),
        Fixture::new("pyproject-default.toml", "fail4.py", Some("fail4.txt")),
        Fixture::new("pyproject-plugin.toml", "plugin_success.py", None),
        Fixture::new("pyproject-plugin.toml", "plugin_fail.py", Some("plugin-fail.txt")),
        Fixture::new("pyproject-plugin-strict.toml", "plugin_success.py", Some("plugin-success-strict.txt")),
        Fixture::new("pyproject-plugin-strict.toml", "plugin_fail.py", Some("plugin-fail-strict.txt")),
        Fixture::new("pyproject-plugin-strict.toml", "fail_defaults.py", Some("fail_defaults.txt")),
        Fixture::new("mypy-plugin-strict.ini", "plugin_default_factory.py", Some("plugin_default_factory.txt")),
        // Config-class variants
        Fixture::new("mypy-plugin.ini", "plugin_success_baseConfig.py", None),
        Fixture::new("mypy-plugin.ini", "plugin_fail_baseConfig.py", Some("plugin-fail-baseConfig.txt")),
        Fixture::new("mypy-plugin-strict.ini", "plugin_success_baseConfig.py", Some("plugin-success-strict-baseConfig.txt")),
        Fixture::new("mypy-plugin-strict.ini", "plugin_fail_baseConfig.py", Some("plugin-fail-strict-baseConfig.txt")),
        Fixture::new("mypy-default.ini", "plugin_success_baseConfig.py", Some("plugin_success_baseConfig.txt")),
        Fixture::new("pyproject-plugin.toml", "plugin_success_baseConfig.py", None),
        Fixture::new("pyproject-plugin.toml", "plugin_fail_baseConfig.py", Some("plugin-fail-baseConfig.txt")),
        Fixture::new("pyproject-plugin-strict.toml", "plugin_success_baseConfig.py", Some("plugin-success-strict-baseConfig.txt")),
        Fixture::new("pyproject-plugin-strict.toml", "plugin_fail_baseConfig.py", Some("plugin-fail-strict-baseConfig.txt")),
        Fixture::new("pyproject-default.toml", "computed_fields.py", Some("computed_fields.txt"))
            .skip_when(
                SkipCondition::Any(vec![
                    SkipCondition::InterpreterBelow(v(&[3, 8])),
                    SkipCondition::CheckerBelow(v(&[0, 982])),
                ]),
                "cached_property is only available in Python 3.8+, errors are different with mypy 0.971",
            ),
    ]
}

/// Keep fixtures whose id matches a glob pattern. `None` keeps everything.
pub fn filter_fixtures(fixtures: &[Fixture], pattern: Option<&str>) -> Result<Vec<Fixture>, MatrixError> {
    let Some(raw) = pattern else {
        return Ok(fixtures.to_vec());
    };

    let pattern = Pattern::new(raw).map_err(|_| MatrixError::InvalidPattern(raw.to_string()))?;
    let selected: Vec<Fixture> = fixtures
        .iter()
        .filter(|f| pattern.matches(&f.id()))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(MatrixError::NoMatch(raw.to_string()));
    }
    Ok(selected)
}
