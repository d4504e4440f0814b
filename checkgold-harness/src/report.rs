//! Case outcomes and run reports.

use std::fmt;

use checkgold_version::VersionTuple;
use serde::Serialize;
use similar::TextDiff;

const RULE_WIDTH: usize = 100;

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseFailure {
    /// The checker wrote to stderr.
    Stderr { stderr: String },
    /// Exit code differs from 0 (clean) / 1 (diagnostics).
    ExitCode { expected: i32, actual: i32 },
    /// Normalized output differs from the golden file.
    OutputMismatch { expected: String, actual: String },
    /// Golden file was missing and has been written for review.
    GoldenCreated { path: String },
    /// A malformed config was accepted by the checker.
    MissingValueError { expected: String },
    /// A malformed config was rejected with the wrong message.
    WrongValueError { expected: String, actual: String },
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseFailure::Stderr { stderr } => write!(f, "checker wrote to stderr: {}", stderr.trim_end()),
            CaseFailure::ExitCode { expected, actual } => {
                write!(f, "exit code {actual}, expected {expected}")
            }
            CaseFailure::OutputMismatch { .. } => f.write_str("output differs from golden file"),
            CaseFailure::GoldenCreated { path } => {
                write!(f, "wrote actual output to {path} since file did not exist")
            }
            CaseFailure::MissingValueError { expected } => {
                write!(f, "checker accepted the config, expected ValueError: {expected}")
            }
            CaseFailure::WrongValueError { expected, actual } => {
                write!(f, "ValueError: {actual}, expected ValueError: {expected}")
            }
        }
    }
}

/// Why a case could not be judged at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseErrorKind {
    /// The golden file is missing from every applicable output root.
    GoldenNotFound,
    /// The checker could not be run, or aborted with a value error.
    Checker,
    /// Reading or writing a golden file failed.
    Filesystem,
    /// No output root applies to the installed checker.
    NoOutputRoot,
}

/// Outcome status of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Skipped { reason: String },
    Failed { failure: CaseFailure },
    Errored { kind: CaseErrorKind, message: String },
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub actual_output: String,
    #[serde(flatten)]
    pub status: CaseStatus,
}

impl CaseOutcome {
    pub fn skipped(id: &str, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            command: Vec::new(),
            actual_output: String::new(),
            status: CaseStatus::Skipped {
                reason: reason.to_string(),
            },
        }
    }

    pub fn errored(id: &str, kind: CaseErrorKind, message: &str) -> Self {
        Self {
            id: id.to_string(),
            command: Vec::new(),
            actual_output: String::new(),
            status: CaseStatus::Errored {
                kind,
                message: message.to_string(),
            },
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }

    pub fn failure(&self) -> Option<&CaseFailure> {
        match &self.status {
            CaseStatus::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

/// Outcomes of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub checker_version: VersionTuple,
    pub interpreter_version: VersionTuple,
    pub summary: Summary,
    pub cases: Vec<CaseOutcome>,
}

impl RunReport {
    pub fn new(checker_version: VersionTuple, interpreter_version: VersionTuple) -> Self {
        Self {
            checker_version,
            interpreter_version,
            summary: Summary::default(),
            cases: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: CaseOutcome) {
        self.summary.total += 1;
        match outcome.status {
            CaseStatus::Passed => self.summary.passed += 1,
            CaseStatus::Skipped { .. } => self.summary.skipped += 1,
            CaseStatus::Failed { .. } => self.summary.failed += 1,
            CaseStatus::Errored { .. } => self.summary.errored += 1,
        }
        self.cases.push(outcome);
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0 && self.summary.errored == 0
    }

    /// The first case that could not be judged, with its error.
    pub fn first_error(&self) -> Option<(&CaseOutcome, CaseErrorKind, &str)> {
        self.cases.iter().find_map(|case| match &case.status {
            CaseStatus::Errored { kind, message } => Some((case, *kind, message.as_str())),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.cases.iter().filter(|c| c.failure().is_some())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report: one line per case, then details for each
    /// failure, then the summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "checker {} / interpreter {}\n",
            self.checker_version, self.interpreter_version
        ));

        for case in &self.cases {
            match &case.status {
                CaseStatus::Passed => out.push_str(&format!("PASS {}\n", case.id)),
                CaseStatus::Skipped { reason } => {
                    out.push_str(&format!("SKIP {} ({})\n", case.id, reason))
                }
                CaseStatus::Failed { failure } => {
                    out.push_str(&format!("FAIL {}: {}\n", case.id, failure))
                }
                CaseStatus::Errored { message, .. } => {
                    out.push_str(&format!("ERROR {}: {}\n", case.id, message))
                }
            }
        }

        for case in self.failures() {
            out.push('\n');
            out.push_str(&render_failure_detail(case));
        }

        let errored = match self.summary.errored {
            0 => String::new(),
            n => format!("{n} errored, "),
        };
        out.push_str(&format!(
            "\n{} passed, {} failed, {}{} skipped ({} total)\n",
            self.summary.passed, self.summary.failed, errored, self.summary.skipped, self.summary.total
        ));
        out
    }
}

/// A titled block fenced by full-width rules.
pub fn output_block(title: &str, body: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title:^width$}\n{rule}\n{body}\n{rule}\n", width = RULE_WIDTH)
}

/// Unified diff from golden to actual.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    let mut expected = expected.to_string();
    let mut actual = actual.to_string();
    expected.push('\n');
    actual.push('\n');

    TextDiff::from_lines(&expected, &actual)
        .unified_diff()
        .context_radius(3)
        .header("expected", "actual")
        .to_string()
}

fn render_failure_detail(case: &CaseOutcome) -> String {
    let mut out = format!("--- {} ---\n", case.id);
    if !case.command.is_empty() {
        out.push_str(&format!("Executing: mypy {}\n", case.command.join(" ")));
    }
    if !case.actual_output.is_empty() {
        out.push_str(&output_block("mypy output", &case.actual_output));
    }
    match case.failure() {
        Some(CaseFailure::OutputMismatch { expected, actual }) => {
            out.push_str(&unified_diff(expected, actual));
        }
        Some(CaseFailure::Stderr { stderr }) => {
            out.push_str(&output_block("stderr", stderr.trim_end()));
        }
        _ => {}
    }
    out
}
