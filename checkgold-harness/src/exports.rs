//! Public export contract of the package under test.
//!
//! The package's root `__all__` must include every name its public
//! submodules export, and every name in the root `__all__` must resolve to an
//! attribute. The fixture modules that are expected to type-check cleanly
//! must also import without error.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use checkgold_version::{parse_tool_version, VersionTuple};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Helper run by [`PythonProbe`]. `argv[1]` is the action, `argv[2]` the
/// module; results are printed as JSON.
const PROBE_SCRIPT: &str = r#"
import importlib, json, sys, warnings
action, module = sys.argv[1], sys.argv[2]
if action == "import":
    warnings.filterwarnings("ignore", message=".*is deprecated.*", category=DeprecationWarning)
    try:
        importlib.import_module(module)
    except Exception as exc:
        print(json.dumps({"error": f"{type(exc).__name__}: {exc}"}))
    else:
        print(json.dumps({"ok": True}))
    sys.exit(0)
mod = importlib.import_module(module)
if action == "all":
    print(json.dumps(list(getattr(mod, "__all__", []))))
elif action == "missing":
    print(json.dumps([n for n in sys.argv[3:] if not hasattr(mod, n)]))
else:
    sys.exit("unknown action: " + action)
"#;

/// Errors from probing the interpreter.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe of {module} failed: {stderr}")]
    Failed { module: String, stderr: String },

    #[error("{module} failed to import: {detail}")]
    ImportFailed { module: String, detail: String },

    #[error("unreadable probe output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("interpreter command is empty")]
    EmptyCommand,
}

/// Introspection of a Python package.
pub trait ExportProbe {
    /// The module's `__all__` (empty when undefined).
    fn export_list(&self, module: &str) -> Result<Vec<String>, ProbeError>;

    /// The subset of `names` that are not attributes of `module`.
    fn missing_attributes(&self, module: &str, names: &[String]) -> Result<Vec<String>, ProbeError>;

    /// Import `module`, ignoring deprecation warnings.
    fn import_module(&self, module: &str) -> Result<(), ProbeError>;
}

#[derive(Debug, Deserialize)]
struct ImportReply {
    #[serde(default)]
    error: Option<String>,
}

/// Probes by running the interpreter with a small helper script.
#[derive(Debug, Clone)]
pub struct PythonProbe {
    program: String,
    prefix: Vec<String>,
    workdir: Option<PathBuf>,
}

impl PythonProbe {
    pub fn from_command_line(command: &[String]) -> Result<Self, ProbeError> {
        let (program, prefix) = command.split_first().ok_or(ProbeError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            prefix: prefix.to_vec(),
            workdir: None,
        })
    }

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

    fn launch_error(&self, source: std::io::Error) -> ProbeError {
        ProbeError::Launch {
            program: self.program.clone(),
            source,
        }
    }

    fn run_script(&self, action: &str, module: &str, extra: &[String]) -> Result<String, ProbeError> {
        let output = self
            .command()
            .arg("-c")
            .arg(PROBE_SCRIPT)
            .arg(action)
            .arg(module)
            .args(extra)
            .output()
            .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                module: module.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Interpreter version from `--version`. Older interpreters print the
    /// banner on stderr.
    pub fn version(&self) -> Result<VersionTuple, ProbeError> {
        let output = self
            .command()
            .arg("--version")
            .output()
            .map_err(|e| self.launch_error(e))?;
        let mut banner = String::from_utf8_lossy(&output.stdout).into_owned();
        banner.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse_tool_version(&banner))
    }
}

impl ExportProbe for PythonProbe {
    fn export_list(&self, module: &str) -> Result<Vec<String>, ProbeError> {
        Ok(serde_json::from_str(&self.run_script("all", module, &[])?)?)
    }

    fn missing_attributes(&self, module: &str, names: &[String]) -> Result<Vec<String>, ProbeError> {
        Ok(serde_json::from_str(&self.run_script("missing", module, names)?)?)
    }

    fn import_module(&self, module: &str) -> Result<(), ProbeError> {
        let reply: ImportReply = serde_json::from_str(&self.run_script("import", module, &[])?)?;
        match reply.error {
            None => Ok(()),
            Some(detail) => Err(ProbeError::ImportFailed {
                module: module.to_string(),
                detail,
            }),
        }
    }
}

/// A submodule whose exports must be re-exported by the root package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSource {
    /// Name used in violation messages.
    pub label: String,
    pub module: String,
}

impl ExportSource {
    pub fn new(label: &str, module: &str) -> Self {
        Self {
            label: label.to_string(),
            module: module.to_string(),
        }
    }
}

pub fn default_export_sources() -> Vec<ExportSource> {
    vec![
        ExportSource::new("main", "pydantic.main"),
        ExportSource::new("network", "pydantic.networks"),
        ExportSource::new("tools", "pydantic.deprecated.tools"),
        ExportSource::new("types", "pydantic.types"),
    ]
}

/// A broken export contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportViolation {
    MissingReexport { label: String, export: String },
    Unresolvable { package: String, name: String },
}

impl fmt::Display for ExportViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportViolation::MissingReexport { label, export } => write!(
                f,
                "{export} is in {label}.__all__ but missing from re-export in __init__.py"
            ),
            ExportViolation::Unresolvable { package, name } => {
                write!(f, "{name} is in {package}.__all__ but missing from {package}")
            }
        }
    }
}

/// Every export of every source must appear in the package's `__all__`.
pub fn check_reexports<P: ExportProbe>(
    probe: &P,
    package: &str,
    sources: &[ExportSource],
) -> Result<Vec<ExportViolation>, ProbeError> {
    let root_all = probe.export_list(package)?;
    let mut violations = Vec::new();

    for source in sources {
        for export in probe.export_list(&source.module)? {
            if !root_all.contains(&export) {
                violations.push(ExportViolation::MissingReexport {
                    label: source.label.clone(),
                    export,
                });
            }
        }
    }
    Ok(violations)
}

/// Every name in the package's `__all__` must be an attribute of it.
pub fn check_exports_resolvable<P: ExportProbe>(
    probe: &P,
    package: &str,
) -> Result<Vec<ExportViolation>, ProbeError> {
    let root_all = probe.export_list(package)?;
    let missing = probe.missing_attributes(package, &root_all)?;
    Ok(missing
        .into_iter()
        .map(|name| ExportViolation::Unresolvable {
            package: package.to_string(),
            name,
        })
        .collect())
}

/// Import each module as `<module_package>.<module>`. Import failures are
/// collected; other probe errors abort.
pub fn check_modules_import<P: ExportProbe>(
    probe: &P,
    module_package: &str,
    modules: &[String],
) -> Result<Vec<ProbeError>, ProbeError> {
    let mut failures = Vec::new();
    for module in modules {
        match probe.import_module(&format!("{module_package}.{module}")) {
            Ok(()) => {}
            Err(err @ ProbeError::ImportFailed { .. }) => failures.push(err),
            Err(err) => return Err(err),
        }
    }
    Ok(failures)
}
