//! Export contract commands.

use checkgold_harness::{
    check_exports_resolvable, check_modules_import, check_reexports, executable_modules,
    ExportProbe, HarnessConfig, Logger, ProbeError,
};

use super::{CommandError, CommandResult};

/// Check re-exports and resolvability of the package's `__all__`.
///
/// Returns the violation messages; the command fails when there are any.
pub fn execute_exports<P: ExportProbe, L: Logger>(
    config: &HarnessConfig,
    probe: &P,
    logger: &L,
) -> CommandResult<Vec<String>> {
    logger.verbose(&format!(
        "checking re-exports of {} from {} submodules",
        config.package,
        config.export_sources.len()
    ));
    let mut violations = check_reexports(probe, &config.package, &config.export_sources)?;
    violations.extend(check_exports_resolvable(probe, &config.package)?);
    Ok(violations.iter().map(ToString::to_string).collect())
}

/// Import every module that must type-check cleanly.
pub fn execute_import_modules<P: ExportProbe, L: Logger>(
    config: &HarnessConfig,
    probe: &P,
    logger: &L,
) -> CommandResult<Vec<String>> {
    let modules = executable_modules(&config.fixtures());
    for module in &modules {
        logger.verbose(&format!("importing {}.{}", config.module_package, module));
    }
    let failures: Vec<ProbeError> = check_modules_import(probe, &config.module_package, &modules)?;
    Ok(failures.iter().map(ToString::to_string).collect())
}

/// Fail when any problem was reported.
pub fn ensure_clean(problems: &[String]) -> CommandResult<()> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(CommandError::ExportContract(problems.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkgold_harness::MockLogger;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct ScriptedProbe {
        all: HashMap<String, Vec<String>>,
        unresolvable: Vec<String>,
        broken_import: Option<String>,
        imported: RefCell<Vec<String>>,
    }

    impl ScriptedProbe {
        fn with_all(mut self, module: &str, names: &[&str]) -> Self {
            self.all
                .insert(module.to_string(), names.iter().map(|s| s.to_string()).collect());
            self
        }
    }

    impl ExportProbe for ScriptedProbe {
        fn export_list(&self, module: &str) -> Result<Vec<String>, ProbeError> {
            Ok(self.all.get(module).cloned().unwrap_or_default())
        }

        fn missing_attributes(&self, _module: &str, names: &[String]) -> Result<Vec<String>, ProbeError> {
            Ok(names
                .iter()
                .filter(|n| self.unresolvable.contains(n))
                .cloned()
                .collect())
        }

        fn import_module(&self, module: &str) -> Result<(), ProbeError> {
            self.imported.borrow_mut().push(module.to_string());
            if self.broken_import.as_deref() == Some(module) {
                return Err(ProbeError::ImportFailed {
                    module: module.to_string(),
                    detail: "ImportError: cannot import name 'x'".into(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_exports_clean() {
        let probe = ScriptedProbe::default()
            .with_all("pydantic", &["BaseModel", "AnyUrl"])
            .with_all("pydantic.main", &["BaseModel"])
            .with_all("pydantic.networks", &["AnyUrl"]);

        let problems = execute_exports(&HarnessConfig::default(), &probe, &MockLogger::new()).unwrap();
        assert!(problems.is_empty());
        assert!(ensure_clean(&problems).is_ok());
    }

    #[test]
    fn test_exports_reports_both_kinds() {
        let mut probe = ScriptedProbe::default()
            .with_all("pydantic", &["BaseModel", "Ghost"])
            .with_all("pydantic.types", &["StrictInt"]);
        probe.unresolvable = vec!["Ghost".into()];

        let problems = execute_exports(&HarnessConfig::default(), &probe, &MockLogger::new()).unwrap();

        assert_eq!(
            problems,
            vec![
                "StrictInt is in types.__all__ but missing from re-export in __init__.py",
                "Ghost is in pydantic.__all__ but missing from pydantic",
            ]
        );
        assert!(matches!(ensure_clean(&problems), Err(CommandError::ExportContract(2))));
    }

    #[test]
    fn test_import_modules_uses_module_package() {
        let probe = ScriptedProbe {
            broken_import: Some("tests.mypy.modules.success".into()),
            ..ScriptedProbe::default()
        };
        let logger = MockLogger::new();

        let problems = execute_import_modules(&HarnessConfig::default(), &probe, &logger).unwrap();

        assert_eq!(
            *probe.imported.borrow(),
            vec![
                "tests.mypy.modules.dataclass_no_any",
                "tests.mypy.modules.plugin_success",
                "tests.mypy.modules.plugin_success_baseConfig",
                "tests.mypy.modules.success",
            ]
        );
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("tests.mypy.modules.success failed to import"));
        assert!(logger.contains("importing tests.mypy.modules.plugin_success"));
    }
}
