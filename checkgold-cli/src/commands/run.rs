//! Run and list command orchestration.

use checkgold_fs::Filesystem;
use checkgold_harness::{
    filter_fixtures, Checker, Environment, HarnessConfig, Logger, RunReport, Runner,
};

use crate::cli::{ListArgs, OutputFormat, RunArgs};

use super::{CommandError, CommandResult};

/// Execute the run command.
///
/// Case failures and cases that could not run are part of the returned
/// report; only a bad filter is `Err`. The malformed-config case is left
/// out of filtered runs.
pub fn execute_run<C, F, L>(
    args: &RunArgs,
    config: &HarnessConfig,
    env: Environment,
    checker: &C,
    fs: &F,
    logger: &L,
) -> CommandResult<RunReport>
where
    C: Checker,
    F: Filesystem,
    L: Logger,
{
    let fixtures = filter_fixtures(&config.fixtures(), args.filter.as_deref())?;
    let malformed = if args.skip_malformed_config || args.filter.is_some() {
        None
    } else {
        Some(&config.malformed_config)
    };

    logger.debug(&format!(
        "checker {} / interpreter {}, {} fixtures",
        env.checker,
        env.interpreter,
        fixtures.len()
    ));

    let runner = Runner::new(
        checker,
        fs,
        logger,
        config.runner_options(args.create_missing),
        env,
    );
    Ok(runner.run_all(&fixtures, malformed))
}

/// Render a report in the requested format.
pub fn render_report(report: &RunReport, format: OutputFormat) -> CommandResult<String> {
    match format {
        OutputFormat::Text => Ok(report.render_text()),
        OutputFormat::Json => Ok(report.to_json()?),
    }
}

/// Fail when any case failed. Cases that could not run take precedence,
/// and the first of them decides the error kind.
pub fn ensure_passed(report: &RunReport) -> CommandResult<()> {
    if let Some((case, kind, message)) = report.first_error() {
        return Err(CommandError::CasesErrored {
            errored: report.summary.errored,
            total: report.summary.total,
            kind,
            first: format!("{}: {}", case.id, message),
        });
    }
    if report.all_passed() {
        Ok(())
    } else {
        Err(CommandError::CasesFailed {
            failed: report.summary.failed,
            total: report.summary.total,
        })
    }
}

/// Execute the list command: one line per fixture, with the skip reason
/// when the fixture would be skipped in `env`.
pub fn execute_list(args: &ListArgs, config: &HarnessConfig, env: &Environment) -> CommandResult<Vec<String>> {
    let fixtures = filter_fixtures(&config.fixtures(), args.filter.as_deref())?;
    Ok(fixtures
        .iter()
        .map(|fixture| match fixture.skip_reason(env) {
            Some(reason) => format!("{} (skip: {})", fixture.id(), reason),
            None => fixture.id(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkgold_fs::MockFilesystem;
    use checkgold_harness::{
        CaseErrorKind, CaseStatus, CheckerOutput, Fixture, MockChecker, MockLogger, MockResponse,
    };
    use checkgold_version::VersionTuple;
    use std::path::PathBuf;

    fn env(checker: &[u64]) -> Environment {
        Environment::new(VersionTuple::new(checker), VersionTuple::new(&[3, 11]))
    }

    fn run_args() -> RunArgs {
        RunArgs {
            filter: None,
            create_missing: false,
            skip_malformed_config: false,
            output: OutputFormat::Text,
        }
    }

    fn small_config() -> HarnessConfig {
        HarnessConfig {
            fixtures: Some(vec![
                Fixture::new("mypy-plugin.ini", "plugin_success.py", None),
                Fixture::new("mypy-plugin.ini", "plugin_fail.py", Some("plugin-fail.txt")),
            ]),
            root: PathBuf::new(),
            ..HarnessConfig::default()
        }
    }

    fn plugin_fail_checker() -> MockChecker {
        MockChecker::new(VersionTuple::new(&[1, 4, 1]))
            .on_module(
                "plugin_fail.py",
                MockResponse::Output(CheckerOutput::new(
                    "tests/mypy/modules/plugin_fail.py:24: error: Unexpected keyword argument  [call-arg]\nFound 1 error in 1 file (checked 1 source file)\n",
                    "",
                    1,
                )),
            )
            .on(
                "success.py",
                "pyproject-plugin-bad-param.toml",
                MockResponse::ValueError(
                    "Configuration value must be a boolean for key: init_forbid_extra".into(),
                ),
            )
    }

    #[test]
    fn test_execute_run_passes() {
        let fs = MockFilesystem::new();
        fs.add_file(
            "tests/mypy/outputs/latest/plugin-fail.txt",
            "24: error: Unexpected keyword argument  [call-arg]\n",
        );
        let checker = plugin_fail_checker();
        let logger = MockLogger::new();

        let report = execute_run(&run_args(), &small_config(), env(&[1, 4, 1]), &checker, &fs, &logger).unwrap();

        assert_eq!(report.summary.total, 3);
        assert!(report.all_passed(), "{}", report.render_text());
        assert!(ensure_passed(&report).is_ok());
        assert!(logger.contains("Executing: mypy tests/mypy/modules/plugin_fail.py"));
    }

    #[test]
    fn test_execute_run_filter_excludes_malformed_case() {
        let fs = MockFilesystem::new();
        let checker = plugin_fail_checker();
        let args = RunArgs {
            filter: Some("*::plugin_success.py".into()),
            ..run_args()
        };

        let report = execute_run(&args, &small_config(), env(&[1, 4, 1]), &checker, &fs, &MockLogger::new()).unwrap();

        assert_eq!(report.summary.total, 1);
        assert_eq!(checker.calls().len(), 1);
    }

    #[test]
    fn test_execute_run_failure_maps_to_cases_failed() {
        let fs = MockFilesystem::new();
        fs.add_file("tests/mypy/outputs/latest/plugin-fail.txt", "99: error: other\n");
        let checker = plugin_fail_checker();
        let args = RunArgs {
            skip_malformed_config: true,
            ..run_args()
        };

        let report = execute_run(&args, &small_config(), env(&[1, 4, 1]), &checker, &fs, &MockLogger::new()).unwrap();

        assert!(matches!(
            ensure_passed(&report),
            Err(CommandError::CasesFailed { failed: 1, total: 2 })
        ));
        assert!(render_report(&report, OutputFormat::Text)
            .unwrap()
            .contains("FAIL mypy-plugin.ini::plugin_fail.py"));
    }

    #[test]
    fn test_execute_run_missing_golden_is_reported_per_case() {
        let fs = MockFilesystem::new();
        let checker = plugin_fail_checker();

        let report = execute_run(&run_args(), &small_config(), env(&[1, 4, 1]), &checker, &fs, &MockLogger::new()).unwrap();

        assert_eq!(report.summary.total, 3);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.errored, 1);
        match ensure_passed(&report) {
            Err(CommandError::CasesErrored { errored, total, kind, first }) => {
                assert_eq!((errored, total), (1, 3));
                assert_eq!(kind, CaseErrorKind::GoldenNotFound);
                assert!(first.starts_with("mypy-plugin.ini::plugin_fail.py: could not find expected output file plugin-fail.txt"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_execute_run_bad_filter() {
        let fs = MockFilesystem::new();
        let checker = plugin_fail_checker();
        let args = RunArgs {
            filter: Some("nothing-matches".into()),
            ..run_args()
        };

        let result = execute_run(&args, &small_config(), env(&[1, 4, 1]), &checker, &fs, &MockLogger::new());
        assert!(matches!(result, Err(CommandError::Matrix(_))));
    }

    #[test]
    fn test_render_report_json() {
        let fs = MockFilesystem::new();
        let checker = plugin_fail_checker();
        let args = RunArgs {
            filter: Some("*::plugin_success.py".into()),
            ..run_args()
        };
        let report = execute_run(&args, &small_config(), env(&[1, 4, 1]), &checker, &fs, &MockLogger::new()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&render_report(&report, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["summary"]["passed"], 1);
        assert_eq!(json["cases"][0]["id"], "mypy-plugin.ini::plugin_success.py");
        assert_eq!(report.cases[0].status, CaseStatus::Passed);
    }

    #[test]
    fn test_execute_list_marks_skips() {
        let config = HarnessConfig::default();
        let args = ListArgs {
            filter: Some("mypy-default.ini::*".into()),
        };

        let lines = execute_list(&args, &config, &env(&[1, 4, 1])).unwrap();

        assert!(lines.iter().any(|l| l.starts_with("mypy-default.ini::success.py (skip: ")));
        assert!(lines.contains(&"mypy-default.ini::fail1.py".to_string()));
    }
}
