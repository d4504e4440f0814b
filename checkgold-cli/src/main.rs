//! checkgold CLI binary.
//!
//! Entry point for the `checkgold` command-line tool.

use std::process::ExitCode;

use checkgold_cli::exit::{codes, exit_code};
use checkgold_cli::{
    ensure_clean, ensure_passed, execute_check_config, execute_exports, execute_import_modules,
    execute_list, execute_modules, execute_parse_version, execute_run, load_config,
    render_report, resolve_environment, CheckConfigArgs, Cli, Command, CommandResult, ListArgs,
    RunArgs,
};
use checkgold_fs::RealFilesystem;
use checkgold_harness::{
    CommandChecker, Environment, HarnessConfig, PythonProbe, StderrLogger, Verbosity,
};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StderrLogger::new(Verbosity::from_count(cli.verbose));

    let result = match &cli.command {
        Command::ParseVersion(args) => {
            print_lines(&execute_parse_version(args));
            Ok(())
        }
        command => load_config(&cli, &RealFilesystem).and_then(|config| match command {
            Command::Run(args) => run_run(&cli, args, &config, &logger),
            Command::List(args) => run_list(&cli, args, &config),
            Command::Modules => {
                print_lines(&execute_modules(&config));
                Ok(())
            }
            Command::CheckConfig(args) => run_check_config(args, &config),
            Command::Exports => run_exports(&config, &logger),
            Command::ImportModules => run_import_modules(&config, &logger),
            Command::ParseVersion(_) => Ok(()),
        }),
    };

    match result {
        Ok(()) => ExitCode::from(codes::SUCCESS as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn build_checker(config: &HarnessConfig) -> CommandResult<CommandChecker> {
    Ok(CommandChecker::from_command_line(&config.checker)?.with_workdir(config.root.clone()))
}

fn build_probe(config: &HarnessConfig) -> CommandResult<PythonProbe> {
    Ok(PythonProbe::from_command_line(&config.python)?.with_workdir(config.root.clone()))
}

fn environment(cli: &Cli, config: &HarnessConfig, checker: &CommandChecker) -> CommandResult<Environment> {
    // The interpreter is only launched when its version is not given.
    resolve_environment(cli, checker, || {
        PythonProbe::from_command_line(&config.python)
            .and_then(|probe| probe.with_workdir(config.root.clone()).version())
    })
}

/// Run the run command.
fn run_run(cli: &Cli, args: &RunArgs, config: &HarnessConfig, logger: &StderrLogger) -> CommandResult<()> {
    let checker = build_checker(config)?;
    let env = environment(cli, config, &checker)?;

    let report = execute_run(args, config, env, &checker, &RealFilesystem, logger)?;
    println!("{}", render_report(&report, args.output)?.trim_end());
    ensure_passed(&report)
}

/// Run the list command.
fn run_list(cli: &Cli, args: &ListArgs, config: &HarnessConfig) -> CommandResult<()> {
    let checker = build_checker(config)?;
    let env = environment(cli, config, &checker)?;
    print_lines(&execute_list(args, config, &env)?);
    Ok(())
}

/// Run the check-config command.
fn run_check_config(args: &CheckConfigArgs, config: &HarnessConfig) -> CommandResult<()> {
    let settings = execute_check_config(args, config, &RealFilesystem)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Run the exports command.
fn run_exports(config: &HarnessConfig, logger: &StderrLogger) -> CommandResult<()> {
    let probe = build_probe(config)?;
    report_problems(execute_exports(config, &probe, logger)?)
}

/// Run the import-modules command.
fn run_import_modules(config: &HarnessConfig, logger: &StderrLogger) -> CommandResult<()> {
    let probe = build_probe(config)?;
    report_problems(execute_import_modules(config, &probe, logger)?)
}

fn report_problems(problems: Vec<String>) -> CommandResult<()> {
    print_lines(&problems);
    ensure_clean(&problems)
}
