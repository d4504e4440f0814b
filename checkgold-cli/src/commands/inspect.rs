//! Inspection commands: modules, check-config, parse-version.

use checkgold_fs::Filesystem;
use checkgold_harness::{executable_modules, plugin_config, HarnessConfig, PluginSettings};
use checkgold_version::{parse_version, VersionTuple};

use crate::cli::{CheckConfigArgs, ParseVersionArgs};

use super::CommandResult;

/// Modules that must type-check cleanly and import, one per line.
pub fn execute_modules(config: &HarnessConfig) -> Vec<String> {
    executable_modules(&config.fixtures())
}

/// Validate the plugin section of a checker config.
///
/// A bare file name that does not exist as given is looked up in the
/// configured configs directory.
pub fn execute_check_config<F: Filesystem>(
    args: &CheckConfigArgs,
    config: &HarnessConfig,
    fs: &F,
) -> CommandResult<PluginSettings> {
    let path = if fs.is_file(&args.path) {
        args.path.clone()
    } else {
        args.path
            .file_name()
            .map(|name| config.config_path(&name.to_string_lossy()))
            .filter(|candidate| fs.is_file(candidate))
            .unwrap_or_else(|| args.path.clone())
    };
    Ok(plugin_config::load(fs, &path)?)
}

/// Python-style tuple rendering: `()`, `(0,)`, `(0, 930)`.
pub fn format_version_tuple(version: &VersionTuple) -> String {
    match version.parts() {
        [] => "()".to_string(),
        [only] => format!("({only},)"),
        parts => {
            let joined: Vec<String> = parts.iter().map(u64::to_string).collect();
            format!("({})", joined.join(", "))
        }
    }
}

/// One `<input> -> <tuple>` line per version string.
pub fn execute_parse_version(args: &ParseVersionArgs) -> Vec<String> {
    args.versions
        .iter()
        .map(|raw| format!("{} -> {}", raw, format_version_tuple(&parse_version(raw))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use checkgold_fs::MockFilesystem;
    use checkgold_harness::PluginConfigError;
    use std::path::PathBuf;

    #[test]
    fn test_modules_default_matrix() {
        assert_eq!(
            execute_modules(&HarnessConfig::default()),
            vec!["dataclass_no_any", "plugin_success", "plugin_success_baseConfig", "success"]
        );
    }

    #[test]
    fn test_format_version_tuple() {
        assert_eq!(format_version_tuple(&VersionTuple::unknown()), "()");
        assert_eq!(format_version_tuple(&VersionTuple::new(&[0])), "(0,)");
        assert_eq!(format_version_tuple(&VersionTuple::new(&[0, 930])), "(0, 930)");
    }

    #[test]
    fn test_parse_version_lines() {
        let args = ParseVersionArgs {
            versions: vec![
                "0".into(),
                "0.930".into(),
                "0.940+dev.04cac4b5d911c4f9529e6ce86a27b44f28846f5d.dirty".into(),
            ],
        };
        assert_eq!(
            execute_parse_version(&args),
            vec![
                "0 -> (0,)",
                "0.930 -> (0, 930)",
                "0.940+dev.04cac4b5d911c4f9529e6ce86a27b44f28846f5d.dirty -> (0, 940)",
            ]
        );
    }

    #[test]
    fn test_check_config_bad_param_via_configs_dir() {
        let fs = MockFilesystem::new();
        fs.add_file(
            "tests/mypy/configs/pyproject-plugin-bad-param.toml",
            "[tool.pydantic-mypy]\ninit_forbid_extra = \"foo\"\n",
        );
        let config = HarnessConfig {
            root: PathBuf::new(),
            ..HarnessConfig::default()
        };
        let args = CheckConfigArgs {
            path: PathBuf::from("pyproject-plugin-bad-param.toml"),
        };

        let err = execute_check_config(&args, &config, &fs).unwrap_err();
        assert!(matches!(err, CommandError::PluginConfig(PluginConfigError::NotBoolean { .. })));
        assert_eq!(
            err.to_string(),
            "Configuration value must be a boolean for key: init_forbid_extra"
        );
    }

    #[test]
    fn test_check_config_valid_ini() {
        let fs = MockFilesystem::new();
        fs.add_file("cfg/mypy-plugin-strict.ini", "[pydantic-mypy]\ninit_typed = True\n");
        let args = CheckConfigArgs {
            path: PathBuf::from("cfg/mypy-plugin-strict.ini"),
        };

        let settings = execute_check_config(&args, &HarnessConfig::default(), &fs).unwrap();
        assert!(settings.init_typed);
        assert!(!settings.init_forbid_extra);
    }

    #[test]
    fn test_check_config_missing_file() {
        let fs = MockFilesystem::new();
        let args = CheckConfigArgs {
            path: PathBuf::from("missing.ini"),
        };
        assert!(matches!(
            execute_check_config(&args, &HarnessConfig::default(), &fs),
            Err(CommandError::PluginConfig(PluginConfigError::Read(_)))
        ));
    }
}
