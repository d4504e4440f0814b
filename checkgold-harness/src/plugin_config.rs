//! Reading the plugin's own options out of a checker config file.
//!
//! TOML configs carry the options under `[tool.pydantic-mypy]` and must use
//! real booleans. INI configs carry them under `[pydantic-mypy]` and accept
//! the usual INI spellings (`true/false`, `yes/no`, `on/off`, `1/0`).
//! Missing keys default to false.

use std::collections::HashMap;
use std::path::Path;

use checkgold_fs::{Filesystem, FsError};
use serde::Serialize;
use thiserror::Error;

/// Section name in INI configs; TOML nests it under `tool`.
pub const SECTION: &str = "pydantic-mypy";

/// Option keys the plugin reads.
pub const PLUGIN_KEYS: [&str; 4] = [
    "init_forbid_extra",
    "init_typed",
    "warn_required_dynamic_aliases",
    "debug_dataclass_transform",
];

/// Errors from plugin config loading.
#[derive(Debug, Error)]
pub enum PluginConfigError {
    #[error("Configuration value must be a boolean for key: {key}")]
    NotBoolean { key: String },

    #[error("Not a boolean: {value}")]
    IniNotBoolean { key: String, value: String },

    #[error("failed to read config: {0}")]
    Read(#[from] FsError),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Plugin options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PluginSettings {
    pub init_forbid_extra: bool,
    pub init_typed: bool,
    pub warn_required_dynamic_aliases: bool,
    pub debug_dataclass_transform: bool,
}

impl PluginSettings {
    fn set(&mut self, key: &str, value: bool) {
        match key {
            "init_forbid_extra" => self.init_forbid_extra = value,
            "init_typed" => self.init_typed = value,
            "warn_required_dynamic_aliases" => self.warn_required_dynamic_aliases = value,
            "debug_dataclass_transform" => self.debug_dataclass_transform = value,
            _ => {}
        }
    }
}

/// Load plugin settings, choosing the format by file extension.
pub fn load<F: Filesystem>(fs: &F, path: &Path) -> Result<PluginSettings, PluginConfigError> {
    let text = fs.read_file(path)?;
    if path.extension().map_or(false, |e| e == "toml") {
        from_toml_str(&text)
    } else {
        from_ini_str(&text)
    }
}

pub fn from_toml_str(text: &str) -> Result<PluginSettings, PluginConfigError> {
    let table: toml::Table = text.parse()?;
    let section = table
        .get("tool")
        .and_then(toml::Value::as_table)
        .and_then(|tool| tool.get(SECTION))
        .and_then(toml::Value::as_table);

    let mut settings = PluginSettings::default();
    let Some(section) = section else {
        return Ok(settings);
    };

    for key in PLUGIN_KEYS {
        match section.get(key) {
            None => {}
            Some(toml::Value::Boolean(value)) => settings.set(key, *value),
            Some(_) => {
                return Err(PluginConfigError::NotBoolean {
                    key: key.to_string(),
                })
            }
        }
    }
    Ok(settings)
}

pub fn from_ini_str(text: &str) -> Result<PluginSettings, PluginConfigError> {
    let section = ini_section(text, SECTION);

    let mut settings = PluginSettings::default();
    for key in PLUGIN_KEYS {
        if let Some(raw) = section.get(key) {
            let value = ini_bool(raw).ok_or_else(|| PluginConfigError::IniNotBoolean {
                key: key.to_string(),
                value: raw.clone(),
            })?;
            settings.set(key, value);
        }
    }
    Ok(settings)
}

/// Key/value pairs of one INI section. Keys are lowercased; later
/// duplicates win.
fn ini_section(text: &str, wanted: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut in_section = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim() == wanted;
            continue;
        }
        if !in_section {
            continue;
        }
        let split = line.find(|c: char| c == '=' || c == ':').map(|i| (&line[..i], &line[i + 1..]));
        if let Some((key, value)) = split {
            values.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    values
}

fn ini_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
