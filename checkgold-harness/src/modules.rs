//! Derive the set of modules that should also be importable.
//!
//! A fixture without an expected-output file asserts a clean check, so its
//! input module is expected to execute as well. Skip rules are not consulted
//! here: a module whose only clean fixture is skip-gated in the current
//! environment is still included.

use std::collections::BTreeSet;

use crate::matrix::Fixture;

/// Module names (file name without `.py`) of every clean fixture, sorted and
/// deduplicated.
pub fn executable_modules(fixtures: &[Fixture]) -> Vec<String> {
    let modules: BTreeSet<String> = fixtures
        .iter()
        .filter(|f| f.expects_clean())
        .map(|f| module_name(&f.module).to_string())
        .collect();
    modules.into_iter().collect()
}

/// Strip the `.py` extension from a module file name.
pub fn module_name(file_name: &str) -> &str {
    file_name.strip_suffix(".py").unwrap_or(file_name)
}
