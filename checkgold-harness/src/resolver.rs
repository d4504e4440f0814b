//! Golden output lookup across version-scoped directories.
//!
//! Each output root carries a version floor. Only roots whose floor is at
//! least the installed checker version apply, and they are searched from
//! the lowest floor up, so an output captured for an older checker wins
//! over `latest` while that older checker is installed.

use std::fmt;
use std::path::{Path, PathBuf};

use checkgold_fs::Filesystem;
use checkgold_version::VersionTuple;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from golden output resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not find expected output file {file} in any of [{roots}]")]
    NotFound { file: String, roots: String },
}

/// A directory of golden outputs valid up to and including `floor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRoot {
    pub floor: VersionTuple,
    pub dir: PathBuf,
}

impl OutputRoot {
    pub fn new(floor: &[u64], dir: impl Into<PathBuf>) -> Self {
        Self {
            floor: VersionTuple::new(floor),
            dir: dir.into(),
        }
    }
}

impl fmt::Display for OutputRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.floor, self.dir.display())
    }
}

/// `v1.0.1` holds outputs for checkers up to 1.0.1, `latest` everything newer.
pub fn default_output_roots() -> Vec<OutputRoot> {
    vec![
        OutputRoot::new(&[1, 0, 1], "tests/mypy/outputs/v1.0.1"),
        OutputRoot::new(&[9999], "tests/mypy/outputs/latest"),
    ]
}

/// Resolves golden file names against a set of output roots.
pub struct OutputResolver<'a, F: Filesystem> {
    fs: &'a F,
    base: PathBuf,
    roots: Vec<OutputRoot>,
}

impl<'a, F: Filesystem> OutputResolver<'a, F> {
    /// Roots are sorted by floor; relative root directories are taken
    /// relative to `base`.
    pub fn new(fs: &'a F, base: &Path, roots: &[OutputRoot]) -> Self {
        let mut roots = roots.to_vec();
        roots.sort_by(|a, b| a.floor.cmp(&b.floor));
        Self {
            fs,
            base: base.to_path_buf(),
            roots,
        }
    }

    /// Roots that apply to the installed version, lowest floor first.
    pub fn applicable(&self, installed: &VersionTuple) -> Vec<&OutputRoot> {
        self.roots.iter().filter(|r| r.floor >= *installed).collect()
    }

    /// First applicable root containing `file`.
    pub fn resolve(&self, file: &str, installed: &VersionTuple) -> Result<PathBuf, ResolveError> {
        let applicable = self.applicable(installed);
        for root in &applicable {
            let candidate = self.base.join(&root.dir).join(file);
            if self.fs.is_file(&candidate) {
                return Ok(candidate);
            }
        }

        Err(ResolveError::NotFound {
            file: file.to_string(),
            roots: applicable
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Where a missing golden file is created: the highest-floor applicable
    /// root. `None` when no root applies to the installed version.
    pub fn creation_target(&self, file: &str, installed: &VersionTuple) -> Option<PathBuf> {
        self.applicable(installed)
            .last()
            .map(|root| self.base.join(&root.dir).join(file))
    }
}
