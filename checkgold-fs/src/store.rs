//! Real and in-memory filesystem implementations.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("path error: {0}")]
    Path(String),
}

impl FsError {
    fn io(path: &Path, source: io::Error) -> Self {
        FsError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Trait for filesystem operations.
/// Abstracted for testing with mock implementations.
pub trait Filesystem: Send + Sync {
    /// Read file contents as a string.
    fn read_file(&self, path: &Path) -> Result<String, FsError>;

    /// Write data atomically (temp file, then rename), creating parent
    /// directories as needed.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError>;

    /// Check if a regular file exists at the path.
    fn is_file(&self, path: &Path) -> bool;
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(path).map_err(|e| FsError::io(path, e))
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
            }
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| FsError::Path(format!("no file name in {}", path.display())))?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        fs::write(&temp_path, data).map_err(|e| FsError::io(&temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| FsError::io(path, e))?;

        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Mock filesystem for testing.
/// Cloning creates a new handle to the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MockFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file directly (for test setup).
    pub fn add_file(&self, path: impl Into<PathBuf>, data: impl AsRef<[u8]>) {
        self.files
            .write()
            .unwrap()
            .insert(path.into(), data.as_ref().to_vec());
    }

    /// Get content of a specific file.
    pub fn get_file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().unwrap().get(path).cloned()
    }
}

impl Filesystem for MockFilesystem {
    fn read_file(&self, path: &Path) -> Result<String, FsError> {
        let files = self.files.read().unwrap();
        match files.get(path) {
            Some(data) => String::from_utf8(data.clone())
                .map_err(|e| FsError::Path(format!("invalid utf8: {}", e))),
            None => Err(FsError::io(
                path,
                io::Error::new(io::ErrorKind::NotFound, "file not found"),
            )),
        }
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), FsError> {
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }
}
