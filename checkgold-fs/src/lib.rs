//! Filesystem abstraction for checkgold.
//!
//! Golden files are read through the [`Filesystem`] trait so the resolver and
//! runner can be tested against [`MockFilesystem`]; the only write the harness
//! performs is first-run golden creation via [`Filesystem::write_atomic`].

pub mod store;

pub use store::{Filesystem, FsError, MockFilesystem, RealFilesystem};
