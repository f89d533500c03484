//! Scanner module for file collection and block hashing.
//!
//! This module provides functionality for:
//! - Directory walking with depth limits, exclusions and extension masks
//! - Pluggable block digests (CRC32, MD5, SHA-256, BLAKE3)
//! - Sequential, zero-padded block reading per candidate file
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and file discovery
//! - [`digest`]: Block hash algorithms
//! - [`cursor`]: Per-file block reader used by the comparator
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     level: 2,
//!     masks: vec!["jpg".to_string()],
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod cursor;
pub mod digest;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// Re-export main types
pub use cursor::StreamCursor;
pub use digest::{BlockDigest, BlockHash, DigestAlgorithm};
pub use walker::Walker;

/// A discovered regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Depth of subdirectories to descend into (0 = only the roots themselves).
    pub level: usize,

    /// Directories to skip, together with everything below them.
    pub exclude: Vec<PathBuf>,

    /// File extensions to keep (case-insensitive). Empty keeps every file.
    pub masks: Vec<String>,

    /// Minimum file size to include (in bytes).
    pub min_size: u64,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            level: 0,
            exclude: Vec::new(),
            masks: Vec::new(),
            min_size: 1,
            follow_symlinks: false,
        }
    }
}

/// Errors that can occur during directory scanning.
///
/// None of these stop a scan; the affected path is skipped.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Errors that can occur while reading a candidate file.
///
/// A failing candidate is dropped from its bucket; siblings keep going.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(err),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
