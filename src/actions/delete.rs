//! Deletion of confirmed duplicates.
//!
//! The first path of every [`DuplicateGroup`] is kept, the rest are moved to
//! the system trash (default) or removed permanently. Before each removal the
//! file size is checked against the group size; a file that changed since it
//! was compared is left alone and reported as [`DeleteError::Modified`].
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::actions::delete::{delete_duplicates, DeleteConfig};
//! use blockdupe::duplicates::DuplicateGroup;
//! use std::path::PathBuf;
//!
//! let groups = vec![DuplicateGroup::new(
//!     3,
//!     vec![PathBuf::from("/data/a.txt"), PathBuf::from("/data/b.txt")],
//! )];
//! let result = delete_duplicates(&groups, &DeleteConfig::default(), None);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::duplicates::DuplicateGroup;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size no longer matches the compared size.
    #[error("file modified since comparison: {path} (expected {expected} bytes, found {actual})")]
    Modified {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, err: io::Error) -> Self {
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

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Configuration for deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Remove files permanently instead of moving them to the trash.
    pub permanent: bool,
}

impl DeleteConfig {
    /// Config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self { permanent: true }
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful deletion.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after a failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &str);

    /// Called once the batch is done.
    fn on_complete(&self, result: &BatchDeleteResult);
}

/// Delete one file after checking it still has `expected_size` bytes.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` / `Io` if the file can't be inspected
/// - `Modified` if its size differs from `expected_size`
/// - `TrashFailed` / `PermanentDeleteFailed` if the removal itself fails
pub fn delete_file(
    path: &Path,
    expected_size: u64,
    config: &DeleteConfig,
) -> Result<DeleteResult, DeleteError> {
    let actual = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();
    if actual != expected_size {
        log::warn!(
            "File modified since comparison: {} ({} -> {} bytes)",
            path.display(),
            expected_size,
            actual
        );
        return Err(DeleteError::Modified {
            path: path.to_path_buf(),
            expected: expected_size,
            actual,
        });
    }

    if config.permanent {
        fs::remove_file(path).map_err(|e| DeleteError::PermanentDeleteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Permanently deleted: {} ({} bytes)", path.display(), actual);
    } else {
        trash::delete(path).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), actual);
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size: actual,
        permanent: config.permanent,
    })
}

/// Delete every duplicate in `groups`, keeping the first path of each.
///
/// Failures are recorded and the batch carries on.
pub fn delete_duplicates(
    groups: &[DuplicateGroup],
    config: &DeleteConfig,
    callback: Option<&dyn DeleteProgressCallback>,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    let total: usize = groups.iter().map(DuplicateGroup::duplicate_count).sum();
    let mut index = 0;

    for group in groups {
        if let Some(kept) = group.original() {
            log::debug!("Keeping {}", kept.display());
        }

        for path in group.duplicates() {
            if let Some(cb) = callback {
                cb.on_before_delete(path, index, total);
            }
            index += 1;

            match delete_file(path, group.size, config) {
                Ok(deleted) => {
                    result.bytes_freed += deleted.size;
                    if let Some(cb) = callback {
                        cb.on_delete_success(path, deleted.size);
                    }
                    result.successes.push(deleted);
                }
                Err(e) => {
                    let message = e.to_string();
                    log::warn!("Failed to delete {}: {}", path.display(), message);
                    if let Some(cb) = callback {
                        cb.on_delete_failure(path, &message);
                    }
                    result.failures.push((path.clone(), message));
                }
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&result);
    }
    log::info!("{}", result.summary());

    result
}
