//! JSON output formatter.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "size": 1024, "files": ["/data/a.bin", "/data/b.bin"] }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "blocks_read": 420,
//!     "bytes_read": 430080,
//!     "failed_files": 0,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "BD000"
//!   },
//!   "deletion": {
//!     "deleted": 9,
//!     "failed": 1,
//!     "bytes_freed": 46080,
//!     "failures": [{ "path": "/data/c.bin", "error": "File was modified since scan" }]
//!   }
//! }
//! ```
//!
//! `deletion` is present only when `--delete` ran. The exit code always
//! accounts for the deletion phase.

use std::io::Write;

use serde::Serialize;

use crate::actions::BatchDeleteResult;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Paths in group order; the first one is the kept copy
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            size: group.size,
            files: group
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Bytes that removing every duplicate would free
    pub reclaimable_space: u64,
    /// Blocks read while comparing
    pub blocks_read: u64,
    /// Bytes read while comparing
    pub bytes_read: u64,
    /// Paths skipped because of an error
    pub failed_files: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "BD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a scan summary and an exit code.
    #[must_use]
    pub fn new(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            blocks_read: summary.blocks_read,
            bytes_read: summary.bytes_read,
            failed_files: summary.failure_count(),
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            interrupted: summary.interrupted,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// A duplicate that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeleteFailure {
    pub path: String,
    pub error: String,
}

/// Result of the deletion phase in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeletion {
    /// Files removed or moved to the trash
    pub deleted: usize,
    /// Files left in place because of an error
    pub failed: usize,
    /// Bytes freed by the removed files
    pub bytes_freed: u64,
    pub failures: Vec<JsonDeleteFailure>,
}

impl From<&BatchDeleteResult> for JsonDeletion {
    fn from(result: &BatchDeleteResult) -> Self {
        Self {
            deleted: result.success_count(),
            failed: result.failure_count(),
            bytes_freed: result.bytes_freed,
            failures: result
                .failures
                .iter()
                .map(|(path, error)| JsonDeleteFailure {
                    path: path.to_string_lossy().into_owned(),
                    error: error.clone(),
                })
                .collect(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Deletion results, when duplicates were deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion: Option<JsonDeletion>,
}

impl JsonOutput {
    /// Build the document for `groups`.
    ///
    /// ```
    /// use blockdupe::duplicates::{DuplicateGroup, ScanSummary};
    /// use blockdupe::error::ExitCode;
    /// use blockdupe::output::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     4,
    ///     vec![PathBuf::from("/a"), PathBuf::from("/b")],
    /// )];
    /// let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::new(summary, exit_code),
            deletion: None,
        }
    }

    /// Attach the result of the deletion phase.
    #[must_use]
    pub fn with_deletion(mut self, result: &BatchDeleteResult) -> Self {
        self.deletion = Some(JsonDeletion::from(result));
        self
    }

    /// Serialize to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
