//! Size bucketing and duplicate group types.
//!
//! # Overview
//!
//! Size bucketing is the first filter: files of different length can never be
//! identical, so only sizes shared by two or more files are handed to the
//! block comparator. No file content is read here.
//!
//! # Example
//!
//! ```
//! use blockdupe::scanner::FileEntry;
//! use blockdupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::FileEntry;

/// Files grouped by exact size, walk order preserved inside each bucket.
pub type SizeBuckets = HashMap<u64, Vec<PathBuf>>;

/// Confirmed group of byte-identical files.
///
/// The first path is the one kept when duplicates are deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// File size in bytes (shared by all files)
    pub size: u64,
    /// Paths in the order they were supplied to the comparator
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    #[must_use]
    pub fn new(size: u64, files: Vec<PathBuf>) -> Self {
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Space freed by keeping one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// The copy that is kept.
    #[must_use]
    pub fn original(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }

    /// Every copy except the original.
    #[must_use]
    pub fn duplicates(&self) -> &[PathBuf] {
        self.files.get(1..).unwrap_or_default()
    }
}

/// Statistics from size bucketing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of empty files encountered
    pub empty_files: usize,
    /// Number of buckets with 2+ files
    pub buckets: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Bucket files by exact size.
///
/// Only buckets holding two or more files are returned. Empty files are
/// bucketed like any other size; they only show up when the walker's
/// minimum size is 0.
///
/// # Example
///
/// ```
/// use blockdupe::scanner::FileEntry;
/// use blockdupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
///
/// assert_eq!(buckets.len(), 1);
/// assert_eq!(buckets[&100].len(), 2);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(files: impl IntoIterator<Item = FileEntry>) -> (SizeBuckets, GroupingStats) {
    let mut all: SizeBuckets = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }
        all.entry(file.size).or_default().push(file.path);
    }

    stats.unique_sizes = all.len();

    let buckets: SizeBuckets = all
        .into_iter()
        .filter(|(size, paths)| {
            if paths.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, paths[0].display());
                false
            } else {
                stats.potential_duplicates += paths.len();
                stats.buckets += 1;
                log::debug!("Size bucket {} bytes: {} candidates", size, paths.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size bucketing: {} files → {} candidates in {} bucket(s) ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.buckets,
        stats.elimination_rate()
    );

    (buckets, stats)
}
