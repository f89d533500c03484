//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size bucketing of collected files
//! - Block-wise partition refinement inside one bucket
//! - Concurrent comparison of all buckets
//! - Duplicate group management

pub mod comparator;
pub mod finder;
pub mod groups;

pub use comparator::{BucketOutcome, GroupComparator};
pub use finder::{
    compare_buckets, CompareConfig, CompareStats, DuplicateFinder, FinderConfig, FinderError,
    ResultSink, ScanSummary, DEFAULT_BLOCK_SIZE, DEFAULT_IO_THREADS,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, SizeBuckets};
