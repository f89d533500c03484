//! Bucket fan-out and the end-to-end scan pipeline.
//!
//! # Overview
//!
//! [`compare_buckets`] runs one [`GroupComparator`] per size bucket on a rayon
//! pool sized for disk I/O. Each finished bucket is committed to a
//! [`ResultSink`] in a single locked append, so a bucket abandoned on shutdown
//! never leaves half its groups behind.
//!
//! [`DuplicateFinder`] chains the whole pipeline:
//! 1. **Walk** - Collect files below the roots
//! 2. **Bucket** - Group files by exact size
//! 3. **Compare** - Refine each bucket block by block
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_block_size(4096));
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//!
//! println!("Found {} duplicate groups", groups.len());
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::comparator::{BucketOutcome, GroupComparator};
use super::{group_by_size, DuplicateGroup, SizeBuckets};
use crate::error::ConfigError;
use crate::progress::{ProgressCallback, PHASE_COMPARING, PHASE_WALKING};
use crate::scanner::{DigestAlgorithm, HashError, ScanError, Walker, WalkerConfig};

/// Default number of bytes read per candidate per round.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;

/// Default number of buckets compared concurrently.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for [`compare_buckets`].
#[derive(Clone)]
pub struct CompareConfig {
    /// Bytes read per candidate per round.
    pub block_size: usize,
    /// Block digest used for every bucket of the run.
    pub algorithm: DigestAlgorithm,
    /// Number of worker threads. Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CompareConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompareConfig")
            .field("block_size", &self.block_size)
            .field("algorithm", &self.algorithm)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            algorithm: DigestAlgorithm::default(),
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl CompareConfig {
    /// Set the block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the block digest.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reject settings no run can work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero block size or thread count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidThreadCount);
        }
        Ok(())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from comparing size buckets.
#[derive(Debug, Clone, Default)]
pub struct CompareStats {
    /// Buckets handed to a comparator
    pub buckets_compared: usize,
    /// Buckets skipped for holding fewer than two files
    pub buckets_skipped: usize,
    /// Files across all compared buckets
    pub files_compared: usize,
    /// Refinement rounds across all buckets
    pub rounds: usize,
    /// Non-empty blocks read
    pub blocks_read: u64,
    /// Payload bytes read
    pub bytes_read: u64,
    /// Candidates proven unique
    pub eliminated: usize,
    /// Files that could not be opened or read
    pub failed_files: usize,
    /// Errors for the failed files
    pub errors: Vec<HashError>,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of duplicate files (excluding the kept copy)
    pub duplicate_files: usize,
    /// Bytes freed by removing every duplicate
    pub reclaimable_space: u64,
    /// Whether any bucket was abandoned on shutdown
    pub interrupted: bool,
}

/// Collects bucket outcomes from concurrent workers.
#[derive(Debug, Default)]
pub struct ResultSink {
    inner: Mutex<(Vec<DuplicateGroup>, CompareStats)>,
}

impl ResultSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append everything a finished bucket produced, under one lock.
    pub fn commit(&self, outcome: BucketOutcome) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let (groups, stats) = &mut *guard;

        stats.buckets_compared += 1;
        stats.files_compared += outcome.files;
        stats.rounds += outcome.rounds;
        stats.blocks_read += outcome.blocks_read;
        stats.bytes_read += outcome.bytes_read;
        stats.eliminated += outcome.eliminated;
        stats.failed_files += outcome.errors.len();
        stats.errors.extend(outcome.errors);
        stats.interrupted |= outcome.interrupted;

        for group in &outcome.groups {
            stats.duplicate_groups += 1;
            stats.duplicate_files += group.duplicate_count();
            stats.reclaimable_space += group.wasted_space();
        }
        groups.extend(outcome.groups);
    }

    /// Take the collected groups and statistics.
    #[must_use]
    pub fn into_parts(self) -> (Vec<DuplicateGroup>, CompareStats) {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compare every size bucket and collect the confirmed duplicate groups.
///
/// Groups are returned sorted by size (largest first), then by first path.
/// Members of a group keep their bucket order.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configuration is invalid. Nothing is read
/// in that case.
pub fn compare_buckets(
    buckets: SizeBuckets,
    config: &CompareConfig,
) -> Result<(Vec<DuplicateGroup>, CompareStats), ConfigError> {
    config.validate()?;

    let total = buckets.len();
    let mut eligible: Vec<(u64, Vec<PathBuf>)> = buckets
        .into_iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .collect();
    // Largest buckets first so big reads start early.
    eligible.sort_by(|a, b| b.0.cmp(&a.0));
    let skipped = total - eligible.len();

    log::info!(
        "Comparing {} bucket(s) with {} blocks of {} bytes on {} thread(s)",
        eligible.len(),
        config.algorithm,
        config.block_size,
        config.io_threads
    );

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_COMPARING, eligible.len());
    }

    let mut comparator = GroupComparator::new(config.algorithm.build(), config.block_size);
    if let Some(ref flag) = config.shutdown_flag {
        comparator = comparator.with_shutdown_flag(flag.clone());
    }

    let sink = ResultSink::new();
    let done = AtomicUsize::new(0);
    let run = || {
        eligible.par_iter().for_each(|(size, paths)| {
            let outcome = comparator.compare(*size, paths);
            sink.commit(outcome);

            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(ref callback) = config.progress_callback {
                callback.on_progress(finished, &format!("{} bytes", size));
            }
        });
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            log::warn!(
                "Failed to create custom thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            run();
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_COMPARING);
    }

    let (mut groups, mut stats) = sink.into_parts();
    stats.buckets_skipped = skipped;
    stats.interrupted |= config.is_shutdown_requested();
    groups.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.files.cmp(&b.files)));

    log::info!(
        "Comparison complete: {} group(s), {} duplicate(s), {} block(s) read, {} reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.blocks_read,
        ByteSize::b(stats.reclaimable_space)
    );

    Ok((groups, stats))
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Bytes read per candidate per round.
    pub block_size: usize,
    /// Block digest.
    pub algorithm: DigestAlgorithm,
    /// Number of I/O threads for bucket comparison.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("block_size", &self.block_size)
            .field("algorithm", &self.algorithm)
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            algorithm: DigestAlgorithm::default(),
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the block digest.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// The comparison settings of this configuration.
    #[must_use]
    pub fn compare_config(&self) -> CompareConfig {
        CompareConfig {
            block_size: self.block_size,
            algorithm: self.algorithm,
            io_threads: self.io_threads,
            shutdown_flag: self.shutdown_flag.clone(),
            progress_callback: self.progress_callback.clone(),
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size bucketing
    pub eliminated_by_size: usize,
    /// Number of files eliminated by block comparison
    pub eliminated_by_content: usize,
    /// Number of size buckets compared
    pub buckets: usize,
    /// Refinement rounds across all buckets
    pub rounds: usize,
    /// Blocks read during comparison
    pub blocks_read: u64,
    /// Bytes read during comparison
    pub bytes_read: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: std::time::Duration,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Paths that could not be walked
    pub scan_errors: Vec<ScanError>,
    /// Files that could not be read during comparison
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Number of paths that were skipped because of an error.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.scan_errors.len() + self.hash_errors.len()
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    fn absorb(&mut self, stats: CompareStats) {
        self.eliminated_by_content = stats.eliminated;
        self.buckets = stats.buckets_compared;
        self.rounds = stats.rounds;
        self.blocks_read = stats.blocks_read;
        self.bytes_read = stats.bytes_read;
        self.duplicate_groups = stats.duplicate_groups;
        self.duplicate_files = stats.duplicate_files;
        self.reclaimable_space = stats.reclaimable_space;
        self.interrupted = stats.interrupted;
        self.hash_errors = stats.errors;
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// No directory to scan was given.
    #[error("No directories to scan")]
    NoRoots,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The run configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Duplicate finder that runs the walk, bucket and compare pipeline.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files below the given roots.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - No root is given, or a root is missing or not a directory
    /// - The configuration is invalid
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = std::time::Instant::now();
        let mut summary = ScanSummary::default();

        if roots.is_empty() {
            return Err(FinderError::NoRoots);
        }
        for root in roots {
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.clone()));
            }
        }

        let compare_config = self.config.compare_config();
        compare_config.validate()?;

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALKING, 0);
        }

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => files.push(file),
                Err(e) => {
                    log::warn!("{}", e);
                    summary.scan_errors.push(e);
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALKING);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (buckets, size_stats) = group_by_size(files);
        summary.total_files = size_stats.total_files;
        summary.total_size = size_stats.total_size;
        summary.eliminated_by_size = size_stats.eliminated_unique;

        log::info!(
            "Found {} files ({})",
            summary.total_files,
            summary.total_size_display()
        );

        let (groups, compare_stats) = compare_buckets(buckets, &compare_config)?;
        summary.absorb(compare_stats);
        summary.scan_duration = start_time.elapsed();

        if summary.interrupted {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        Ok((groups, summary))
    }
}
