//! Directory walker built on walkdir.
//!
//! # Overview
//!
//! The [`Walker`] collects the candidate files that later get bucketed by
//! size. It visits each root up to a configured depth, prunes excluded
//! directories together with their subtrees, keeps only files whose
//! extension matches one of the masks, and drops files below the minimum
//! size. Inaccessible paths are reported as [`ScanError`] values and the walk
//! carries on.
//!
//! Roots are canonicalized first, so every yielded path is absolute. Entries
//! are visited in file-name order, which fixes the order of paths inside each
//! size bucket and therefore inside each duplicate group.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::progress::ProgressCallback;

use super::{FileEntry, ScanError, WalkerConfig};

type EntryIter<'a> = Box<dyn Iterator<Item = Result<FileEntry, ScanError>> + 'a>;

/// Directory walker for file discovery across several roots.
pub struct Walker {
    /// Directories to scan, as given
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Excluded directories, canonicalized where possible
    excluded: Vec<PathBuf>,
    /// Normalized extension masks
    masks: Vec<String>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("roots", &self.roots)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker over `roots`.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        let excluded = config
            .exclude
            .iter()
            .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
            .collect();
        let masks = config
            .masks
            .iter()
            .map(|m| normalize_mask(m))
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            roots,
            config,
            excluded,
            masks,
            shutdown_flag: None,
            progress_callback: None,
        }
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|ex| path.starts_with(ex))
    }

    fn passes_mask_filter(&self, path: &Path) -> bool {
        if self.masks.is_empty() {
            return true;
        }
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.masks.iter().any(|m| *m == extension)
    }

    /// Walk every root, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A file reachable from two overlapping roots is yielded once.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut found = 0usize;

        self.roots
            .iter()
            .flat_map(move |root| self.walk_root(root))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter(move |result| match result {
                Ok(entry) => seen.insert(entry.path.clone()),
                Err(_) => true,
            })
            .inspect(move |result| {
                if let (Ok(entry), Some(cb)) = (result, self.progress_callback.as_ref()) {
                    found += 1;
                    cb.on_progress(found, &entry.path.to_string_lossy());
                }
            })
    }

    fn walk_root<'a>(&'a self, root: &'a Path) -> EntryIter<'a> {
        let canonical = match std::fs::canonicalize(root) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Skipping {}: {}", root.display(), e);
                return Box::new(std::iter::once(Err(ScanError::from_io(root, e))));
            }
        };

        if !canonical.is_dir() {
            log::warn!("Skipping {}: not a directory", root.display());
            return Box::new(std::iter::once(Err(ScanError::NotADirectory(
                root.to_path_buf(),
            ))));
        }

        if self.is_excluded(&canonical) {
            log::debug!("Root is excluded: {}", canonical.display());
            return Box::new(std::iter::empty());
        }

        log::debug!(
            "Walking {} (depth {})",
            canonical.display(),
            self.config.level
        );

        let walk = WalkDir::new(&canonical)
            .min_depth(1)
            .max_depth(self.config.level.saturating_add(1))
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                let pruned = entry.file_type().is_dir() && self.is_excluded(entry.path());
                if pruned {
                    log::trace!("Excluding directory: {}", entry.path().display());
                }
                !pruned
            });

        Box::new(walk.filter_map(move |result| match result {
            Ok(entry) => self.process_entry(&entry),
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| canonical.clone(), Path::to_path_buf);
                let err = ScanError::from_io(&path, io::Error::from(e));
                log::warn!("{}. Skipping.", err);
                Some(Err(err))
            }
        }))
    }

    fn process_entry(&self, entry: &walkdir::DirEntry) -> Option<Result<FileEntry, ScanError>> {
        // With follow_links the file type already reflects the link target;
        // without it, symlinks are neither files nor directories here.
        if !entry.file_type().is_file() {
            return None;
        }

        let path = entry.path();
        if !self.passes_mask_filter(path) {
            log::trace!("Skipping file due to mask filter: {}", path.display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                let err = ScanError::from_io(path, io::Error::from(e));
                log::warn!("{}. Skipping.", err);
                return Some(Err(err));
            }
        };

        let size = metadata.len();
        if size < self.config.min_size {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(FileEntry::new(path.to_path_buf(), size)))
    }
}

/// Reduce `*.TXT`, `.txt` and `txt` to the bare lowercase extension.
fn normalize_mask(mask: &str) -> String {
    mask.trim()
        .trim_start_matches('*')
        .trim_start_matches('.')
        .to_lowercase()
}
