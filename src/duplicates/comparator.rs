//! Block-wise partition refinement over one size bucket.
//!
//! # Overview
//!
//! Every candidate of a bucket is read one block per round. After each round
//! the candidates are binned by the hash of their current block; a bin with a
//! single member proves that file unique and it is dropped immediately, so
//! reading stops as soon as files diverge. Bins are flat per round: two files
//! from different earlier bins that happen to agree on the current block share
//! a bin for that round only. The final grouping compares complete hash
//! sequences, which keeps such files apart.
//!
//! The comparator performs no output; it returns a [`BucketOutcome`] that the
//! orchestrator commits in one piece.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::DuplicateGroup;
use crate::scanner::{BlockDigest, BlockHash, HashError, StreamCursor};

/// Result of comparing one bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketOutcome {
    /// Shared file size of the bucket
    pub size: u64,
    /// Confirmed duplicate groups, ordered by first member's supply position
    pub groups: Vec<DuplicateGroup>,
    /// Candidates that could not be opened or read
    pub errors: Vec<HashError>,
    /// Number of candidates supplied
    pub files: usize,
    /// Number of refinement rounds executed
    pub rounds: usize,
    /// Non-empty blocks read across all candidates
    pub blocks_read: u64,
    /// Payload bytes read across all candidates
    pub bytes_read: u64,
    /// Candidates proven unique
    pub eliminated: usize,
    /// The run was abandoned because shutdown was requested
    pub interrupted: bool,
}

impl BucketOutcome {
    fn new(size: u64, files: usize) -> Self {
        Self {
            size,
            files,
            ..Default::default()
        }
    }

    /// Fold the read counters of a finished cursor into the totals.
    fn retire(&mut self, cursor: StreamCursor) {
        self.blocks_read += cursor.blocks_read() as u64;
        self.bytes_read += cursor.bytes_read();
    }
}

/// A candidate still in the running. The active list stays in supply order.
struct Candidate {
    cursor: StreamCursor,
}

/// Refines one bucket of equal-size files into duplicate groups.
#[derive(Clone)]
pub struct GroupComparator {
    digest: Arc<dyn BlockDigest>,
    block_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for GroupComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupComparator")
            .field("digest", &self.digest.algorithm())
            .field("block_size", &self.block_size)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .finish()
    }
}

impl GroupComparator {
    /// Create a comparator reading `block_size` bytes per round.
    #[must_use]
    pub fn new(digest: Arc<dyn BlockDigest>, block_size: usize) -> Self {
        debug_assert!(block_size > 0, "block size must be positive");
        Self {
            digest,
            block_size,
            shutdown_flag: None,
        }
    }

    /// Abandon runs once this flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compare the files of one bucket.
    ///
    /// `paths` must all have length `size`. Groups keep the order of `paths`.
    #[must_use]
    pub fn compare(&self, size: u64, paths: &[PathBuf]) -> BucketOutcome {
        let mut outcome = BucketOutcome::new(size, paths.len());
        if paths.len() < 2 {
            return outcome;
        }

        let mut active: Vec<Candidate> = Vec::with_capacity(paths.len());
        for path in paths {
            match StreamCursor::open(path, self.block_size) {
                Ok(cursor) => active.push(Candidate { cursor }),
                Err(e) => {
                    log::warn!("Failed to open {}: {}", path.display(), e);
                    outcome.errors.push(e);
                }
            }
        }

        while active.len() >= 2 {
            if self.is_shutdown_requested() {
                log::debug!("Shutdown requested, abandoning {} byte bucket", size);
                outcome.interrupted = true;
                for candidate in active.drain(..) {
                    outcome.retire(candidate.cursor);
                }
                return outcome;
            }
            outcome.rounds += 1;

            let mut bins: HashMap<BlockHash, Vec<usize>> = HashMap::new();
            let mut fates = vec![Fate::Eliminate; active.len()];
            for (slot, candidate) in active.iter_mut().enumerate() {
                match candidate.cursor.current_hash(self.digest.as_ref()) {
                    Ok(Some(hash)) => bins.entry(hash.clone()).or_default().push(slot),
                    Ok(None) => {}
                    Err(e) => {
                        log::warn!("Failed to read {}: {}", candidate.cursor.path().display(), e);
                        outcome.errors.push(e);
                        fates[slot] = Fate::Fail;
                    }
                }
            }

            if bins.is_empty() {
                // Every survivor is exhausted.
                for fate in fates.iter_mut().filter(|f| **f == Fate::Eliminate) {
                    *fate = Fate::Keep;
                }
                active = settle(active, &fates, &mut outcome);
                break;
            }

            for members in bins.values().filter(|m| m.len() >= 2) {
                for &slot in members {
                    fates[slot] = Fate::Keep;
                }
            }
            active = settle(active, &fates, &mut outcome);
            for candidate in &mut active {
                candidate.cursor.advance();
            }
        }

        outcome.groups = confirm_groups(size, &active);
        let confirmed: usize = outcome.groups.iter().map(DuplicateGroup::len).sum();
        outcome.eliminated += active.len() - confirmed;
        for candidate in active {
            outcome.retire(candidate.cursor);
        }

        log::debug!(
            "Bucket {} bytes: {} files, {} group(s), {} round(s), {} block(s) read",
            size,
            outcome.files,
            outcome.groups.len(),
            outcome.rounds,
            outcome.blocks_read
        );
        outcome
    }
}

/// What happens to a candidate at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Keep,
    Eliminate,
    Fail,
}

/// Drop every candidate not marked [`Fate::Keep`], releasing its handle.
fn settle(active: Vec<Candidate>, fates: &[Fate], outcome: &mut BucketOutcome) -> Vec<Candidate> {
    let mut survivors = Vec::with_capacity(active.len());
    for (candidate, fate) in active.into_iter().zip(fates) {
        match fate {
            Fate::Keep => {
                survivors.push(candidate);
                continue;
            }
            Fate::Eliminate => {
                log::trace!(
                    "Eliminated at block {}: {}",
                    candidate.cursor.position(),
                    candidate.cursor.path().display()
                );
                outcome.eliminated += 1;
            }
            Fate::Fail => {}
        }
        outcome.retire(candidate.cursor);
    }
    survivors
}

/// Group survivors by their complete hash sequence.
///
/// Survivors are in supply order, so groups come out ordered by their first
/// member and members keep supply order.
fn confirm_groups(size: u64, survivors: &[Candidate]) -> Vec<DuplicateGroup> {
    let mut slots: HashMap<&[BlockHash], usize> = HashMap::new();
    let mut members: Vec<Vec<&Path>> = Vec::new();

    for candidate in survivors {
        let next = members.len();
        let slot = *slots.entry(candidate.cursor.hashes()).or_insert(next);
        if slot == next {
            members.push(Vec::new());
        }
        members[slot].push(candidate.cursor.path());
    }

    members
        .into_iter()
        .filter(|paths| paths.len() >= 2)
        .map(|paths| {
            DuplicateGroup::new(size, paths.into_iter().map(Path::to_path_buf).collect())
        })
        .collect()
}
