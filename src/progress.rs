//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements [`ProgressCallback`]
//! to display a spinner while walking directories and a bar over size buckets
//! while comparing. It also implements [`DeleteProgressCallback`] to show a
//! bar while duplicates are deleted.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::actions::{BatchDeleteResult, DeleteProgressCallback};

/// Phase name used while collecting files.
pub const PHASE_WALKING: &str = "walking";
/// Phase name used while comparing size buckets.
pub const PHASE_COMPARING: &str = "comparing";

/// Progress callback for the scan pipeline.
///
/// Implement this trait to receive progress updates. Implementations are
/// shared between bucket workers and must be thread-safe.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_WALKING`] or [`PHASE_COMPARING`])
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of items done so far
    /// * `label` - Path or bucket description
    fn on_progress(&self, current: usize, label: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    comparing: Mutex<Option<ProgressBar>>,
    deleting: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::stderr())
        };
        Self {
            multi,
            walking: Mutex::new(None),
            comparing: Mutex::new(None),
            deleting: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn comparing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} buckets ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn deleting_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.red/blue}] {pos}/{len} deleted {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn active_bar(&self) -> Option<ProgressBar> {
        if let Some(pb) = lock(&self.comparing).as_ref() {
            return Some(pb.clone());
        }
        lock(&self.walking).as_ref().cloned()
    }
}

/// Lock a progress slot; a poisoned lock only means a worker panicked mid-update.
fn lock(slot: &Mutex<Option<ProgressBar>>) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
    slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            PHASE_WALKING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Collecting files");
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.walking) = Some(pb);
            }
            _ => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::comparing_style());
                pb.set_message("Comparing");
                *lock(&self.comparing) = Some(pb);
            }
        }
    }

    fn on_progress(&self, current: usize, label: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_position(current as u64);
            pb.set_message(truncate_label(label, 40));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let (slot, done) = match phase {
            PHASE_WALKING => (&self.walking, "Collection complete"),
            _ => (&self.comparing, "Comparison complete"),
        };
        if let Some(pb) = lock(slot).take() {
            pb.finish_with_message(done);
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active_bar() {
            pb.set_message(message.to_string());
        }
    }
}

impl DeleteProgressCallback for Progress {
    fn on_before_delete(&self, path: &Path, index: usize, total: usize) {
        if self.quiet {
            return;
        }
        let mut slot = lock(&self.deleting);
        let pb = slot.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::deleting_style());
            pb
        });
        pb.set_position(index as u64);
        pb.set_message(truncate_label(&path.to_string_lossy(), 40));
    }

    fn on_delete_success(&self, _path: &Path, _size: u64) {
        if let Some(pb) = lock(&self.deleting).as_ref() {
            pb.inc(1);
        }
    }

    fn on_delete_failure(&self, _path: &Path, _error: &str) {
        if let Some(pb) = lock(&self.deleting).as_ref() {
            pb.inc(1);
        }
    }

    fn on_complete(&self, _result: &BatchDeleteResult) {
        // The caller prints the batch summary.
        if let Some(pb) = lock(&self.deleting).take() {
            pb.finish_and_clear();
        }
    }
}

/// Shorten a label for the progress bar, keeping its tail.
fn truncate_label(label: &str, max_len: usize) -> String {
    let count = label.chars().count();
    if count <= max_len {
        return label.to_string();
    }
    let tail: String = label.chars().skip(count - (max_len - 3)).collect();
    format!("...{}", tail)
}
