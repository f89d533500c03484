//! Plain text output.
//!
//! Each group is printed as one path per line, groups separated by a blank
//! line. The kept copy comes first. A one-line summary can be rendered
//! separately so the path list stays easy to pipe.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text output formatter.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Create a new text formatter.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write every group.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_groups<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (idx, group) in self.groups.iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            for path in &group.files {
                writeln!(writer, "{}", path.display())?;
            }
        }
        writer.flush()
    }

    /// One-line summary of the scan, styled when colors are enabled.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let summary = self.summary;
        if summary.duplicate_groups == 0 {
            return format!(
                "{} in {} files ({})",
                "No duplicates found".green(),
                summary.total_files,
                ByteSize::b(summary.total_size)
            );
        }

        let mut line = format!(
            "{} duplicate group(s), {} duplicate file(s), {} reclaimable ({:.1}%) in {} files",
            summary.duplicate_groups.bold(),
            summary.duplicate_files.bold(),
            ByteSize::b(summary.reclaimable_space).to_string().yellow().bold(),
            summary.wasted_percentage(),
            summary.total_files
        );
        let failures = summary.failure_count();
        if failures > 0 {
            line.push_str(&format!(
                ", {}",
                format!("{} path(s) skipped", failures).red()
            ));
        }
        line
    }
}
