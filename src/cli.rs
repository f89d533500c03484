//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Compare everything directly inside two directories
//! blockdupe scan ~/Pictures ~/Backup
//!
//! # Descend two levels, only look at photos, read 64 KiB per round
//! blockdupe scan ~/Pictures --level 2 --mask jpg --mask png --block-size 64KiB
//!
//! # Remove duplicates (first copy of each group is kept)
//! blockdupe scan ~/Downloads --delete
//! ```

use std::path::PathBuf;

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

/// Block-wise duplicate file finder.
///
/// Files of equal size are read side by side one block at a time; a file is
/// dropped from comparison as soon as one of its blocks matches no other file.
#[derive(Debug, Parser)]
#[command(name = "blockdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan directories for duplicate files
    Scan(ScanArgs),
    /// List the available block digests
    Digests,
    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the scan subcommand.
///
/// Options left unset fall back to the configuration file, then to
/// `BLOCKDUPE_*` environment variables, then to built-in defaults.
#[derive(Debug, Args, Serialize)]
pub struct ScanArgs {
    /// Directories to scan
    #[arg(value_name = "DIR", required = true)]
    #[serde(skip)]
    pub paths: Vec<PathBuf>,

    /// Directories to skip together with their contents (repeatable)
    #[arg(short, long, value_name = "DIR")]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,

    /// Subdirectory depth to descend into (0 = only the given directories)
    #[arg(short, long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,

    /// File extensions to compare, e.g. `jpg` or `*.png` (repeatable)
    #[arg(short, long = "mask", value_name = "EXT")]
    #[serde(rename = "masks", skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<String>,

    /// Minimum file size to consider (e.g., 1, 10KB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,

    /// Bytes read per file per comparison round (e.g., 1024, 4KiB)
    #[arg(short, long, value_name = "SIZE", value_parser = parse_size)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u64>,

    /// Block digest: crc32, md5, sha256 or blake3
    #[arg(long = "hash", value_name = "NAME")]
    #[serde(rename = "hash", skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Number of size buckets compared in parallel
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    #[serde(skip)]
    pub output: OutputFormat,

    /// Delete every duplicate, keeping the first file of each group
    #[arg(long)]
    #[serde(skip)]
    pub delete: bool,

    /// Delete permanently instead of moving to trash
    ///
    /// Warning: Files cannot be recovered after permanent deletion.
    #[arg(long, requires = "delete")]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub permanent: bool,

    /// Follow symbolic links during scan
    #[arg(long)]
    #[serde(skip)]
    pub follow_symlinks: bool,
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub init: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One path per line, blank line between groups
    #[default]
    Text,
    /// JSON document for scripting
    Json,
    /// CSV, one row per file
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Plain numbers are bytes. Decimal (`KB`, `MB`, ...) and binary (`KiB`,
/// `MiB`, ...) suffixes are accepted, case-insensitively.
///
/// ```
/// use blockdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// ```
///
/// # Errors
///
/// Returns an error for an empty string, a malformed number or an unknown
/// suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    trimmed
        .parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{trimmed}': {e}"))
}
