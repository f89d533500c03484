//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the blockdupe application.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed, but some files could not be read or deleted)
/// - 4: Configuration error (rejected before any file was read)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Scan completed but encountered some non-fatal errors.
    PartialSuccess = 3,
    /// Configuration error: invalid block size, unknown digest, bad config file.
    ConfigError = 4,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "BD000",
            Self::GeneralError => "BD001",
            Self::NoDuplicates => "BD002",
            Self::PartialSuccess => "BD003",
            Self::ConfigError => "BD004",
            Self::Interrupted => "BD130",
        }
    }

    /// Pick the exit code for a completed run.
    #[must_use]
    pub fn for_outcome(groups: usize, failures: usize, interrupted: bool) -> Self {
        if interrupted {
            Self::Interrupted
        } else if failures > 0 {
            Self::PartialSuccess
        } else if groups == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }
}

/// Errors raised while building the run configuration.
///
/// All of these are detected before any candidate file is opened.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested block digest does not exist.
    #[error("unknown hash algorithm '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownDigest {
        /// Name as given by the user
        name: String,
        /// Closest known algorithm name, if any is reasonably close
        suggestion: Option<String>,
    },

    /// Block size must be at least one byte.
    #[error("block size must be greater than zero")]
    InvalidBlockSize,

    /// At least one worker thread is required.
    #[error("io_threads must be greater than zero")]
    InvalidThreadCount,

    /// The layered configuration could not be extracted.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "BD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Map an application error to the exit code it should produce.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<ConfigError>().is_some() {
        return ExitCode::ConfigError;
    }
    match err.downcast_ref::<crate::duplicates::FinderError>() {
        Some(crate::duplicates::FinderError::Interrupted) => ExitCode::Interrupted,
        Some(crate::duplicates::FinderError::Config(_)) => ExitCode::ConfigError,
        _ => ExitCode::GeneralError,
    }
}
