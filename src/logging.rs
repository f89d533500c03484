//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! Level priority:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. `--quiet` (errors only) or `-v` / `-vv` (debug / trace)
//! 3. Default: info
//!
//! Debug builds print a timestamp and the module path; release builds print
//! `LEVEL message` only.

use std::env;
use std::io::Write;

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

/// Options that shape the log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Verbosity count (0 = info, 1 = debug, 2+ = trace)
    pub verbose: u8,
    /// Errors only
    pub quiet: bool,
    /// Never emit ANSI styles
    pub no_color: bool,
}

/// Initialize the global logger.
///
/// Later calls are ignored, so tests may call this repeatedly.
///
/// ```rust,no_run
/// use blockdupe::logging::{init_logging, LogOptions};
///
/// init_logging(LogOptions { verbose: 1, ..Default::default() });
/// log::debug!("visible at -v");
/// ```
pub fn init_logging(options: LogOptions) {
    let mut builder = Builder::new();

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(options.verbose, options.quiet));
    }

    if options.no_color {
        builder.write_style(WriteStyle::Never);
    }
    configure_format(&mut builder, options.verbose);

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at {} (from RUST_LOG: {})",
            log::max_level(),
            from_env
        );
    }
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                timestamp,
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}",
                timestamp,
                record.level(),
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{style}{:<5}{style:#} {}",
            record.level(),
            record.args()
        )
    });
}
