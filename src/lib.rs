//! blockdupe - block-wise duplicate file finder
//!
//! Files of equal size are compared side by side, one block at a time, and a
//! file leaves the comparison as soon as one of its blocks matches no other
//! file. Only the files that survive to their last byte are reported as
//! duplicates.
//!
//! The library is split into:
//!
//! - [`scanner`]: directory walking, block digests and per-file block cursors
//! - [`duplicates`]: size bucketing, the group comparator and the finder
//! - [`output`] and [`actions`]: printing and deleting confirmed groups

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{
    delete_duplicates, BatchDeleteResult, DeleteConfig, DeleteProgressCallback,
};
use crate::cli::{Cli, Commands, ConfigArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, ScanSummary};
use crate::error::ExitCode;
use crate::logging::{init_logging, LogOptions};
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::DigestAlgorithm;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for an invalid configuration, a missing scan root, an
/// interrupted scan or a failure to write the results.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });
    if cli.no_color {
        yansi::disable();
    }

    match cli.command {
        Commands::Scan(ref args) => run_scan(&cli, args),
        Commands::Digests => run_digests(),
        Commands::Config(ref args) => run_config(&cli, args),
    }
}

fn run_scan(cli: &Cli, args: &ScanArgs) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref(), Some(args))?;
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler();
    let progress = (!cli.quiet).then(|| Arc::new(Progress::new(false)));
    let mut finder_config = config
        .finder_config(args.follow_symlinks)?
        .with_shutdown_flag(handler.flag());
    if let Some(progress) = &progress {
        finder_config = finder_config.with_progress_callback(progress.clone());
    }

    let finder = DuplicateFinder::new(finder_config);
    let (groups, summary) = finder.find_duplicates(&args.paths)?;

    // Delete before reporting so the exit code covers both phases.
    let deletion = if args.delete && !groups.is_empty() {
        let delete_config = DeleteConfig {
            permanent: config.permanent,
        };
        if delete_config.permanent {
            log::warn!("Deleting duplicates permanently");
        }
        let callback = progress
            .as_deref()
            .map(|p| p as &dyn DeleteProgressCallback);
        Some(delete_duplicates(&groups, &delete_config, callback))
    } else {
        None
    };
    let exit_code = scan_exit_code(&groups, &summary, deletion.as_ref());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => {
            let text = TextOutput::new(&groups, &summary);
            text.write_groups(&mut out)
                .context("Failed to write results")?;
            if !cli.quiet {
                eprintln!("{}", text.summary_line());
            }
        }
        OutputFormat::Json => {
            let mut json = JsonOutput::new(&groups, &summary, exit_code);
            if let Some(result) = &deletion {
                json = json.with_deletion(result);
            }
            json.write_to(&mut out)
                .context("Failed to write JSON output")?;
        }
        OutputFormat::Csv => {
            CsvOutput::new(&groups)
                .write_to(&mut out)
                .context("Failed to write CSV output")?;
        }
    }
    out.flush().context("Failed to flush output")?;

    if let Some(result) = &deletion {
        if !cli.quiet {
            eprintln!("{}", result.summary());
        }
    }

    Ok(exit_code)
}

/// Exit code for a finished scan, counting failed deletions as failures.
fn scan_exit_code(
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
    deletion: Option<&BatchDeleteResult>,
) -> ExitCode {
    let failures =
        summary.failure_count() + deletion.map_or(0, BatchDeleteResult::failure_count);
    ExitCode::for_outcome(groups.len(), failures, summary.interrupted)
}

fn run_digests() -> anyhow::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for algorithm in DigestAlgorithm::ALL {
        writeln!(
            out,
            "{:<8} {:>2} bytes  {}",
            algorithm.name(),
            algorithm.output_len(),
            algorithm.description()
        )?;
    }
    Ok(ExitCode::Success)
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> anyhow::Result<ExitCode> {
    // `--init` may name a file that doesn't exist yet.
    let source = cli
        .config
        .as_deref()
        .filter(|path| !args.init || path.is_file());
    let config = Config::load::<()>(source, None)?;

    if args.init {
        let path = match cli.config.clone().or_else(Config::default_path) {
            Some(path) => path,
            None => anyhow::bail!("No configuration directory available on this platform"),
        };
        config.save(&path)?;
        if !cli.quiet {
            eprintln!("Wrote {}", path.display());
        }
    } else {
        print!("{}", config.to_toml()?);
    }

    Ok(ExitCode::Success)
}
