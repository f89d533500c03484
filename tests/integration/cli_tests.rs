use blockdupe::cli::Cli;
use blockdupe::error::{exit_code_for, ExitCode};
use blockdupe::run_app;
use clap::Parser;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Parse `args` with an empty config file so the user's own file is never read.
fn parse(config_dir: &TempDir, args: &[&str]) -> Cli {
    let config = config_dir.path().join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut argv = vec!["blockdupe", "--quiet", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn populate(dir: &Path) {
    fs::write(dir.join("a.txt"), b"same content").unwrap();
    fs::write(dir.join("b.txt"), b"same content").unwrap();
    fs::write(dir.join("c.txt"), b"other stuff!").unwrap();
}

#[test]
fn test_run_scan_with_duplicates() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();
    populate(dir.path());

    let cli = parse(&config_dir, &["scan", dir.path().to_str().unwrap()]);
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);
}

#[test]
fn test_run_scan_without_duplicates() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), b"alone").unwrap();

    let cli = parse(
        &config_dir,
        &["scan", dir.path().to_str().unwrap(), "--output", "json"],
    );
    assert_eq!(run_app(cli).unwrap(), ExitCode::NoDuplicates);
}

#[test]
fn test_run_scan_unknown_digest_is_config_error() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();

    let cli = parse(
        &config_dir,
        &["scan", dir.path().to_str().unwrap(), "--hash", "sha265"],
    );
    let err = run_app(cli).unwrap_err();

    assert_eq!(exit_code_for(&err), ExitCode::ConfigError);
    assert!(err.to_string().contains("did you mean 'sha256'"));
}

#[test]
fn test_run_scan_zero_block_size_is_config_error() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();

    let cli = parse(
        &config_dir,
        &["scan", dir.path().to_str().unwrap(), "--block-size", "0"],
    );
    let err = run_app(cli).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::ConfigError);
}

#[test]
fn test_run_scan_missing_root_is_general_error() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let cli = parse(&config_dir, &["scan", missing.to_str().unwrap()]);
    let err = run_app(cli).unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
}

#[test]
fn test_run_scan_with_delete() {
    let config_dir = tempdir().unwrap();
    let dir = tempdir().unwrap();
    populate(dir.path());

    let cli = parse(
        &config_dir,
        &[
            "scan",
            dir.path().to_str().unwrap(),
            "--output",
            "csv",
            "--delete",
            "--permanent",
        ],
    );
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);

    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
}

#[test]
fn test_run_digests() {
    let config_dir = tempdir().unwrap();
    let cli = parse(&config_dir, &["digests"]);
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);
}

#[test]
fn test_run_config_init_writes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh").join("config.toml");

    let cli = Cli::try_parse_from([
        "blockdupe",
        "--quiet",
        "--config",
        path.to_str().unwrap(),
        "config",
        "--init",
    ])
    .unwrap();
    assert_eq!(run_app(cli).unwrap(), ExitCode::Success);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("block_size = 1024"));
    assert!(written.contains("hash = \"crc32\""));
}
