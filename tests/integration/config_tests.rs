use blockdupe::cli::{Cli, Commands};
use blockdupe::config::Config;
use blockdupe::duplicates::DuplicateFinder;
use blockdupe::error::ConfigError;
use blockdupe::scanner::DigestAlgorithm;
use clap::Parser;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_file_drives_scan() {
    let config_dir = tempdir().unwrap();
    let data = tempdir().unwrap();
    let sub = data.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(data.path().join("a.jpg"), b"jpeg bytes").unwrap();
    fs::write(sub.join("b.jpg"), b"jpeg bytes").unwrap();
    fs::write(sub.join("c.txt"), b"jpeg bytes").unwrap();

    let path = config_dir.path().join("config.toml");
    fs::write(
        &path,
        "level = 1\nmasks = [\"jpg\"]\nhash = \"blake3\"\nblock_size = 4\n",
    )
    .unwrap();

    let config = Config::load::<()>(Some(&path), None).unwrap();
    let finder_config = config.finder_config(false).unwrap();
    assert_eq!(finder_config.algorithm, DigestAlgorithm::Blake3);
    assert_eq!(finder_config.block_size, 4);

    let (groups, summary) = DuplicateFinder::new(finder_config)
        .find_duplicates(&[data.path().to_path_buf()])
        .unwrap();
    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    // 10 bytes in 4-byte blocks, two files.
    assert_eq!(summary.blocks_read, 6);
}

#[test]
fn test_cli_flags_override_config_file() {
    let config_dir = tempdir().unwrap();
    let path = config_dir.path().join("config.toml");
    fs::write(
        &path,
        "block_size = 4096\nhash = \"md5\"\nlevel = 2\nio_threads = 2\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "blockdupe",
        "scan",
        "/data",
        "--block-size",
        "64KiB",
        "--hash",
        "sha256",
    ])
    .unwrap();
    let Commands::Scan(args) = cli.command else {
        panic!("expected scan");
    };

    let config = Config::load(Some(&path), Some(&args)).unwrap();
    assert_eq!(config.block_size, 65_536);
    assert_eq!(config.hash, "sha256");
    // Untouched by the command line.
    assert_eq!(config.level, 2);
    assert_eq!(config.io_threads, 2);
    assert!(config.masks.is_empty());
}

#[test]
fn test_unset_cli_flags_do_not_reset_file_values() {
    let config_dir = tempdir().unwrap();
    let path = config_dir.path().join("config.toml");
    fs::write(&path, "masks = [\"png\"]\nexclude = [\"/tmp/x\"]\nmin_size = 10\n").unwrap();

    let cli = Cli::try_parse_from(["blockdupe", "scan", "/data"]).unwrap();
    let Commands::Scan(args) = cli.command else {
        panic!("expected scan");
    };

    let config = Config::load(Some(&path), Some(&args)).unwrap();
    assert_eq!(config.masks, vec!["png"]);
    assert_eq!(config.exclude.len(), 1);
    assert_eq!(config.min_size, 10);
    assert!(!config.permanent);
}

#[test]
fn test_invalid_values_rejected_before_scan() {
    let config_dir = tempdir().unwrap();
    let path = config_dir.path().join("config.toml");
    fs::write(&path, "io_threads = 0\n").unwrap();

    let config = Config::load::<()>(Some(&path), None).unwrap();
    assert_eq!(
        config.finder_config(false).unwrap_err(),
        ConfigError::InvalidThreadCount
    );
}

#[test]
fn test_malformed_file_is_invalid() {
    let config_dir = tempdir().unwrap();
    let path = config_dir.path().join("config.toml");
    fs::write(&path, "block_size = [this is not toml").unwrap();

    let err = Config::load::<()>(Some(&path), None).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}
