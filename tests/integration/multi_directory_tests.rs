use blockdupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use blockdupe::scanner::WalkerConfig;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let photos = tempdir().unwrap();
    let backup = tempdir().unwrap();
    let original = photos.path().join("img.raw");
    let copy = backup.path().join("img-copy.raw");
    fs::write(&original, b"raw sensor data").unwrap();
    fs::write(&copy, b"raw sensor data").unwrap();

    let roots = vec![photos.path().to_path_buf(), backup.path().to_path_buf()];
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&roots)
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    // Supply order follows root order.
    assert_eq!(groups[0].files[0], fs::canonicalize(&original).unwrap());
    assert_eq!(groups[0].files[1], fs::canonicalize(&copy).unwrap());
}

#[test]
fn test_overlapping_roots_count_files_once() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("only.txt"), b"single file").unwrap();

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        level: 1,
        ..Default::default()
    });
    let roots = vec![dir.path().to_path_buf(), sub.clone()];
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&roots)
        .unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(groups.is_empty());
}

#[test]
fn test_missing_root_is_rejected() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let result = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf(), missing.clone()]);

    match result {
        Err(FinderError::PathNotFound(path)) => assert_eq!(path, missing),
        other => panic!("Expected PathNotFound, got {:?}", other.map(|r| r.0)),
    }
}

#[test]
fn test_file_root_is_rejected() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    fs::write(&file, b"x").unwrap();

    let result = DuplicateFinder::with_defaults().find_duplicates(&[file]);
    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[test]
fn test_no_roots_is_rejected() {
    let result = DuplicateFinder::with_defaults().find_duplicates(&[]);
    assert!(matches!(result, Err(FinderError::NoRoots)));
}
