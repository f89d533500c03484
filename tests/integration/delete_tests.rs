use blockdupe::actions::{delete_duplicates, DeleteConfig};
use blockdupe::duplicates::DuplicateFinder;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_then_delete_keeps_one_copy_per_group() {
    let dir = tempdir().unwrap();
    for name in ["a1", "a2", "a3"] {
        fs::write(dir.path().join(name), b"group a payload").unwrap();
    }
    for name in ["b1", "b2"] {
        fs::write(dir.path().join(name), b"group b").unwrap();
    }
    fs::write(dir.path().join("unique"), b"nothing like it").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&roots)
        .unwrap();
    assert_eq!(groups.len(), 2);

    let result = delete_duplicates(&groups, &DeleteConfig::permanent(), None);

    assert!(result.all_succeeded());
    assert_eq!(result.success_count(), 3);
    assert_eq!(result.bytes_freed, summary.reclaimable_space);
    assert!(dir.path().join("a1").exists());
    assert!(!dir.path().join("a2").exists());
    assert!(!dir.path().join("a3").exists());
    assert!(dir.path().join("b1").exists());
    assert!(!dir.path().join("b2").exists());
    assert!(dir.path().join("unique").exists());

    // Nothing left to find.
    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&roots)
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_delete_skips_file_modified_after_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_keep"), b"12345").unwrap();
    fs::write(dir.path().join("b_changed"), b"12345").unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(groups.len(), 1);

    fs::write(dir.path().join("b_changed"), b"1234567").unwrap();

    let result = delete_duplicates(&groups, &DeleteConfig::permanent(), None);

    assert_eq!(result.success_count(), 0);
    assert_eq!(result.failure_count(), 1);
    assert!(result.failures[0].1.contains("modified"));
    assert!(dir.path().join("b_changed").exists());
}
