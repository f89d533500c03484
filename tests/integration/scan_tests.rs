use blockdupe::duplicates::{DuplicateFinder, FinderConfig};
use blockdupe::scanner::{DigestAlgorithm, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: PathBuf, content: &[u8]) -> PathBuf {
    File::create(&path).unwrap().write_all(content).unwrap();
    fs::canonicalize(path).unwrap()
}

fn finder_with_level(level: usize) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_walker_config(WalkerConfig {
        level,
        ..Default::default()
    }))
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.blocks_read, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.txt"), b"content a");
    write(dir.path().join("b.txt"), b"content b");
    write(dir.path().join("c.txt"), b"content c");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_content, 3);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path().join("a.txt"), b"duplicate");
    let b = write(dir.path().join("b.txt"), b"duplicate");
    write(dir.path().join("c.txt"), b"unique");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files, vec![a, b]);
    assert_eq!(groups[0].size, 9);
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, 9);
}

#[test]
fn test_scan_level_limits_depth() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    let deeper = sub.join("deeper");
    fs::create_dir_all(&deeper).unwrap();

    write(dir.path().join("top.txt"), b"same bytes");
    write(sub.join("mid.txt"), b"same bytes");
    write(deeper.join("low.txt"), b"same bytes");

    let roots = vec![dir.path().to_path_buf()];

    let (groups, summary) = finder_with_level(0).find_duplicates(&roots).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);

    let (groups, _) = finder_with_level(1).find_duplicates(&roots).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);

    let (groups, _) = finder_with_level(2).find_duplicates(&roots).unwrap();
    assert_eq!(groups[0].len(), 3);
}

#[test]
fn test_scan_mask_filter() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a.JPG"), b"pixels");
    write(dir.path().join("b.jpg"), b"pixels");
    write(dir.path().join("c.txt"), b"pixels");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        masks: vec!["*.jpg".to_string()],
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert!(groups[0].files.iter().all(|p| p
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))));
}

#[test]
fn test_scan_exclude_prunes_subtree() {
    let dir = tempdir().unwrap();
    let skipped = dir.path().join("skip");
    let nested = skipped.join("nested");
    fs::create_dir_all(&nested).unwrap();

    write(dir.path().join("keep.bin"), b"0123456789");
    write(skipped.join("a.bin"), b"0123456789");
    write(nested.join("b.bin"), b"0123456789");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        level: 5,
        exclude: vec![skipped],
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 1);
    assert!(groups.is_empty());
}

#[test]
fn test_scan_min_size() {
    let dir = tempdir().unwrap();
    write(dir.path().join("small1"), b"ab");
    write(dir.path().join("small2"), b"ab");
    write(dir.path().join("big1"), b"abcdefgh");
    write(dir.path().join("big2"), b"abcdefgh");

    let config = FinderConfig::default().with_walker_config(WalkerConfig {
        min_size: 5,
        ..Default::default()
    });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 8);
}

#[test]
fn test_scan_three_way_split_in_one_bucket() {
    let dir = tempdir().unwrap();
    let mut left = vec![b'x'; 3000];
    let a = write(dir.path().join("a"), &left);
    let b = write(dir.path().join("b"), &left);
    left[2500] = b'y';
    let c = write(dir.path().join("c"), &left);
    let d = write(dir.path().join("d"), &left);
    left[10] = b'z';
    write(dir.path().join("e"), &left);

    let config = FinderConfig::default().with_block_size(512);
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 2);
    // Same size: ordered by first path.
    assert_eq!(groups[0].files, vec![a, b]);
    assert_eq!(groups[1].files, vec![c, d]);
    assert_eq!(summary.eliminated_by_content, 1);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_scan_groups_sorted_largest_first() {
    let dir = tempdir().unwrap();
    write(dir.path().join("s1"), b"tiny");
    write(dir.path().join("s2"), b"tiny");
    write(dir.path().join("l1"), &[7u8; 5000]);
    write(dir.path().join("l2"), &[7u8; 5000]);
    write(dir.path().join("m1"), &[1u8; 100]);
    write(dir.path().join("m2"), &[1u8; 100]);

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    let sizes: Vec<u64> = groups.iter().map(|g| g.size).collect();
    assert_eq!(sizes, vec![5000, 100, 4]);
}

#[test]
fn test_scan_same_groups_for_every_digest() {
    let dir = tempdir().unwrap();
    let mut content = vec![0u8; 4096];
    for (i, byte) in content.iter_mut().enumerate() {
        *byte = (i % 251) as u8;
    }
    write(dir.path().join("one"), &content);
    write(dir.path().join("two"), &content);
    content[4095] ^= 0xff;
    write(dir.path().join("three"), &content);

    let roots = vec![dir.path().to_path_buf()];
    let mut results = Vec::new();
    for algorithm in DigestAlgorithm::ALL {
        let config = FinderConfig::default()
            .with_algorithm(algorithm)
            .with_block_size(1000);
        let (groups, summary) = DuplicateFinder::new(config).find_duplicates(&roots).unwrap();
        assert_eq!(summary.blocks_read, 15, "{algorithm}");
        results.push(groups);
    }

    assert_eq!(results[0].len(), 1);
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_scan_single_thread_matches_parallel() {
    let dir = tempdir().unwrap();
    for i in 0..6u8 {
        let len = if i < 4 { 64 } else { 65 };
        let content = vec![i % 2; len];
        write(dir.path().join(format!("f{i}")), &content);
    }
    let roots = vec![dir.path().to_path_buf()];

    let (serial, _) = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
        .find_duplicates(&roots)
        .unwrap();
    let (parallel, _) = DuplicateFinder::new(FinderConfig::default().with_io_threads(8))
        .find_duplicates(&roots)
        .unwrap();

    assert_eq!(serial.len(), 2);
    assert_eq!(serial, parallel);
}
