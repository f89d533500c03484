use proptest::prelude::*;
use blockdupe::duplicates::{group_by_size, GroupComparator};
use blockdupe::scanner::{DigestAlgorithm, FileEntry, StreamCursor};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write each content to its own file, in order.
fn write_all(dir: &TempDir, contents: &[Vec<u8>]) -> Vec<PathBuf> {
    contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let path = dir.path().join(format!("f{:03}", i));
            fs::write(&path, content).unwrap();
            path
        })
        .collect()
}

/// Equal-length contents drawn from a tiny alphabet so that duplicates and
/// late divergence are both common.
fn bucket_contents() -> impl Strategy<Value = Vec<Vec<u8>>> {
    (0usize..40).prop_flat_map(|len| {
        prop::collection::vec(prop::collection::vec(0u8..2, len), 2..7)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_groups_are_exactly_the_equal_contents(
        contents in bucket_contents(),
        block_size in 1usize..16,
    ) {
        let dir = TempDir::new().unwrap();
        let paths = write_all(&dir, &contents);
        let size = contents[0].len() as u64;

        let comparator = GroupComparator::new(DigestAlgorithm::Sha256.build(), block_size);
        let outcome = comparator.compare(size, &paths);

        // Expected: equal contents, first occurrence order, groups of 2+.
        let mut expected: Vec<Vec<PathBuf>> = Vec::new();
        let mut seen: Vec<&Vec<u8>> = Vec::new();
        for (content, path) in contents.iter().zip(&paths) {
            match seen.iter().position(|c| *c == content) {
                Some(i) => expected[i].push(path.clone()),
                None => {
                    seen.push(content);
                    expected.push(vec![path.clone()]);
                }
            }
        }
        expected.retain(|g| g.len() >= 2);

        let actual: Vec<Vec<PathBuf>> = outcome.groups.iter().map(|g| g.files.clone()).collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_compare_is_idempotent(contents in bucket_contents(), block_size in 1usize..16) {
        let dir = TempDir::new().unwrap();
        let paths = write_all(&dir, &contents);
        let size = contents[0].len() as u64;

        let comparator = GroupComparator::new(DigestAlgorithm::Crc32.build(), block_size);
        let first = comparator.compare(size, &paths);
        let second = comparator.compare(size, &paths);

        prop_assert_eq!(first.groups, second.groups);
        prop_assert_eq!(first.blocks_read, second.blocks_read);
        prop_assert_eq!(first.rounds, second.rounds);
    }

    #[test]
    fn test_digest_choice_does_not_change_groups(
        contents in bucket_contents(),
        block_size in 1usize..16,
    ) {
        let dir = TempDir::new().unwrap();
        let paths = write_all(&dir, &contents);
        let size = contents[0].len() as u64;

        let results: Vec<_> = DigestAlgorithm::ALL
            .iter()
            .map(|a| GroupComparator::new(a.build(), block_size).compare(size, &paths))
            .collect();

        for pair in results.windows(2) {
            prop_assert_eq!(&pair[0].groups, &pair[1].groups);
            prop_assert_eq!(pair[0].blocks_read, pair[1].blocks_read);
        }
    }

    #[test]
    fn test_bytes_read_never_exceed_content(
        contents in bucket_contents(),
        block_size in 1usize..16,
    ) {
        let dir = TempDir::new().unwrap();
        let paths = write_all(&dir, &contents);
        let size = contents[0].len() as u64;

        let outcome = GroupComparator::new(DigestAlgorithm::Blake3.build(), block_size)
            .compare(size, &paths);

        prop_assert!(outcome.bytes_read <= size * paths.len() as u64);
        let max_blocks = size.div_ceil(block_size as u64) * paths.len() as u64;
        prop_assert!(outcome.blocks_read <= max_blocks);
    }

    #[test]
    fn test_cursor_block_count(content in prop::collection::vec(any::<u8>(), 0..200), block_size in 1usize..64) {
        let dir = TempDir::new().unwrap();
        let path = write_all(&dir, &[content.clone()]).remove(0);
        let digest = DigestAlgorithm::Md5.build();

        let mut cursor = StreamCursor::open(&path, block_size).unwrap();
        while cursor.current_hash(digest.as_ref()).unwrap().is_some() {
            cursor.advance();
        }

        prop_assert!(cursor.is_exhausted());
        prop_assert_eq!(cursor.blocks_read(), content.len().div_ceil(block_size));
        prop_assert_eq!(cursor.bytes_read(), content.len() as u64);
    }

    #[test]
    fn test_group_by_size_invariants(sizes in prop::collection::vec(0u64..50, 0..60)) {
        let entries: Vec<FileEntry> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| FileEntry::new(PathBuf::from(format!("/fake/path/{}", i)), size))
            .collect();

        let (buckets, stats) = group_by_size(entries.clone());

        for files in buckets.values() {
            prop_assert!(files.len() >= 2);
        }
        prop_assert_eq!(stats.total_files, entries.len());
        let sum_files: usize = buckets.values().map(Vec::len).sum();
        prop_assert_eq!(stats.potential_duplicates, sum_files);
        prop_assert_eq!(stats.eliminated_unique, entries.len() - sum_files);
    }
}
