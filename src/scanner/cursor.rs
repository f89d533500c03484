//! Sequential block reader for one candidate file.
//!
//! # Overview
//!
//! A [`StreamCursor`] owns the open handle of one candidate and the hashes of
//! every block read from it so far. Blocks are read strictly in order and
//! never re-read; the comparator asks for the hash at the cursor position and
//! the cursor reads exactly as far as needed to produce it.
//!
//! Short final blocks are zero-padded to the block size, so two files of equal
//! length always produce positionally comparable hashes.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::digest::{BlockDigest, BlockHash};
use super::HashError;

/// Per-file read state inside one bucket run.
#[derive(Debug)]
pub struct StreamCursor {
    path: PathBuf,
    /// `None` once exhausted or released; the handle is closed on drop.
    file: Option<File>,
    block_size: usize,
    /// Reused for every block; freed with the handle.
    buffer: Vec<u8>,
    hashes: Vec<BlockHash>,
    position: usize,
    exhausted: bool,
    bytes_read: u64,
}

impl StreamCursor {
    /// Open `path` for block-wise reading.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened.
    pub fn open(path: &Path, block_size: usize) -> Result<Self, HashError> {
        debug_assert!(block_size > 0, "block size must be positive");
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            block_size,
            buffer: vec![0u8; block_size],
            hashes: Vec::new(),
            position: 0,
            exhausted: false,
            bytes_read: 0,
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index of the next unconsumed hash.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor past the current hash.
    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Every hash computed so far, in block order.
    #[must_use]
    pub fn hashes(&self) -> &[BlockHash] {
        &self.hashes
    }

    /// Number of non-empty blocks read from the file.
    #[must_use]
    pub fn blocks_read(&self) -> usize {
        self.hashes.len()
    }

    /// Number of payload bytes read (padding excluded).
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// True once a read hit end of file.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Hash of the block at `index`, reading forward if it is not known yet.
    ///
    /// Returns `Ok(None)` when the file ends before `index`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if a read fails. The cursor should be
    /// discarded afterwards.
    pub fn ensure_hash_at(
        &mut self,
        index: usize,
        digest: &dyn BlockDigest,
    ) -> Result<Option<&BlockHash>, HashError> {
        while self.hashes.len() <= index && !self.exhausted {
            self.read_next_block(digest)?;
        }
        Ok(self.hashes.get(index))
    }

    /// Hash at the current cursor position, reading forward if needed.
    ///
    /// # Errors
    ///
    /// See [`StreamCursor::ensure_hash_at`].
    pub fn current_hash(
        &mut self,
        digest: &dyn BlockDigest,
    ) -> Result<Option<&BlockHash>, HashError> {
        self.ensure_hash_at(self.position, digest)
    }

    /// Close the file handle. Already-computed hashes stay available.
    pub fn release(&mut self) {
        self.file = None;
        self.buffer = Vec::new();
    }

    fn read_next_block(&mut self, digest: &dyn BlockDigest) -> Result<(), HashError> {
        let Some(file) = self.file.as_mut() else {
            self.exhausted = true;
            return Ok(());
        };

        self.buffer.fill(0);
        let filled =
            fill_block(file, &mut self.buffer).map_err(|e| HashError::from_io(&self.path, e))?;

        if filled == 0 {
            log::trace!(
                "End of data after {} block(s): {}",
                self.hashes.len(),
                self.path.display()
            );
            self.exhausted = true;
            self.release();
            return Ok(());
        }

        // Bytes past `filled` were zeroed above.
        self.bytes_read += filled as u64;
        self.hashes.push(digest.hash_block(&self.buffer));
        Ok(())
    }
}

/// Read until `buffer` is full or the reader hits end of file.
fn fill_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
