//! Pluggable block digests.
//!
//! # Overview
//!
//! Every block read from a candidate file is reduced to a [`BlockHash`] by a
//! [`BlockDigest`]. The digest is chosen once per run through
//! [`DigestAlgorithm`] and shared by all bucket workers, so implementations
//! are stateless and `Send + Sync`.
//!
//! | Algorithm | Kind                  | Output   |
//! |-----------|-----------------------|----------|
//! | `crc32`   | fast checksum         | 4 bytes  |
//! | `md5`     | cryptographic digest  | 16 bytes |
//! | `sha256`  | cryptographic digest  | 32 bytes |
//! | `blake3`  | cryptographic digest  | 32 bytes |
//!
//! # Example
//!
//! ```
//! use blockdupe::scanner::digest::DigestAlgorithm;
//!
//! let algorithm: DigestAlgorithm = "md5".parse().unwrap();
//! let digest = algorithm.build();
//! let hash = digest.hash_block(&[0u8; 1024]);
//! assert_eq!(hash.len(), 16);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::ConfigError;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Hash value of a single block.
///
/// The width depends on the algorithm that produced it; hashes from
/// different algorithms are never compared within one run.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash(Box<[u8]>);

impl BlockHash {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Width of the hash in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-width hash (never produced by the built-in digests).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hexadecimal form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A stateless hash over one fixed-size block.
///
/// Callers pass blocks of exactly the configured block size; a short final
/// read is zero-padded before it reaches the digest.
pub trait BlockDigest: Send + Sync {
    /// The algorithm this digest implements.
    fn algorithm(&self) -> DigestAlgorithm;

    /// Hash one block.
    fn hash_block(&self, block: &[u8]) -> BlockHash;
}

/// CRC32 (IEEE) checksum. Fast, collision-tolerant.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Digest;

impl BlockDigest for Crc32Digest {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Crc32
    }

    fn hash_block(&self, block: &[u8]) -> BlockHash {
        BlockHash::from_bytes(&crc32fast::hash(block).to_be_bytes())
    }
}

/// MD5 digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Md5Digest;

impl BlockDigest for Md5Digest {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Md5
    }

    fn hash_block(&self, block: &[u8]) -> BlockHash {
        BlockHash::from_bytes(&Md5::digest(block))
    }
}

/// SHA-256 digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digest;

impl BlockDigest for Sha256Digest {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Sha256
    }

    fn hash_block(&self, block: &[u8]) -> BlockHash {
        BlockHash::from_bytes(&Sha256::digest(block))
    }
}

/// BLAKE3 digest.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Digest;

impl BlockDigest for Blake3Digest {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::Blake3
    }

    fn hash_block(&self, block: &[u8]) -> BlockHash {
        BlockHash::from_bytes(blake3::hash(block).as_bytes())
    }
}

/// Selectable block digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// CRC32 checksum (default)
    #[default]
    Crc32,
    /// MD5 digest
    Md5,
    /// SHA-256 digest
    Sha256,
    /// BLAKE3 digest
    Blake3,
}

impl DigestAlgorithm {
    /// All algorithms, in display order.
    pub const ALL: [DigestAlgorithm; 4] = [Self::Crc32, Self::Md5, Self::Sha256, Self::Blake3];

    /// Canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// One-line description for `blockdupe digests`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Crc32 => "fast 32-bit checksum (default)",
            Self::Md5 => "128-bit cryptographic digest",
            Self::Sha256 => "256-bit cryptographic digest",
            Self::Blake3 => "256-bit cryptographic digest, fastest of the strong hashes",
        }
    }

    /// Width of the hashes this algorithm produces, in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Crc32 => 4,
            Self::Md5 => 16,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Whether the digest offers cryptographic collision resistance.
    #[must_use]
    pub fn is_cryptographic(self) -> bool {
        !matches!(self, Self::Crc32)
    }

    /// Construct the digest implementation.
    #[must_use]
    pub fn build(self) -> Arc<dyn BlockDigest> {
        match self {
            Self::Crc32 => Arc::new(Crc32Digest),
            Self::Md5 => Arc::new(Md5Digest),
            Self::Sha256 => Arc::new(Sha256Digest),
            Self::Blake3 => Arc::new(Blake3Digest),
        }
    }

    /// Closest known name to `name`, if any is similar enough.
    fn suggest(name: &str) -> Option<String> {
        Self::ALL
            .iter()
            .map(|a| (a.name(), strsim::jaro_winkler(name, a.name())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n.to_string())
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "crc32" => Ok(Self::Crc32),
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(ConfigError::UnknownDigest {
                name: s.to_string(),
                suggestion: Self::suggest(&normalized),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("crc32".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Crc32));
        assert_eq!("MD5".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Md5));
        assert_eq!("sha-256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert_eq!(" blake3 ".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake3));
    }

    #[test]
    fn test_parse_unknown_with_suggestion() {
        let err = "md6".parse::<DigestAlgorithm>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownDigest {
                name: "md6".to_string(),
                suggestion: Some("md5".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_unknown_without_suggestion() {
        let err = "whirlpool".parse::<DigestAlgorithm>().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownDigest { suggestion: None, .. }
        ));
    }

    #[test]
    fn test_output_widths() {
        let block = vec![7u8; 64];
        for algorithm in DigestAlgorithm::ALL {
            let digest = algorithm.build();
            assert_eq!(digest.algorithm(), algorithm);
            assert_eq!(digest.hash_block(&block).len(), algorithm.output_len());
        }
    }

    #[test]
    fn test_deterministic() {
        for algorithm in DigestAlgorithm::ALL {
            let digest = algorithm.build();
            let a = digest.hash_block(b"same block content");
            let b = digest.hash_block(b"same block content");
            assert_eq!(a, b, "{} is not deterministic", algorithm);
        }
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(Crc32Digest.hash_block(b"123456789").to_hex(), "cbf43926");
        assert_eq!(
            Md5Digest.hash_block(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            Sha256Digest.hash_block(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_padding_changes_hash() {
        // A zero-padded block must not collide with its unpadded prefix.
        let digest = Md5Digest;
        assert_ne!(digest.hash_block(b"ab"), digest.hash_block(b"ab\0\0"));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for algorithm in DigestAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<DigestAlgorithm>(), Ok(algorithm));
        }
    }

    #[test]
    fn test_is_cryptographic() {
        assert!(!DigestAlgorithm::Crc32.is_cryptographic());
        assert!(DigestAlgorithm::Md5.is_cryptographic());
    }

    #[test]
    fn test_block_hash_debug_and_hex() {
        let hash = BlockHash::from_bytes(&[0xde, 0xad]);
        assert_eq!(hash.to_hex(), "dead");
        assert_eq!(format!("{:?}", hash), "BlockHash(dead)");
        assert!(!hash.is_empty());
    }
}
