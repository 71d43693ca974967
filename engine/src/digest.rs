//! Content digests.
//!
//! This module provides:
//! - The 128-bit `ContentDigest` used as the dedup key
//! - Two digest algorithms (MD5, BLAKE3 truncated to 128 bits)
//! - Streaming, chunked digest computation for files and readers

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HashError;

/// Default read buffer for hashing (64 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Width of a content digest in bytes.
pub const DIGEST_LEN: usize = 16;

/// Supported digest algorithms. Both produce a 128-bit digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// MD5
    #[default]
    Md5,
    /// BLAKE3, first 128 bits of the output
    Blake3,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!(
                "Invalid hash algorithm '{}'. Must be 'md5' or 'blake3'",
                other
            )),
        }
    }
}

/// A 128-bit digest of a file's full byte content.
///
/// This is a duplicate-detection key, not a security primitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        ContentDigest(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Parse a 32-character hex string. Either case is accepted.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != DIGEST_LEN * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(ContentDigest(bytes))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Incremental hasher for one of the supported algorithms.
enum StreamHasher {
    Md5(md5::Context),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => StreamHasher::Md5(md5::Context::new()),
            DigestAlgorithm::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            StreamHasher::Md5(context) => context.consume(data),
            StreamHasher::Blake3(hasher) => {
                hasher.update(data);
            }
        }
    }

    fn finalize(self) -> ContentDigest {
        match self {
            StreamHasher::Md5(context) => ContentDigest(context.compute().0),
            StreamHasher::Blake3(hasher) => {
                let mut bytes = [0u8; DIGEST_LEN];
                bytes.copy_from_slice(&hasher.finalize().as_bytes()[..DIGEST_LEN]);
                ContentDigest(bytes)
            }
        }
    }
}

/// Digest everything a reader yields, `chunk_size` bytes at a time.
pub fn digest_reader<R: Read>(
    reader: &mut R,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> io::Result<ContentDigest> {
    let mut hasher = StreamHasher::new(algorithm);
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hasher.finalize())
}

/// Compute the content digest of a file by streaming it.
pub fn digest_file(
    path: &Path,
    algorithm: DigestAlgorithm,
    chunk_size: usize,
) -> Result<ContentDigest, HashError> {
    let mut file = File::open(path).map_err(|e| HashError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;

    digest_reader(&mut file, algorithm, chunk_size).map_err(|e| HashError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    #[test]
    fn md5_of_known_inputs() {
        let empty = digest_reader(&mut &b""[..], DigestAlgorithm::Md5, 8).unwrap();
        assert_eq!(empty.to_hex(), EMPTY_MD5);

        let hello = digest_reader(&mut &b"hello"[..], DigestAlgorithm::Md5, 8).unwrap();
        assert_eq!(hello.to_hex(), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn blake3_is_truncated_output() {
        let digest = digest_reader(&mut &b"hello"[..], DigestAlgorithm::Blake3, 8).unwrap();
        let full = blake3::hash(b"hello");
        assert_eq!(digest.as_bytes()[..], full.as_bytes()[..DIGEST_LEN]);
    }

    #[test]
    fn chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let one = digest_reader(&mut &data[..], DigestAlgorithm::Md5, 1).unwrap();
        let odd = digest_reader(&mut &data[..], DigestAlgorithm::Md5, 7).unwrap();
        let big = digest_reader(&mut &data[..], DigestAlgorithm::Md5, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(one, odd);
        assert_eq!(odd, big);
    }

    #[test]
    fn identical_files_digest_equal_regardless_of_name_and_depth() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("Failed to create nested dirs");

        let first = temp_dir.path().join("one.txt");
        let second = nested.join("completely-different.bin");
        fs::write(&first, b"same bytes").expect("Failed to write first");
        fs::write(&second, b"same bytes").expect("Failed to write second");

        for algorithm in [DigestAlgorithm::Md5, DigestAlgorithm::Blake3] {
            let a = digest_file(&first, algorithm, DEFAULT_CHUNK_SIZE).expect("Failed to hash");
            let b = digest_file(&second, algorithm, DEFAULT_CHUNK_SIZE).expect("Failed to hash");
            assert_eq!(a, b);
        }
    }

    #[test]
    fn empty_file_hashes_to_empty_digest() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("empty.bin");
        fs::File::create(&path).expect("Failed to create file");

        let digest = digest_file(&path, DigestAlgorithm::Md5, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(digest.to_hex(), EMPTY_MD5);
    }

    #[test]
    fn missing_file_is_open_error() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("vanished.txt");

        let result = digest_file(&path, DigestAlgorithm::Md5, DEFAULT_CHUNK_SIZE);
        assert!(matches!(result, Err(HashError::Open { .. })));
    }

    #[test]
    fn hex_parsing_is_case_insensitive() {
        let lower = ContentDigest::from_hex("5d41402abc4b2a76b9719d911017c592").unwrap();
        let upper = ContentDigest::from_hex("5D41402ABC4B2A76B9719D911017C592").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.to_hex(), "5d41402abc4b2a76b9719d911017c592");

        assert!(ContentDigest::from_hex("abc").is_none());
        assert!(ContentDigest::from_hex("zz41402abc4b2a76b9719d911017c592").is_none());
    }

    #[test]
    fn hex_parsing_rejects_sign_characters() {
        assert!(ContentDigest::from_hex("+d41402abc4b2a76b9719d911017c592").is_none());
        assert!(ContentDigest::from_hex("+a+b+c+d+e+f+0+1+2+3+4+5+6+7+8+9").is_none());
        assert!(ContentDigest::from_hex("-d41402abc4b2a76b9719d911017c592").is_none());
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!("MD5".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Md5));
        assert_eq!("blake3".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Blake3));
        assert!("sha1".parse::<DigestAlgorithm>().is_err());
    }
}
