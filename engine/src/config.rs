//! Run configuration and preflight validation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::digest::{DigestAlgorithm, DEFAULT_CHUNK_SIZE};
use crate::error::ConfigError;

/// Settings for one dedup run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root of the tree to scan
    pub source: PathBuf,

    /// Flat directory that receives unique files
    pub destination: PathBuf,

    /// Digest used as the dedup key
    pub algorithm: DigestAlgorithm,

    /// Read buffer size for hashing
    pub chunk_size: usize,

    /// Re-hash each copy and compare against the source digest
    pub verify_after_copy: bool,

    /// Carry the source modification time over to the copy
    pub preserve_mtime: bool,
}

impl RunConfig {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        RunConfig {
            source: source.into(),
            destination: destination.into(),
            algorithm: DigestAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            verify_after_copy: false,
            preserve_mtime: true,
        }
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_verify_after_copy(mut self, verify: bool) -> Self {
        self.verify_after_copy = verify;
        self
    }

    pub fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    /// Check that both directories exist and are distinct.
    ///
    /// The engine refuses to start a run that fails here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }

        require_dir(&self.source, true)?;
        require_dir(&self.destination, false)?;

        if same_directory(&self.source, &self.destination) {
            return Err(ConfigError::SameDirectory {
                path: self.source.clone(),
            });
        }

        Ok(())
    }
}

fn require_dir(path: &Path, is_source: bool) -> Result<(), ConfigError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) if is_source => Err(ConfigError::SourceNotDirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => Err(ConfigError::DestinationNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound && is_source => {
            Err(ConfigError::SourceNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ConfigError::DestinationNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(ConfigError::Inaccessible {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Case-insensitive textual comparison, then canonical comparison.
fn same_directory(a: &Path, b: &Path) -> bool {
    let text_a = a.to_string_lossy().trim_end_matches(['/', '\\']).to_lowercase();
    let text_b = b.to_string_lossy().trim_end_matches(['/', '\\']).to_lowercase();
    if text_a == text_b {
        return true;
    }

    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src dir");
        fs::create_dir(&dst).expect("Failed to create dst dir");
        (temp_dir, src, dst)
    }

    #[test]
    fn defaults() {
        let config = RunConfig::new("/in", "/out");
        assert_eq!(config.algorithm, DigestAlgorithm::Md5);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!config.verify_after_copy);
        assert!(config.preserve_mtime);
    }

    #[test]
    fn valid_directories_pass() {
        let (_temp, src, dst) = dirs();
        RunConfig::new(&src, &dst).validate().expect("Expected valid config");
    }

    #[test]
    fn missing_source_is_rejected() {
        let (temp, _src, dst) = dirs();
        let result = RunConfig::new(temp.path().join("nope"), &dst).validate();
        assert!(matches!(result, Err(ConfigError::SourceNotFound { .. })));
    }

    #[test]
    fn missing_destination_is_rejected() {
        let (temp, src, _dst) = dirs();
        let result = RunConfig::new(&src, temp.path().join("nope")).validate();
        assert!(matches!(result, Err(ConfigError::DestinationNotFound { .. })));
    }

    #[test]
    fn file_as_source_is_rejected() {
        let (temp, _src, dst) = dirs();
        let file = temp.path().join("file.txt");
        fs::write(&file, b"x").expect("Failed to write file");

        let result = RunConfig::new(&file, &dst).validate();
        assert!(matches!(result, Err(ConfigError::SourceNotDirectory { .. })));
    }

    #[test]
    fn same_directory_is_rejected() {
        let (_temp, src, _dst) = dirs();
        let result = RunConfig::new(&src, &src).validate();
        assert!(matches!(result, Err(ConfigError::SameDirectory { .. })));

        let with_dot = src.join(".");
        let result = RunConfig::new(&src, &with_dot).validate();
        assert!(matches!(result, Err(ConfigError::SameDirectory { .. })));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let (_temp, src, dst) = dirs();
        let result = RunConfig::new(&src, &dst).with_chunk_size(0).validate();
        assert!(matches!(result, Err(ConfigError::InvalidChunkSize)));
    }
}
