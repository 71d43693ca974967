//! Filesystem operations for placing unique files at the destination.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::CopyError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Destination path for a source file: `destination_dir/<file name>`.
///
/// The source's directory structure is flattened away, so two unique files
/// with the same name map to the same destination path.
pub fn destination_for(source: &Path, destination_dir: &Path) -> Result<PathBuf, CopyError> {
    match source.file_name() {
        Some(name) => Ok(destination_dir.join(name)),
        None => Err(CopyError::NoFileName {
            path: source.to_path_buf(),
        }),
    }
}

/// Stream `src` into `dst`, replacing any existing file at `dst`.
///
/// Refuses to copy a file onto itself: opening `dst` for writing would
/// truncate the source before a single byte is read.
///
/// When `preserve_mtime` is set the source modification time is carried
/// over on a best-effort basis.
///
/// # Returns
/// Number of bytes copied
pub fn copy_file_with_metadata(
    src: &Path,
    dst: &Path,
    preserve_mtime: bool,
) -> Result<u64, CopyError> {
    if is_same_file(src, dst) {
        return Err(CopyError::SameFile {
            path: dst.to_path_buf(),
        });
    }

    let mut src_file = fs::File::open(src).map_err(|e| CopyError::Read {
        path: src.to_path_buf(),
        source: e,
    })?;

    let src_mtime = src_file.metadata().ok().and_then(|m| m.modified().ok());

    let mut dst_file = fs::File::create(dst).map_err(|e| CopyError::Write {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let bytes_copied = copy_stream(&mut src_file, &mut dst_file, src, dst)?;

    dst_file.sync_all().map_err(|e| CopyError::Write {
        path: dst.to_path_buf(),
        source: e,
    })?;
    drop(dst_file);

    if preserve_mtime {
        if let Some(mtime) = src_mtime {
            let _ = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime));
        }
    }

    Ok(bytes_copied)
}

/// Copy through a fixed buffer so a failed read blames `src` and a failed
/// write blames `dst`.
fn copy_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    src: &Path,
    dst: &Path,
) -> Result<u64, CopyError> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CopyError::Read {
                    path: src.to_path_buf(),
                    source: e,
                })
            }
        };
        writer.write_all(&buffer[..n]).map_err(|e| CopyError::Write {
            path: dst.to_path_buf(),
            source: e,
        })?;
        total += n as u64;
    }

    Ok(total)
}

/// True when both paths exist and name the same underlying file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    let (meta_a, meta_b) = match (fs::metadata(a), fs::metadata(b)) {
        (Ok(meta_a), Ok(meta_b)) => (meta_a, meta_b),
        _ => return false,
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino()
    }

    #[cfg(not(unix))]
    {
        let _ = (meta_a, meta_b);
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_copy_file_with_metadata() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");

        let mut file = fs::File::create(&src_file).expect("Failed to create source");
        file.write_all(b"test content").expect("Failed to write source");
        drop(file);

        let bytes = copy_file_with_metadata(&src_file, &dst_file, true).expect("Failed to copy");
        assert_eq!(bytes, 12);

        let content = fs::read_to_string(&dst_file).expect("Failed to read dest");
        assert_eq!(content, "test content");
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");
        fs::write(&src_file, b"new").unwrap();
        fs::write(&dst_file, b"much longer old content").unwrap();

        copy_file_with_metadata(&src_file, &dst_file, false).expect("Failed to copy");
        assert_eq!(fs::read(&dst_file).unwrap(), b"new");
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("old.txt");
        let dst_file = temp_dir.path().join("copy.txt");
        fs::write(&src_file, b"old").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3 * 24 * 3600);
        filetime::set_file_mtime(&src_file, filetime::FileTime::from_system_time(past)).unwrap();

        copy_file_with_metadata(&src_file, &dst_file, true).expect("Failed to copy");

        let src_mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&src_file).unwrap());
        let dst_mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&dst_file).unwrap());
        assert_eq!(src_mtime.unix_seconds(), dst_mtime.unix_seconds());
    }

    #[test]
    fn test_copy_into_directory_path_fails_as_write_error() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&src_file, b"data").unwrap();
        fs::create_dir(&blocker).unwrap();

        let result = copy_file_with_metadata(&src_file, &blocker, true);
        assert!(matches!(result, Err(CopyError::Write { .. })));
    }

    #[test]
    fn test_destination_for_flattens_tree() {
        let dst = destination_for(Path::new("/src/deep/nested/photo.jpg"), Path::new("/out"))
            .expect("Expected a file name");
        assert_eq!(dst, PathBuf::from("/out/photo.jpg"));

        assert!(destination_for(Path::new("/"), Path::new("/out")).is_err());
    }

    #[test]
    fn test_copy_onto_itself_is_refused_and_leaves_source_intact() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("keep.txt");
        fs::write(&file, b"precious data").unwrap();

        let same = temp_dir.path().join(".").join("keep.txt");
        let result = copy_file_with_metadata(&file, &same, true);

        assert!(matches!(result, Err(CopyError::SameFile { .. })));
        assert_eq!(fs::read(&file).unwrap(), b"precious data");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_onto_hard_link_is_refused() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("original.txt");
        let link = temp_dir.path().join("link.txt");
        fs::write(&file, b"linked").unwrap();
        fs::hard_link(&file, &link).unwrap();

        let result = copy_file_with_metadata(&file, &link, false);
        assert!(matches!(result, Err(CopyError::SameFile { .. })));
        assert_eq!(fs::read(&file).unwrap(), b"linked");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk read error"))
        }
    }

    #[test]
    fn test_write_failure_blames_destination() {
        let src = Path::new("/in/a.txt");
        let dst = Path::new("/out/a.txt");

        let result = copy_stream(&mut &b"payload"[..], &mut FailingWriter, src, dst);
        match result {
            Err(CopyError::Write { path, .. }) => assert_eq!(path, dst),
            other => panic!("Expected write error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_failure_blames_source() {
        let src = Path::new("/in/a.txt");
        let dst = Path::new("/out/a.txt");

        let mut sink = Vec::new();
        let result = copy_stream(&mut FailingReader, &mut sink, src, dst);
        match result {
            Err(CopyError::Read { path, .. }) => assert_eq!(path, src),
            other => panic!("Expected read error, got {:?}", other),
        }
    }
}
