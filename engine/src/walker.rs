//! Source tree enumeration.
//!
//! Walks a root directory depth-first with entries sorted by file name, so
//! the same tree always yields files in the same order. Only regular files
//! (and links to them) are produced; directories are descended into and
//! special files are skipped. Unreadable directories are reported as items
//! in the sequence and the walk continues with their siblings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;
use walkdir::WalkDir;

use crate::error::WalkError;
use crate::model::FileEntry;

/// Enumerates regular files under a root directory.
///
/// Each call to [`Walker::iter`] starts a fresh walk.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    excluded: Option<PathBuf>,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Walker {
            root: root.into(),
            excluded: None,
        }
    }

    /// Prune `dir` from the walk when it lies inside the root.
    ///
    /// Used to keep a destination nested in the source tree from feeding the
    /// run's own copies back into it.
    pub fn excluding(mut self, dir: &Path) -> Self {
        self.excluded = match (fs::canonicalize(&self.root), fs::canonicalize(dir)) {
            (Ok(root), Ok(dir)) => match dir.strip_prefix(&root) {
                Ok(rel) if !rel.as_os_str().is_empty() => Some(self.root.join(rel)),
                _ => None,
            },
            _ => None,
        };
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iter(&self) -> WalkIter {
        WalkIter {
            root: self.root.clone(),
            excluded: self.excluded.clone(),
            inner: WalkDir::new(&self.root)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Walker {
    type Item = Result<FileEntry, WalkError>;
    type IntoIter = WalkIter;

    fn into_iter(self) -> WalkIter {
        self.iter()
    }
}

/// Convenience for `Walker::new(root).iter()`.
pub fn enumerate_files(root: impl Into<PathBuf>) -> WalkIter {
    Walker::new(root).iter()
}

/// Lazy iterator over the files of one walk.
pub struct WalkIter {
    root: PathBuf,
    excluded: Option<PathBuf>,
    inner: walkdir::IntoIter,
}

impl Iterator for WalkIter {
    type Item = Result<FileEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(walk_error(&self.root, e))),
            };

            let file_type = entry.file_type();
            let path = entry.path();

            if file_type.is_dir() {
                if self.excluded.as_deref() == Some(path) {
                    trace!(path = %path.display(), "Pruning excluded directory");
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if file_type.is_file() {
                return Some(match entry.metadata() {
                    Ok(metadata) => Ok(FileEntry {
                        path: entry.into_path(),
                        size: Some(metadata.len()),
                    }),
                    Err(e) => Err(walk_error(&self.root, e)),
                });
            }

            if file_type.is_symlink() {
                match fs::metadata(path) {
                    Ok(target) if target.is_file() => {
                        return Some(Ok(FileEntry {
                            size: Some(target.len()),
                            path: entry.into_path(),
                        }));
                    }
                    Ok(_) => {
                        trace!(path = %path.display(), "Skipping link to non-file");
                        continue;
                    }
                    // Dangling link: let the hasher report the failed open.
                    Err(_) => {
                        return Some(Ok(FileEntry {
                            path: entry.into_path(),
                            size: None,
                        }));
                    }
                }
            }

            trace!(path = %path.display(), "Skipping special file");
        }
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> WalkError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, message));
    WalkError { path, source }
}
