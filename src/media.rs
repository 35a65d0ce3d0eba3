//! Directory views over the media root.
//!
//! The resizer never touches `std::fs` directly. It asks a [`ReadDirectory`]
//! to resolve and probe paths and a [`WriteDirectory`] to create cache
//! directories. [`MediaDirectory`] implements both over the local
//! filesystem.
//!
//! ## Path forms
//!
//! - **Relative** paths are strings relative to the media root, e.g.
//!   `catalog/product/shoe.jpg`. Leading separators are ignored, so
//!   `/catalog/product/shoe.jpg` means the same thing.
//! - **Absolute** paths are `PathBuf`s under the canonicalized root.
//!
//! Resolution is lexical first: `.` and `..` are folded without touching the
//! disk. The deepest part of the result that already exists is then
//! canonicalized, so a symlink inside the root that points elsewhere does not
//! count as inside. Anything that lands outside the root either way is
//! rejected with [`MediaError::OutsideRoot`]. Probes (`is_file`,
//! `is_directory`) answer `false` for such paths instead of erroring.

use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Media root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Path escapes the media root: {0}")]
    OutsideRoot(String),
}

/// Read-side view of the media root.
pub trait ReadDirectory: Sync {
    /// Whether `path` (relative, or absolute under the root) is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` (relative, or absolute under the root) is a directory.
    fn is_directory(&self, path: &Path) -> bool;

    /// Resolve a root-relative path to an absolute one.
    fn absolute_path(&self, path: &str) -> Result<PathBuf, MediaError>;

    /// Express an absolute path relative to the root, joined with the
    /// platform separator and without a leading one. Paths outside the root
    /// come back unchanged.
    fn relative_path(&self, path: &Path) -> String;
}

/// Write-side view of the media root.
pub trait WriteDirectory: Sync {
    /// Create a directory and any missing parents. Succeeds when it already
    /// exists.
    fn create(&self, path: &Path) -> Result<(), MediaError>;
}

pub(crate) fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

/// Fold `.` and `..` components without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Filesystem-backed media directory rooted at a fixed base path.
#[derive(Debug, Clone)]
pub struct MediaDirectory {
    root: PathBuf,
}

impl MediaDirectory {
    /// Open a media root. The root must exist; it is canonicalized so that
    /// symlinked roots and relative roots compare consistently.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, MediaError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(MediaError::RootNotFound(root.to_path_buf()));
        }
        Ok(Self {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a probe path to an absolute path under the root, or `None` if it
    /// falls outside.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let candidate = if path.starts_with(&self.root) {
            normalize(path)
        } else {
            let relative = path.to_string_lossy();
            normalize(&self.root.join(relative.trim_start_matches(is_separator)))
        };
        (candidate.starts_with(&self.root) && self.contains_on_disk(&candidate))
            .then_some(candidate)
    }

    /// Whether the nearest existing ancestor of `path` (or `path` itself)
    /// really lives under the root once symlinks are followed.
    fn contains_on_disk(&self, path: &Path) -> bool {
        path.ancestors()
            .find_map(|ancestor| ancestor.canonicalize().ok())
            .is_some_and(|real| real.starts_with(&self.root))
    }
}

impl ReadDirectory for MediaDirectory {
    fn is_file(&self, path: &Path) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.resolve(path).is_some_and(|p| p.is_dir())
    }

    fn absolute_path(&self, path: &str) -> Result<PathBuf, MediaError> {
        self.resolve(Path::new(path))
            .ok_or_else(|| MediaError::OutsideRoot(path.to_string()))
    }

    fn relative_path(&self, path: &Path) -> String {
        match normalize(path).strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join(&MAIN_SEPARATOR.to_string()),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}

impl WriteDirectory for MediaDirectory {
    fn create(&self, path: &Path) -> Result<(), MediaError> {
        let target = self
            .resolve(path)
            .ok_or_else(|| MediaError::OutsideRoot(path.to_string_lossy().to_string()))?;
        std::fs::create_dir_all(target)?;
        Ok(())
    }
}
