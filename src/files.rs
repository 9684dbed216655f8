//! The served directory and path containment.
//!
//! Every file route resolves its filename through [`ServedDirectory::resolve`],
//! which only hands out paths that stay underneath the canonical root.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("path {0:?} escapes the served directory")]
    OutsideRoot(String),
    #[error("cannot resolve path: {0}")]
    Io(#[from] io::Error),
}

/// Root directory that file routes read from and write to.
#[derive(Debug, Clone)]
pub struct ServedDirectory {
    root: PathBuf,
}

impl ServedDirectory {
    /// Canonicalizes `path`; fails if it does not exist or is not a directory.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let root = std::fs::canonicalize(path)
            .with_context(|| format!("served directory {} is not accessible", path.display()))?;

        if !root.is_dir() {
            anyhow::bail!("served directory {} is not a directory", root.display());
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a request filename to a path inside the root.
    ///
    /// `.` and `..` are applied lexically, then the deepest existing ancestor
    /// is canonicalized so symlinks pointing outside the root are caught as
    /// well, dangling ones included. The target itself does not need to exist.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ResolveError> {
        let joined = normalize_lexically(&self.root.join(strip_root(name)));
        let resolved = canonicalize_existing_prefix(&joined, MAX_SYMLINK_HOPS)?;

        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(ResolveError::OutsideRoot(name.to_string()))
        }
    }
}

/// Dangling symlinks followed before giving up, like the kernel's ELOOP limit.
const MAX_SYMLINK_HOPS: usize = 40;

/// Drops any leading `/` or prefix so the name always lands under the root.
fn strip_root(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Applies `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Canonicalizes the longest existing ancestor of `path` and re-appends the
/// components that do not exist yet.
///
/// A missing component that is itself a dangling symlink is replaced by its
/// target, so writing through it cannot land outside the checked path.
fn canonicalize_existing_prefix(path: &Path, hops: usize) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        match std::fs::canonicalize(existing) {
            Ok(mut canonical) => {
                canonical.extend(missing.iter().rev());
                return Ok(canonical);
            }
            Err(e) if is_missing(&e) => {
                let is_symlink = std::fs::symlink_metadata(existing)
                    .is_ok_and(|meta| meta.file_type().is_symlink());

                if is_symlink {
                    if hops == 0 {
                        return Err(io::Error::other("too many levels of symbolic links"));
                    }
                    let target = std::fs::read_link(existing)?;
                    let target = match existing.parent() {
                        Some(parent) => parent.join(target),
                        None => target,
                    };
                    let mut resolved =
                        canonicalize_existing_prefix(&normalize_lexically(&target), hops - 1)?;
                    resolved.extend(missing.iter().rev());
                    return Ok(resolved);
                }

                let Some(file_name) = existing.file_name() else {
                    return Err(e);
                };
                missing.push(file_name.to_owned());
                existing = match existing.parent() {
                    Some(parent) => parent,
                    None => return Err(e),
                };
            }
            Err(e) => return Err(e),
        }
    }
}

/// A path that does not exist, including one routed through a regular file.
pub(crate) fn is_missing(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
