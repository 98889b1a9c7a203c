//! Existence and type preconditions shared by file and directory operations.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{OpError, OpResult};

/// Metadata of `path`, or `NotFound` when nothing is there.
pub(crate) async fn require(operation: &'static str, path: &Path) -> OpResult<Metadata> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(OpError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(OpError::io(operation, path, err)),
    }
}

pub(crate) async fn require_file(operation: &'static str, path: &Path) -> OpResult<Metadata> {
    let metadata = require(operation, path).await?;
    if metadata.is_dir() {
        return Err(OpError::io(
            operation,
            path,
            io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
        ));
    }
    Ok(metadata)
}

pub(crate) async fn require_dir(operation: &'static str, path: &Path) -> OpResult<Metadata> {
    let metadata = require(operation, path).await?;
    if !metadata.is_dir() {
        return Err(OpError::io(
            operation,
            path,
            io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }
    Ok(metadata)
}

/// `AlreadyExists` if anything, including a dangling symlink, occupies `path`.
pub(crate) async fn ensure_absent(operation: &'static str, path: &Path) -> OpResult<()> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Err(OpError::AlreadyExists {
            path: path.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(OpError::io(operation, path, err)),
    }
}

/// Whether `a` and `b` name the same existing filesystem object, hard
/// links included.
pub(crate) async fn same_target(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (tokio::fs::metadata(a).await, tokio::fs::metadata(b).await) {
        (Ok(left), Ok(right)) => same_object(a, &left, b, &right).await,
        _ => false,
    }
}

#[cfg(unix)]
async fn same_object(_a: &Path, left: &Metadata, _b: &Path, right: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    left.dev() == right.dev() && left.ino() == right.ino()
}

#[cfg(not(unix))]
async fn same_object(a: &Path, _left: &Metadata, b: &Path, _right: &Metadata) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Canonical form of a path that may not exist yet: its parent is
/// canonicalized and the final component appended.
pub(crate) async fn canonical_destination(path: &Path) -> Option<PathBuf> {
    if let Ok(path) = tokio::fs::canonicalize(path).await {
        return Some(path);
    }
    let parent = path.parent()?;
    let name = path.file_name()?;
    let parent = tokio::fs::canonicalize(parent).await.ok()?;
    Some(parent.join(name))
}

/// Map a platform error, turning a lost race into the matching taxonomy tag.
pub(crate) fn classify(operation: &'static str, path: &Path, err: io::Error) -> OpError {
    match err.kind() {
        io::ErrorKind::NotFound => OpError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::AlreadyExists => OpError::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => OpError::io(operation, path, err),
    }
}
