//! Recursive ZIP packing and unpacking of file trees.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ExtractLimits;
use crate::error::{OpError, OpResult};
use crate::io::LocalFileReader;
use crate::ops::checks::same_target;
use crate::zip::{ZipExtractor, ZipFileEntry, ZipWriter, sanitize_entry_name};

/// One file or empty directory scheduled for compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated path relative to the archive root.
    pub entry_name: String,
    pub source_path: PathBuf,
    pub is_directory: bool,
}

/// Totals reported by compress and decompress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub uncompressed_bytes: u64,
    pub compressed_bytes: u64,
}

/// Plan the entries for `source`.
///
/// A single file becomes one entry named after its base name. A directory is
/// walked depth-first in file-name order; files and empty directories become
/// entries relative to `source`. `skip` (the archive being written) is left
/// out if it lives inside the tree.
pub fn plan_entries(source: &Path, skip: Option<&Path>) -> OpResult<Vec<ArchiveEntry>> {
    let metadata = std::fs::metadata(source).map_err(|e| not_found_or_io("compress.stat", source, e))?;

    if !metadata.is_dir() {
        let entry_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| OpError::io("compress.name", source, std::io::Error::other("source has no file name")))?;
        return Ok(vec![ArchiveEntry {
            entry_name,
            source_path: source.to_path_buf(),
            is_directory: false,
        }]);
    }

    let mut entries = Vec::new();
    for item in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let item = item.map_err(|e| OpError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        let path = item.path();
        if skip.is_some_and(|skip| skip == path) {
            continue;
        }

        let relative = path.strip_prefix(source).map_err(|_| {
            OpError::io("compress.relative", path, std::io::Error::other("entry outside source tree"))
        })?;
        let entry_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let file_type = item.file_type();
        if file_type.is_dir() {
            let mut children = std::fs::read_dir(path).map_err(|e| OpError::io("compress.read_dir", path, e))?;
            if children.next().is_none() {
                entries.push(ArchiveEntry {
                    entry_name,
                    source_path: path.to_path_buf(),
                    is_directory: true,
                });
            }
        } else if file_type.is_file() || std::fs::metadata(path).is_ok_and(|m| m.is_file()) {
            // symlinks are stored as the file they point at
            entries.push(ArchiveEntry {
                entry_name,
                source_path: path.to_path_buf(),
                is_directory: false,
            });
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
        }
    }

    Ok(entries)
}

/// Pack `source` into a new DEFLATE archive at `destination`.
///
/// A failure part-way leaves the partial archive on disk.
pub async fn compress(source: &Path, destination: &Path) -> OpResult<ArchiveSummary> {
    // Fail on a missing source before creating the destination
    tokio::fs::metadata(source)
        .await
        .map_err(|e| not_found_or_io("compress.stat", source, e))?;

    // Creating the destination truncates it, so it must not be the source
    if same_target(source, destination).await {
        return Err(OpError::SameSource {
            path: destination.to_path_buf(),
        });
    }
    let root = tokio::fs::canonicalize(source)
        .await
        .map_err(|e| OpError::io("compress.canonicalize", source, e))?;

    let file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| OpError::io("compress.create", destination, e))?;
    let skip = tokio::fs::canonicalize(destination).await.ok();
    let planned = plan_entries(&root, skip.as_deref())?;

    let mut writer = ZipWriter::new(file);
    let mut summary = ArchiveSummary::default();

    for entry in &planned {
        let metadata = tokio::fs::metadata(&entry.source_path)
            .await
            .map_err(|e| OpError::io("compress.stat", &entry.source_path, e))?;
        let modified = modified_time(&metadata);
        let mode = unix_mode(&metadata);

        let added = if entry.is_directory {
            writer.add_directory(&entry.entry_name, modified, mode).await
        } else {
            let data = tokio::fs::read(&entry.source_path)
                .await
                .map_err(|e| OpError::io("compress.read", &entry.source_path, e))?;
            writer.add_file(&entry.entry_name, &data, modified, mode).await
        };
        let written = added.map_err(|e| OpError::archive(destination, e))?;

        summary.entries += 1;
        summary.uncompressed_bytes += written.uncompressed_size;
        summary.compressed_bytes += written.compressed_size;
        debug!(entry = %entry.entry_name, size = written.uncompressed_size, "added archive entry");
    }

    writer
        .finish()
        .await
        .map_err(|e| OpError::archive(destination, e))?;
    Ok(summary)
}

/// Unpack every entry of `archive` under `destination`, creating
/// intermediate directories. Later entries with the same name overwrite
/// earlier ones.
///
/// All entry names and the declared sizes are validated against `limits`
/// before anything is written.
pub async fn decompress(archive: &Path, destination: &Path, limits: &ExtractLimits) -> OpResult<ArchiveSummary> {
    let extractor = open(archive).await?;
    let entries = extractor
        .list_files()
        .await
        .map_err(|e| OpError::archive(archive, e))?;

    if entries.len() > limits.max_entries {
        return Err(OpError::archive(
            archive,
            anyhow::anyhow!("{} entries exceed the limit of {}", entries.len(), limits.max_entries),
        ));
    }

    let declared: u64 = entries.iter().map(|e| e.uncompressed_size).fold(0, u64::saturating_add);
    if declared > limits.max_total_bytes {
        return Err(OpError::archive(
            archive,
            anyhow::anyhow!("{declared} uncompressed bytes exceed the limit of {}", limits.max_total_bytes),
        ));
    }

    let targets = entries
        .iter()
        .map(|entry| sanitize_entry_name(&entry.file_name).map(|relative| destination.join(relative)))
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(|e| OpError::archive(archive, e))?;

    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|e| OpError::io("decompress.create_dir", destination, e))?;

    let mut summary = ArchiveSummary::default();
    let mut budget = limits.max_total_bytes;
    for (entry, target) in entries.iter().zip(&targets) {
        if entry.is_directory {
            tokio::fs::create_dir_all(target)
                .await
                .map_err(|e| OpError::io("decompress.create_dir", target, e))?;
        } else {
            let written = extractor
                .extract_to_file(entry, target, budget)
                .await
                .map_err(|e| OpError::archive(archive, e))?;
            budget -= written;
            summary.uncompressed_bytes += written;
            restore_mode(entry, target).await?;
        }
        summary.entries += 1;
        summary.compressed_bytes += entry.compressed_size;
        debug!(entry = %entry.file_name, target = %target.display(), "extracted archive entry");
    }

    Ok(summary)
}

/// Central Directory listing of `archive`.
pub async fn list(archive: &Path) -> OpResult<Vec<ZipFileEntry>> {
    open(archive)
        .await?
        .list_files()
        .await
        .map_err(|e| OpError::archive(archive, e))
}

async fn open(archive: &Path) -> OpResult<ZipExtractor<LocalFileReader>> {
    let metadata = tokio::fs::metadata(archive)
        .await
        .map_err(|e| not_found_or_io("decompress.stat", archive, e))?;
    if metadata.is_dir() {
        return Err(OpError::archive(archive, anyhow::anyhow!("is a directory, not a ZIP file")));
    }
    let reader = LocalFileReader::open(archive).map_err(|e| OpError::io("decompress.open", archive, e))?;
    Ok(ZipExtractor::new(Arc::new(reader)))
}

fn not_found_or_io(operation: &'static str, path: &Path, err: std::io::Error) -> OpError {
    if err.kind() == std::io::ErrorKind::NotFound {
        OpError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        OpError::io(operation, path, err)
    }
}

fn modified_time(metadata: &std::fs::Metadata) -> NaiveDateTime {
    let modified = metadata.modified().unwrap_or_else(|_| SystemTime::now());
    DateTime::<Local>::from(modified).naive_local()
}

#[cfg(unix)]
fn unix_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
async fn restore_mode(entry: &ZipFileEntry, target: &Path) -> OpResult<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = entry.unix_mode() {
        tokio::fs::set_permissions(target, std::fs::Permissions::from_mode(mode))
            .await
            .map_err(|e| OpError::io("decompress.set_permissions", target, e))?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn restore_mode(_entry: &ZipFileEntry, _target: &Path) -> OpResult<()> {
    Ok(())
}
