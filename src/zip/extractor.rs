use flate2::read::DeflateDecoder;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Decode an entry into memory, refusing to produce more than `limit`
    /// bytes and verifying the stored CRC-32.
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry, limit: u64) -> Result<Vec<u8>> {
        if entry.uncompressed_size > limit {
            bail!(
                "'{}' declares {} bytes, over the {} byte limit",
                entry.file_name,
                entry.uncompressed_size,
                limit
            );
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // The declared size is untrusted: cap the inflated stream too
                let mut out = Vec::with_capacity(entry.uncompressed_size.min(1 << 20) as usize);
                DeflateDecoder::new(raw.as_slice())
                    .take(limit.saturating_add(1))
                    .read_to_end(&mut out)?;
                if out.len() as u64 > limit {
                    bail!("'{}' inflates past the {} byte limit", entry.file_name, limit);
                }
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method {} for '{}' (only STORED and DEFLATE)",
                    method,
                    entry.file_name
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "'{}' decoded to {} bytes, expected {}",
                entry.file_name,
                data.len(),
                entry.uncompressed_size
            );
        }

        let mut crc = flate2::Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC-32 mismatch for '{}'", entry.file_name);
        }

        Ok(data)
    }

    /// Write a file entry to `output_path`, creating parent directories.
    /// Returns the number of bytes written.
    pub async fn extract_to_file(
        &self,
        entry: &ZipFileEntry,
        output_path: &Path,
        limit: u64,
    ) -> Result<u64> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = self.extract_to_memory(entry, limit).await?;

        let mut file = fs::File::create(output_path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        Ok(data.len() as u64)
    }
}

/// Map an entry name onto a relative path, rejecting names that would
/// escape the extraction root.
pub fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        bail!("Entry '{}' has an absolute path", name);
    }

    let mut path = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Entry '{}' escapes the destination directory", name);
            }
        }
    }

    if path.as_os_str().is_empty() {
        bail!("Entry '{}' has an empty path", name);
    }
    Ok(path)
}
