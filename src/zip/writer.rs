//! Streaming ZIP writer.
//!
//! Each entry is deflated in memory so its CRC-32 and sizes are known before
//! the Local File Header goes out; no data descriptors are emitted. The
//! Central Directory and EOCD are written by [`ZipWriter::finish`].

use chrono::NaiveDateTime;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use anyhow::{Context, Result, bail};

use super::structures::*;

/// Entry count at which the EOCD would have to switch to ZIP64.
const MAX_ENTRIES: usize = 0xFFFF;

/// Unix file type bits stored alongside permissions in external attributes.
const S_IFREG: u32 = 0o100000;
const S_IFDIR: u32 = 0o040000;
/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;

pub struct ZipWriter<W: AsyncWrite + Unpin> {
    out: W,
    offset: u64,
    entries: Vec<ZipFileEntry>,
}

impl<W: AsyncWrite + Unpin> ZipWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            offset: 0,
            entries: Vec::new(),
        }
    }

    /// Deflate `data` and append it under `name`.
    pub async fn add_file(
        &mut self,
        name: &str,
        data: &[u8],
        modified: NaiveDateTime,
        mode: Option<u32>,
    ) -> Result<&ZipFileEntry> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let mut crc = flate2::Crc::new();
        crc.update(data);

        let mode = mode.unwrap_or(0o644) & 0o777;
        let entry = self.entry(
            name.to_string(),
            CompressionMethod::Deflate,
            crc.sum(),
            compressed.len() as u64,
            data.len() as u64,
            modified,
            (S_IFREG | mode) << 16,
        )?;
        self.push(entry, &compressed).await
    }

    /// Append an empty directory entry; a trailing `/` is added if missing.
    pub async fn add_directory(
        &mut self,
        name: &str,
        modified: NaiveDateTime,
        mode: Option<u32>,
    ) -> Result<&ZipFileEntry> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };
        let mode = mode.unwrap_or(0o755) & 0o777;
        let entry = self.entry(
            name,
            CompressionMethod::Stored,
            0,
            0,
            0,
            modified,
            ((S_IFDIR | mode) << 16) | DOS_DIRECTORY,
        )?;
        self.push(entry, &[]).await
    }

    #[allow(clippy::too_many_arguments)]
    fn entry(
        &self,
        file_name: String,
        compression_method: CompressionMethod,
        crc32: u32,
        compressed_size: u64,
        uncompressed_size: u64,
        modified: NaiveDateTime,
        external_attrs: u32,
    ) -> Result<ZipFileEntry> {
        if self.entries.len() >= MAX_ENTRIES {
            bail!("More than {} entries would need ZIP64", MAX_ENTRIES - 1);
        }
        if file_name.is_empty() {
            bail!("Entry name must not be empty");
        }
        let (last_mod_time, last_mod_date) = dos_datetime(&modified);
        let is_directory = file_name.ends_with('/');
        Ok(ZipFileEntry {
            file_name,
            compression_method,
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset: self.offset,
            last_mod_time,
            last_mod_date,
            version_made_by: VERSION_MADE_BY,
            external_attrs,
            is_directory,
        })
    }

    async fn push(&mut self, entry: ZipFileEntry, data: &[u8]) -> Result<&ZipFileEntry> {
        let mut header = Vec::with_capacity(LFH_SIZE + entry.file_name.len());
        entry
            .write_local_header(&mut header)
            .with_context(|| format!("Local File Header for '{}'", entry.file_name))?;

        self.out.write_all(&header).await?;
        self.out.write_all(data).await?;
        self.offset += (header.len() + data.len()) as u64;

        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Write the Central Directory and EOCD, flush, and hand back the sink.
    pub async fn finish(mut self) -> Result<W> {
        let cd_offset = self.offset;
        let mut central = Vec::new();
        for entry in &self.entries {
            entry.write_central_header(&mut central)?;
        }

        let cd_offset = u32::try_from(cd_offset).context("Archive exceeds 4 GiB, ZIP64 required")?;
        let cd_size = u32::try_from(central.len()).context("Central Directory exceeds 4 GiB")?;
        EndOfCentralDirectory::new(self.entries.len() as u16, cd_size, cd_offset)
            .write_to(&mut central)?;

        self.out.write_all(&central).await?;
        self.out.flush().await?;
        Ok(self.out)
    }
}
