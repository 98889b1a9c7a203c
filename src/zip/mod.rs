//! ZIP container reading and writing.
//!
//! - [`structures`]: ZIP format records (EOCD, file headers) and their byte layout
//! - [`parser`]: locating and decoding the Central Directory from a [`ReadAt`](crate::io::ReadAt) source
//! - [`extractor`]: decoding entry data (STORED, DEFLATE) with CRC and size checks
//! - [`writer`]: producing DEFLATE archives
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - Reading ZIP64 archives; writing is limited to the classic 4 GiB / 65535 entry format
//! - STORED and DEFLATE methods, UTF-8 entry names, unix permission attributes
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::{ZipExtractor, sanitize_entry_name};
pub use parser::ZipParser;
pub use structures::*;
pub use writer::ZipWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LocalFileReader;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn fixed_time() -> anyhow::Result<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2023, 11, 2)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .ok_or_else(|| anyhow::anyhow!("bad fixture date"))
    }

    #[tokio::test]
    async fn written_archive_is_readable() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.zip");
        let body = b"hello hello hello hello hello".repeat(20);

        let file = tokio::fs::File::create(&path).await?;
        let mut writer = ZipWriter::new(file);
        writer.add_file("a.txt", &body, fixed_time()?, Some(0o600)).await?;
        writer.add_directory("empty", fixed_time()?, None).await?;
        writer.add_file("sub/b.txt", b"", fixed_time()?, None).await?;
        writer.finish().await?;

        let extractor = ZipExtractor::new(Arc::new(LocalFileReader::open(&path)?));
        let entries = extractor.list_files().await?;
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["a.txt", "empty/", "sub/b.txt"]);

        assert_eq!(entries[0].compression_method, CompressionMethod::Deflate);
        assert!(entries[0].compressed_size < body.len() as u64);
        assert_eq!(entries[0].unix_mode(), Some(0o600));
        assert_eq!(entries[0].mod_date(), (2023, 11, 2));
        assert!(entries[1].is_directory);

        assert_eq!(extractor.extract_to_memory(&entries[0], u64::MAX).await?, body);
        assert!(extractor.extract_to_memory(&entries[2], u64::MAX).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn extraction_enforces_size_limit() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("big.zip");

        let file = tokio::fs::File::create(&path).await?;
        let mut writer = ZipWriter::new(file);
        writer.add_file("zeros", &vec![0u8; 64 * 1024], fixed_time()?, None).await?;
        writer.finish().await?;

        let extractor = ZipExtractor::new(Arc::new(LocalFileReader::open(&path)?));
        let entries = extractor.list_files().await?;
        assert!(extractor.extract_to_memory(&entries[0], 1024).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn garbage_is_not_an_archive() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("junk.zip");
        std::fs::write(&path, b"definitely not a zip archive, just some text")?;

        let parser = ZipParser::new(Arc::new(LocalFileReader::open(&path)?));
        assert!(parser.list_files().await.is_err());
        Ok(())
    }
}
