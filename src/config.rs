//! Engine configuration.

use std::path::PathBuf;

/// Default audit log file, resolved against the starting directory.
pub const DEFAULT_LOG_FILE: &str = "filelog.txt";

/// Bounds applied while decompressing untrusted archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Maximum number of entries in one archive.
    pub max_entries: usize,
    /// Maximum total uncompressed bytes written by one extraction.
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
            max_total_bytes: 4 * 1024 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Starting working directory; the process directory when unset.
    pub base_dir: Option<PathBuf>,
    /// Append-only audit log location.
    pub log_file: PathBuf,
    pub limits: ExtractLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            limits: ExtractLimits::default(),
        }
    }
}
