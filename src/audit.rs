//! Append-only audit trail of every attempted operation.
//!
//! Entries go to an [`AuditSink`] as one text line each and are mirrored in
//! memory for display:
//!
//! ```text
//! 2024-05-01 10:22:03 - Created file - File/Directory: /srv/data/test.txt
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, SubsecRound};
use tokio::io::AsyncWriteExt;
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One immutable record of an attempted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    timestamp: NaiveDateTime,
    action: String,
    target: Option<String>,
}

impl AuditEntry {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.action
        )?;
        if let Some(target) = &self.target {
            write!(f, " - File/Directory: {target}")?;
        }
        Ok(())
    }
}

/// Durable destination for audit lines. Implementations only ever append.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, line: &str) -> Result<()>;
}

/// Appends to a text file, creating it on first use.
pub struct FileAuditSink {
    path: PathBuf,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn append(&self, line: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

pub struct AuditLog {
    sink: Box<dyn AuditSink>,
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new(sink: Box<dyn AuditSink>) -> Self {
        Self {
            sink,
            entries: Vec::new(),
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileAuditSink::new(path)))
    }

    /// Stamp, persist and mirror one entry.
    ///
    /// A sink failure is logged and the entry is still kept in memory; it
    /// never changes the outcome of the operation being recorded.
    pub async fn record(&mut self, action: impl Into<String>, target: Option<&Path>) -> &AuditEntry {
        let mut timestamp = Local::now().naive_local().trunc_subsecs(0);
        // Wall clock may step backwards; the trail must not
        if let Some(last) = self.entries.last() {
            timestamp = timestamp.max(last.timestamp);
        }

        let entry = AuditEntry {
            timestamp,
            action: action.into(),
            target: target.map(|p| p.display().to_string()),
        };

        if let Err(err) = self.sink.append(&format!("{entry}\n")).await {
            warn!(error = %format!("{err:#}"), action = %entry.action, "failed to persist audit entry");
        }

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Entries recorded by this log, oldest first.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }
}
