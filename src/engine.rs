//! Front door of the crate: runs operations and archive jobs, keeps the
//! working-directory context and records every attempt in the audit log.

use std::path::Path;

use tracing::{info, warn};

use crate::archive;
use crate::audit::{AuditEntry, AuditLog};
use crate::config::{EngineConfig, ExtractLimits};
use crate::error::OpResult;
use crate::ops::{self, ArchiveListingEntry, OperationRequest, OperationResult, Output};
use crate::workdir::WorkingDir;

pub struct Engine {
    cwd: WorkingDir,
    audit: AuditLog,
    limits: ExtractLimits,
}

impl Engine {
    /// Build an engine from configuration. A relative log file is placed
    /// relative to the starting directory and stays there after ChangeDir.
    pub fn new(config: &EngineConfig) -> std::io::Result<Self> {
        let cwd = match &config.base_dir {
            Some(base) => WorkingDir::new(std::path::absolute(base)?),
            None => WorkingDir::from_process()?,
        };
        let audit = AuditLog::with_file(cwd.resolve(&config.log_file));
        Ok(Self::with_parts(cwd, audit, config.limits))
    }

    pub fn with_parts(cwd: WorkingDir, audit: AuditLog, limits: ExtractLimits) -> Self {
        Self { cwd, audit, limits }
    }

    pub fn working_dir(&self) -> &WorkingDir {
        &self.cwd
    }

    pub fn audit_entries(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    /// Run one file or directory operation.
    pub async fn execute(&mut self, request: &OperationRequest) -> OperationResult {
        let target = self.cwd.resolve(request.path());
        let outcome = ops::dispatch(&self.cwd, request).await.map(|done| {
            if let Some(next) = done.next_dir {
                self.cwd = next;
            }
            (done.message, done.output)
        });

        self.finish(request.kind().as_str(), request.describe(), &target, outcome)
            .await
    }

    /// Pack a file or directory tree into a ZIP archive.
    pub async fn compress(&mut self, source: &Path, destination: &Path) -> OperationResult {
        let (source_path, destination_path) = (self.cwd.resolve(source), self.cwd.resolve(destination));
        let outcome = archive::compress(&source_path, &destination_path)
            .await
            .map(|summary| {
                (
                    format!(
                        "File/Directory '{}' compressed to '{}' successfully.",
                        source.display(),
                        destination.display()
                    ),
                    Some(Output::Archive(summary)),
                )
            });

        let description = format!(
            "Compressed file/directory '{}' to '{}'",
            source.display(),
            destination.display()
        );
        self.finish("compress", description, &source_path, outcome)
            .await
    }

    /// Unpack a ZIP archive under `destination`.
    pub async fn decompress(&mut self, source: &Path, destination: &Path) -> OperationResult {
        let (source_path, destination_path) = (self.cwd.resolve(source), self.cwd.resolve(destination));
        let outcome = archive::decompress(&source_path, &destination_path, &self.limits)
            .await
            .map(|summary| {
                (
                    format!(
                        "File/Directory '{}' decompressed to '{}' successfully.",
                        source.display(),
                        destination.display()
                    ),
                    Some(Output::Archive(summary)),
                )
            });

        let description = format!(
            "Decompressed file/directory '{}' to '{}'",
            source.display(),
            destination.display()
        );
        self.finish("decompress", description, &source_path, outcome)
            .await
    }

    /// Read an archive's entry table without extracting anything.
    pub async fn list_archive(&mut self, source: &Path) -> OperationResult {
        let source_path = self.cwd.resolve(source);
        let outcome = archive::list(&source_path).await.map(|entries| {
            let rows: Vec<_> = entries.iter().map(ArchiveListingEntry::from).collect();
            (
                format!("Archive '{}' has {} entries.", source.display(), rows.len()),
                Some(Output::ArchiveListing(rows)),
            )
        });

        self.finish("list_archive", "Listed archive contents".to_string(), &source_path, outcome)
            .await
    }

    async fn finish(
        &mut self,
        operation: &'static str,
        description: String,
        target: &Path,
        outcome: OpResult<(String, Option<Output>)>,
    ) -> OperationResult {
        let result = match outcome {
            Ok((message, output)) => {
                info!(operation, path = %target.display(), "operation succeeded");
                OperationResult::success(message, output)
            }
            Err(err) => {
                warn!(
                    operation,
                    path = %target.display(),
                    error_kind = %err.kind(),
                    error = %err,
                    "operation failed"
                );
                OperationResult::failure(&err)
            }
        };

        let action = match result.error_kind {
            None => description,
            Some(kind) => format!("{description} (failed: {kind})"),
        };
        self.audit.record(action, Some(target)).await;
        result
    }
}
