//! File and directory operations.
//!
//! An [`OperationRequest`] names one of the supported actions together with
//! its arguments. [`dispatch`] resolves every path against a [`WorkingDir`],
//! runs the action and reports either a [`Completed`] value or an
//! [`OpError`]. Turning that into an [`OperationResult`] and writing the
//! audit record is the engine's job.

pub(crate) mod checks;
mod dir;
mod file;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::archive::ArchiveSummary;
use crate::error::{ErrorKind, OpError, OpResult};
use crate::permissions::PermissionValue;
use crate::workdir::WorkingDir;
use crate::zip::ZipFileEntry;

/// Field-less tag of an [`OperationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateFile,
    DeleteFile,
    ReadFile,
    WriteFile,
    AppendFile,
    RenameFile,
    CopyFile,
    GetPermissions,
    SetPermissions,
    CreateDir,
    DeleteDir,
    RenameDir,
    ChangeDir,
    CopyDir,
    ListDir,
    GetDirPermissions,
    SetDirPermissions,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateFile => "create_file",
            OperationKind::DeleteFile => "delete_file",
            OperationKind::ReadFile => "read_file",
            OperationKind::WriteFile => "write_file",
            OperationKind::AppendFile => "append_file",
            OperationKind::RenameFile => "rename_file",
            OperationKind::CopyFile => "copy_file",
            OperationKind::GetPermissions => "get_permissions",
            OperationKind::SetPermissions => "set_permissions",
            OperationKind::CreateDir => "create_dir",
            OperationKind::DeleteDir => "delete_dir",
            OperationKind::RenameDir => "rename_dir",
            OperationKind::ChangeDir => "change_dir",
            OperationKind::CopyDir => "copy_dir",
            OperationKind::ListDir => "list_dir",
            OperationKind::GetDirPermissions => "get_dir_permissions",
            OperationKind::SetDirPermissions => "set_dir_permissions",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    CreateFile { path: PathBuf },
    DeleteFile { path: PathBuf },
    ReadFile { path: PathBuf },
    WriteFile { path: PathBuf, content: String },
    AppendFile { path: PathBuf, content: String },
    RenameFile { path: PathBuf, new_name: PathBuf },
    CopyFile { path: PathBuf, destination: PathBuf },
    GetPermissions { path: PathBuf },
    SetPermissions { path: PathBuf, permissions: String },
    CreateDir { path: PathBuf },
    DeleteDir { path: PathBuf },
    RenameDir { path: PathBuf, new_name: PathBuf },
    ChangeDir { path: PathBuf },
    CopyDir { path: PathBuf, destination: PathBuf },
    ListDir { path: PathBuf },
    GetDirPermissions { path: PathBuf },
    SetDirPermissions { path: PathBuf, permissions: String },
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::CreateFile { .. } => OperationKind::CreateFile,
            OperationRequest::DeleteFile { .. } => OperationKind::DeleteFile,
            OperationRequest::ReadFile { .. } => OperationKind::ReadFile,
            OperationRequest::WriteFile { .. } => OperationKind::WriteFile,
            OperationRequest::AppendFile { .. } => OperationKind::AppendFile,
            OperationRequest::RenameFile { .. } => OperationKind::RenameFile,
            OperationRequest::CopyFile { .. } => OperationKind::CopyFile,
            OperationRequest::GetPermissions { .. } => OperationKind::GetPermissions,
            OperationRequest::SetPermissions { .. } => OperationKind::SetPermissions,
            OperationRequest::CreateDir { .. } => OperationKind::CreateDir,
            OperationRequest::DeleteDir { .. } => OperationKind::DeleteDir,
            OperationRequest::RenameDir { .. } => OperationKind::RenameDir,
            OperationRequest::ChangeDir { .. } => OperationKind::ChangeDir,
            OperationRequest::CopyDir { .. } => OperationKind::CopyDir,
            OperationRequest::ListDir { .. } => OperationKind::ListDir,
            OperationRequest::GetDirPermissions { .. } => OperationKind::GetDirPermissions,
            OperationRequest::SetDirPermissions { .. } => OperationKind::SetDirPermissions,
        }
    }

    /// Primary target, as supplied by the caller.
    pub fn path(&self) -> &Path {
        match self {
            OperationRequest::CreateFile { path }
            | OperationRequest::DeleteFile { path }
            | OperationRequest::ReadFile { path }
            | OperationRequest::WriteFile { path, .. }
            | OperationRequest::AppendFile { path, .. }
            | OperationRequest::RenameFile { path, .. }
            | OperationRequest::CopyFile { path, .. }
            | OperationRequest::GetPermissions { path }
            | OperationRequest::SetPermissions { path, .. }
            | OperationRequest::CreateDir { path }
            | OperationRequest::DeleteDir { path }
            | OperationRequest::RenameDir { path, .. }
            | OperationRequest::ChangeDir { path }
            | OperationRequest::CopyDir { path, .. }
            | OperationRequest::ListDir { path }
            | OperationRequest::GetDirPermissions { path }
            | OperationRequest::SetDirPermissions { path, .. } => path,
        }
    }

    /// Audit description, worded like "Renamed file 'a' to 'b'".
    pub fn describe(&self) -> String {
        let quoted = |p: &Path| format!("'{}'", p.display());
        match self {
            OperationRequest::CreateFile { .. } => "Created file".to_string(),
            OperationRequest::DeleteFile { .. } => "Deleted file".to_string(),
            OperationRequest::ReadFile { .. } => "Read file".to_string(),
            OperationRequest::WriteFile { .. } => "Wrote to file".to_string(),
            OperationRequest::AppendFile { .. } => "Appended to file".to_string(),
            OperationRequest::RenameFile { path, new_name } => {
                format!("Renamed file {} to {}", quoted(path), quoted(new_name))
            }
            OperationRequest::CopyFile { path, destination } => {
                format!("Copied file {} to {}", quoted(path), quoted(destination))
            }
            OperationRequest::GetPermissions { .. } => "Get permissions".to_string(),
            OperationRequest::SetPermissions { .. } => "Set permissions".to_string(),
            OperationRequest::CreateDir { .. } => "Created directory".to_string(),
            OperationRequest::DeleteDir { .. } => "Deleted directory".to_string(),
            OperationRequest::RenameDir { path, new_name } => {
                format!("Renamed directory {} to {}", quoted(path), quoted(new_name))
            }
            OperationRequest::ChangeDir { .. } => "Changed directory".to_string(),
            OperationRequest::CopyDir { path, destination } => {
                format!("Copied directory {} to {}", quoted(path), quoted(destination))
            }
            OperationRequest::ListDir { .. } => "Listed directory contents".to_string(),
            OperationRequest::GetDirPermissions { .. } => "Get directory permissions".to_string(),
            OperationRequest::SetDirPermissions { .. } => "Set directory permissions".to_string(),
        }
    }
}

/// Data returned by operations that read something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Content(String),
    Entries(Vec<String>),
    Permissions(PermissionValue),
    Archive(ArchiveSummary),
    ArchiveListing(Vec<ArchiveListingEntry>),
}

/// One row of an archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveListingEntry {
    pub name: String,
    pub method: &'static str,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub modified: (u16, u8, u8, u8, u8),
    pub is_directory: bool,
}

impl From<&ZipFileEntry> for ArchiveListingEntry {
    fn from(entry: &ZipFileEntry) -> Self {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _) = entry.mod_time();
        Self {
            name: entry.file_name.clone(),
            method: entry.compression_method.label(),
            compressed_size: entry.compressed_size,
            uncompressed_size: entry.uncompressed_size,
            modified: (year, month, day, hour, minute),
            is_directory: entry.is_directory,
        }
    }
}

/// Outcome of one engine call, success or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub succeeded: bool,
    pub message: String,
    pub error_kind: Option<ErrorKind>,
    pub output: Option<Output>,
}

impl OperationResult {
    pub fn success(message: impl Into<String>, output: Option<Output>) -> Self {
        Self {
            succeeded: true,
            message: message.into(),
            error_kind: None,
            output,
        }
    }

    pub fn failure(err: &OpError) -> Self {
        Self {
            succeeded: false,
            message: err.to_string(),
            error_kind: Some(err.kind()),
            output: None,
        }
    }
}

/// Successful dispatch. `next_dir` is set only by ChangeDir.
#[derive(Debug)]
pub struct Completed {
    pub message: String,
    pub output: Option<Output>,
    pub next_dir: Option<WorkingDir>,
}

impl Completed {
    fn message(message: String) -> Self {
        Self {
            message,
            output: None,
            next_dir: None,
        }
    }

    fn with_output(message: String, output: Output) -> Self {
        Self {
            message,
            output: Some(output),
            next_dir: None,
        }
    }
}

/// Run `request` against `cwd`. The context itself is never mutated.
pub async fn dispatch(cwd: &WorkingDir, request: &OperationRequest) -> OpResult<Completed> {
    let target = cwd.resolve(request.path());
    let name = request.path().display();

    match request {
        OperationRequest::CreateFile { .. } => {
            file::create(&target).await?;
            Ok(Completed::message(format!("File '{name}' created successfully.")))
        }
        OperationRequest::DeleteFile { .. } => {
            file::delete(&target).await?;
            Ok(Completed::message(format!("File '{name}' deleted successfully.")))
        }
        OperationRequest::ReadFile { .. } => {
            let content = file::read(&target).await?;
            Ok(Completed::with_output(
                format!("Read {} bytes from '{name}'.", content.len()),
                Output::Content(content),
            ))
        }
        OperationRequest::WriteFile { content, .. } => {
            file::write(&target, content).await?;
            Ok(Completed::message(format!(
                "Content written to file '{name}' successfully."
            )))
        }
        OperationRequest::AppendFile { content, .. } => {
            file::append(&target, content).await?;
            Ok(Completed::message(format!(
                "Content appended to file '{name}' successfully."
            )))
        }
        OperationRequest::RenameFile { new_name, .. } => {
            file::rename(&target, &cwd.resolve(new_name)).await?;
            Ok(Completed::message(format!(
                "File '{name}' renamed to '{}' successfully.",
                new_name.display()
            )))
        }
        OperationRequest::CopyFile { destination, .. } => {
            let copied = file::copy(&target, &cwd.resolve(destination)).await?;
            Ok(Completed::message(format!(
                "File '{name}' copied to '{}' successfully.",
                copied.display()
            )))
        }
        OperationRequest::GetPermissions { .. } => {
            let value = file::get_permissions(&target).await?;
            Ok(Completed::with_output(
                format!("Permissions for '{name}': {value}"),
                Output::Permissions(value),
            ))
        }
        OperationRequest::SetPermissions { permissions, .. } => {
            let value = file::set_permissions(&target, permissions).await?;
            Ok(Completed::message(format!(
                "Permissions for '{name}' set to {value}"
            )))
        }
        OperationRequest::CreateDir { .. } => {
            dir::create(&target).await?;
            Ok(Completed::message(format!(
                "Directory '{name}' created successfully."
            )))
        }
        OperationRequest::DeleteDir { .. } => {
            dir::delete(&target).await?;
            Ok(Completed::message(format!(
                "Directory '{name}' deleted successfully."
            )))
        }
        OperationRequest::RenameDir { new_name, .. } => {
            dir::rename(&target, &cwd.resolve(new_name)).await?;
            Ok(Completed::message(format!(
                "Directory '{name}' renamed to '{}' successfully.",
                new_name.display()
            )))
        }
        OperationRequest::ChangeDir { .. } => {
            let next = dir::change(cwd, &target).await?;
            Ok(Completed {
                message: format!("Changed working directory to '{}'", next.base().display()),
                output: None,
                next_dir: Some(next),
            })
        }
        OperationRequest::CopyDir { destination, .. } => {
            let copied = dir::copy(&target, &cwd.resolve(destination)).await?;
            Ok(Completed::message(format!(
                "Directory '{name}' copied to '{}' successfully ({copied} files).",
                destination.display()
            )))
        }
        OperationRequest::ListDir { .. } => {
            let names = dir::list(&target).await?;
            Ok(Completed::with_output(
                format!("Directory '{name}' has {} entries.", names.len()),
                Output::Entries(names),
            ))
        }
        OperationRequest::GetDirPermissions { .. } => {
            let value = dir::get_permissions(&target).await?;
            Ok(Completed::with_output(
                format!("Permissions for directory '{name}': {value}"),
                Output::Permissions(value),
            ))
        }
        OperationRequest::SetDirPermissions { permissions, .. } => {
            let value = dir::set_permissions(&target, permissions).await?;
            Ok(Completed::message(format!(
                "Permissions for directory '{name}' set to {value}"
            )))
        }
    }
}
