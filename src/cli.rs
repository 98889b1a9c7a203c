use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_LOG_FILE, EngineConfig, ExtractLimits};
use crate::ops::OperationRequest;

#[derive(Parser, Debug)]
#[command(name = "runfs")]
#[command(version)]
#[command(about = "File and directory management with ZIP packaging and an audit trail", long_about = None)]
#[command(after_help = "Examples:\n  \
  runfs create-file notes.txt           create an empty file\n  \
  runfs set-perms notes.txt 640         change permission bits\n  \
  runfs compress project out.zip        pack a directory tree\n  \
  runfs -v list out.zip                 show the archive table")]
pub struct Cli {
    /// Directory relative names are resolved against
    #[arg(short = 'C', long, value_name = "DIR", env = "RUNFS_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Append-only audit log
    #[arg(long, value_name = "FILE", env = "RUNFS_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Refuse to extract more than this many bytes from one archive
    #[arg(long, value_name = "BYTES", env = "RUNFS_MAX_EXTRACT_BYTES")]
    pub max_extract_bytes: Option<u64>,

    /// Refuse archives with more than this many entries
    #[arg(long, value_name = "COUNT", env = "RUNFS_MAX_EXTRACT_ENTRIES")]
    pub max_extract_entries: Option<usize>,

    /// More diagnostics on stderr (-vv => debug)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an empty file
    CreateFile { path: PathBuf },
    /// Delete a file
    DeleteFile { path: PathBuf },
    /// Print a file's content
    Read { path: PathBuf },
    /// Replace a file's content
    Write { path: PathBuf, content: String },
    /// Append to a file
    Append { path: PathBuf, content: String },
    /// Rename a file
    RenameFile { path: PathBuf, new_name: PathBuf },
    /// Copy a file
    CopyFile { path: PathBuf, destination: PathBuf },
    /// Show a file's permission bits
    GetPerms { path: PathBuf },
    /// Set a file's permission bits (octal, e.g. 755)
    SetPerms { path: PathBuf, permissions: String },
    /// Create a directory and missing parents
    CreateDir { path: PathBuf },
    /// Delete a directory recursively
    DeleteDir { path: PathBuf },
    /// Rename a directory
    RenameDir { path: PathBuf, new_name: PathBuf },
    /// Change the working directory, then print it
    ChangeDir { path: PathBuf },
    /// Copy a directory tree
    CopyDir { path: PathBuf, destination: PathBuf },
    /// List a directory's immediate children
    Ls {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Show a directory's permission bits
    GetDirPerms { path: PathBuf },
    /// Set a directory's permission bits (octal, e.g. 755)
    SetDirPerms { path: PathBuf, permissions: String },
    /// Pack a file or directory into a ZIP archive
    Compress { source: PathBuf, destination: PathBuf },
    /// Unpack a ZIP archive into a directory
    Decompress {
        archive: PathBuf,
        #[arg(default_value = ".")]
        destination: PathBuf,
    },
    /// List the entries of a ZIP archive
    List { archive: PathBuf },
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn engine_config(&self) -> EngineConfig {
        let defaults = ExtractLimits::default();
        EngineConfig {
            base_dir: self.base_dir.clone(),
            log_file: self.log_file.clone(),
            limits: ExtractLimits {
                max_entries: self.max_extract_entries.unwrap_or(defaults.max_entries),
                max_total_bytes: self.max_extract_bytes.unwrap_or(defaults.max_total_bytes),
            },
        }
    }
}

impl Command {
    /// Dispatcher request for this command; `None` for archive commands.
    pub fn to_request(&self) -> Option<OperationRequest> {
        let request = match self.clone() {
            Command::CreateFile { path } => OperationRequest::CreateFile { path },
            Command::DeleteFile { path } => OperationRequest::DeleteFile { path },
            Command::Read { path } => OperationRequest::ReadFile { path },
            Command::Write { path, content } => OperationRequest::WriteFile { path, content },
            Command::Append { path, content } => OperationRequest::AppendFile { path, content },
            Command::RenameFile { path, new_name } => OperationRequest::RenameFile { path, new_name },
            Command::CopyFile { path, destination } => {
                OperationRequest::CopyFile { path, destination }
            }
            Command::GetPerms { path } => OperationRequest::GetPermissions { path },
            Command::SetPerms { path, permissions } => {
                OperationRequest::SetPermissions { path, permissions }
            }
            Command::CreateDir { path } => OperationRequest::CreateDir { path },
            Command::DeleteDir { path } => OperationRequest::DeleteDir { path },
            Command::RenameDir { path, new_name } => OperationRequest::RenameDir { path, new_name },
            Command::ChangeDir { path } => OperationRequest::ChangeDir { path },
            Command::CopyDir { path, destination } => OperationRequest::CopyDir { path, destination },
            Command::Ls { path } => OperationRequest::ListDir { path },
            Command::GetDirPerms { path } => OperationRequest::GetDirPermissions { path },
            Command::SetDirPerms { path, permissions } => {
                OperationRequest::SetDirPermissions { path, permissions }
            }
            Command::Compress { .. } | Command::Decompress { .. } | Command::List { .. } => {
                return None;
            }
        };
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_operation_subcommands() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["runfs", "-C", "/srv", "set-perms", "a.txt", "755"])?;
        assert_eq!(cli.base_dir, Some(PathBuf::from("/srv")));
        assert_eq!(
            cli.command.to_request(),
            Some(OperationRequest::SetPermissions {
                path: PathBuf::from("a.txt"),
                permissions: "755".to_string(),
            })
        );
        Ok(())
    }

    #[test]
    fn archive_commands_are_not_dispatcher_requests() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["runfs", "decompress", "out.zip"])?;
        assert_eq!(
            cli.command,
            Command::Decompress {
                archive: PathBuf::from("out.zip"),
                destination: PathBuf::from("."),
            }
        );
        assert!(cli.command.to_request().is_none());
        Ok(())
    }

    #[test]
    fn limits_fall_back_to_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["runfs", "--max-extract-bytes", "1024", "ls"])?;
        let config = cli.engine_config();
        assert_eq!(config.limits.max_total_bytes, 1024);
        assert_eq!(config.limits.max_entries, ExtractLimits::default().max_entries);
        Ok(())
    }
}
