//! # runfs
//!
//! File and directory management with ZIP packaging and an append-only audit
//! trail.
//!
//! The [`Engine`] runs one request at a time against a local file tree:
//!
//! - file operations: create, delete, read, write, append, rename, copy,
//!   get/set permissions
//! - directory operations: create, delete, rename, change, copy, list,
//!   get/set permissions
//! - archives: recursive DEFLATE compression into a ZIP container,
//!   extraction preserving relative paths, and entry listing
//!
//! Every call returns an [`OperationResult`] tagged with an
//! [`ErrorKind`](error::ErrorKind) on failure, and appends exactly one line
//! to the audit log whatever the outcome.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use runfs::{Engine, EngineConfig, OperationRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut engine = Engine::new(&EngineConfig::default())?;
//!
//!     let result = engine
//!         .execute(&OperationRequest::CreateFile { path: PathBuf::from("test.txt") })
//!         .await;
//!     println!("{}", result.message);
//!
//!     let result = engine
//!         .compress("project".as_ref(), "project.zip".as_ref())
//!         .await;
//!     println!("{}", result.message);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod audit;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod ops;
pub mod permissions;
pub mod telemetry;
pub mod workdir;
pub mod zip;

pub use audit::{AuditEntry, AuditLog, AuditSink, FileAuditSink};
pub use cli::{Cli, Command};
pub use config::{EngineConfig, ExtractLimits};
pub use engine::Engine;
pub use error::{ErrorKind, OpError};
pub use ops::{OperationKind, OperationRequest, OperationResult, Output};
pub use permissions::PermissionValue;
pub use workdir::WorkingDir;
