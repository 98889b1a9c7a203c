use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::checks::{classify, ensure_absent, require, require_file, same_target};
use crate::error::{OpError, OpResult};
use crate::permissions::{self, PermissionValue};

pub(crate) async fn create(path: &Path) -> OpResult<()> {
    ensure_absent("create_file", path).await?;
    tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| classify("create_file", path, e))?;
    Ok(())
}

pub(crate) async fn delete(path: &Path) -> OpResult<()> {
    require_file("delete_file", path).await?;
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| classify("delete_file", path, e))
}

pub(crate) async fn read(path: &Path) -> OpResult<String> {
    require_file("read_file", path).await?;
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| classify("read_file", path, e))
}

/// Replace the whole content of an existing file.
pub(crate) async fn write(path: &Path, content: &str) -> OpResult<()> {
    require_file("write_file", path).await?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| classify("write_file", path, e))
}

pub(crate) async fn append(path: &Path, content: &str) -> OpResult<()> {
    require_file("append_file", path).await?;
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| classify("append_file", path, e))?;
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| OpError::io("append_file", path, e))?;
    file.flush()
        .await
        .map_err(|e| OpError::io("append_file", path, e))
}

pub(crate) async fn rename(from: &Path, to: &Path) -> OpResult<()> {
    require_file("rename_file", from).await?;
    ensure_absent("rename_file", to).await?;
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| OpError::io("rename_file", from, e))
}

/// Copy `from` to `to`, or into `to` when it is a directory. Returns the
/// path actually written.
pub(crate) async fn copy(from: &Path, to: &Path) -> OpResult<PathBuf> {
    require_file("copy_file", from).await?;

    let destination = match tokio::fs::metadata(to).await {
        Ok(metadata) if metadata.is_dir() => match from.file_name() {
            Some(name) => to.join(name),
            None => to.to_path_buf(),
        },
        _ => to.to_path_buf(),
    };

    if same_target(from, &destination).await {
        return Err(OpError::SameSource { path: destination });
    }

    tokio::fs::copy(from, &destination)
        .await
        .map_err(|e| OpError::io("copy_file", &destination, e))?;
    Ok(destination)
}

pub(crate) async fn get_permissions(path: &Path) -> OpResult<PermissionValue> {
    require("get_permissions", path).await?;
    permissions::read(path).await
}

/// Decode `text` and apply it. Nothing is changed when decoding fails.
pub(crate) async fn set_permissions(path: &Path, text: &str) -> OpResult<PermissionValue> {
    require("set_permissions", path).await?;
    let value = permissions::decode(text)?;
    permissions::apply(path, value).await?;
    Ok(value)
}
