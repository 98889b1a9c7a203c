use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::checks::{
    canonical_destination, classify, ensure_absent, require_dir, same_target,
};
use crate::error::{OpError, OpResult};
use crate::permissions::{self, PermissionValue};
use crate::workdir::WorkingDir;

/// Create `path` and any missing parents.
pub(crate) async fn create(path: &Path) -> OpResult<()> {
    ensure_absent("create_dir", path).await?;
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| classify("create_dir", path, e))
}

/// Remove `path` with everything below it.
pub(crate) async fn delete(path: &Path) -> OpResult<()> {
    require_dir("delete_dir", path).await?;
    tokio::fs::remove_dir_all(path)
        .await
        .map_err(|e| classify("delete_dir", path, e))
}

pub(crate) async fn rename(from: &Path, to: &Path) -> OpResult<()> {
    require_dir("rename_dir", from).await?;
    ensure_absent("rename_dir", to).await?;
    tokio::fs::rename(from, to)
        .await
        .map_err(|e| OpError::io("rename_dir", from, e))
}

/// New context rooted at the canonical form of `path`.
pub(crate) async fn change(cwd: &WorkingDir, path: &Path) -> OpResult<WorkingDir> {
    require_dir("change_dir", path).await?;
    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| classify("change_dir", path, e))?;
    Ok(cwd.change_to(canonical))
}

/// Recursively copy `from` to a new directory `to`. Returns the number of
/// files copied.
pub(crate) async fn copy(from: &Path, to: &Path) -> OpResult<usize> {
    require_dir("copy_dir", from).await?;
    if same_target(from, to).await {
        return Err(OpError::SameSource {
            path: to.to_path_buf(),
        });
    }
    ensure_absent("copy_dir", to).await?;

    let root = tokio::fs::canonicalize(from)
        .await
        .map_err(|e| classify("copy_dir", from, e))?;
    if canonical_destination(to)
        .await
        .is_some_and(|dest| dest.starts_with(&root))
    {
        return Err(OpError::io(
            "copy_dir",
            to,
            io::Error::new(io::ErrorKind::InvalidInput, "destination is inside the source"),
        ));
    }

    tokio::fs::create_dir_all(to)
        .await
        .map_err(|e| OpError::io("copy_dir.create_dir", to, e))?;

    let mut copied = 0;
    for item in WalkDir::new(&root).min_depth(1) {
        let item = item.map_err(|e| OpError::Walk {
            path: root.clone(),
            source: e,
        })?;
        let relative = item.path().strip_prefix(&root).map_err(|_| {
            OpError::io(
                "copy_dir.relative",
                item.path(),
                io::Error::other("entry outside source tree"),
            )
        })?;
        let target = to.join(relative);

        if item.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| OpError::io("copy_dir.create_dir", &target, e))?;
        } else {
            tokio::fs::copy(item.path(), &target)
                .await
                .map_err(|e| OpError::io("copy_dir.copy_entry", &target, e))?;
            copied += 1;
        }
    }

    debug!(from = %from.display(), to = %to.display(), files = copied, "copied directory tree");
    Ok(copied)
}

/// Immediate children, in the order the platform enumerates them.
pub(crate) async fn list(path: &Path) -> OpResult<Vec<String>> {
    require_dir("list_dir", path).await?;
    let mut reader = tokio::fs::read_dir(path)
        .await
        .map_err(|e| classify("list_dir", path, e))?;

    let mut names = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| OpError::io("list_dir", path, e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

pub(crate) async fn get_permissions(path: &Path) -> OpResult<PermissionValue> {
    require_dir("get_dir_permissions", path).await?;
    permissions::read(path).await
}

pub(crate) async fn set_permissions(path: &Path, text: &str) -> OpResult<PermissionValue> {
    require_dir("set_dir_permissions", path).await?;
    let value = permissions::decode(text)?;
    permissions::apply(path, value).await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn create_makes_parents_and_refuses_existing() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let nested = tmp.path().join("a/b/c");
        create(&nested).await?;
        assert!(nested.is_dir());

        let err = create(&nested).await.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::AlreadyExists));
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_recursive() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().join("root");
        std::fs::create_dir_all(root.join("x/y"))?;
        std::fs::write(root.join("x/y/file"), "z")?;

        delete(&root).await?;
        assert!(!root.exists());
        Ok(())
    }

    #[tokio::test]
    async fn copy_reproduces_tree_and_refuses_existing_destination() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("sub/empty"))?;
        std::fs::write(src.join("a.txt"), "a")?;
        std::fs::write(src.join("sub/b.txt"), "b")?;

        let dst = tmp.path().join("dst");
        assert_eq!(copy(&src, &dst).await?, 2);
        assert_eq!(std::fs::read_to_string(dst.join("sub/b.txt"))?, "b");
        assert!(dst.join("sub/empty").is_dir());

        let err = copy(&src, &dst).await.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::AlreadyExists));

        let err = copy(&src, &src).await.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::SameSource));
        Ok(())
    }

    #[tokio::test]
    async fn copy_into_own_subtree_is_rejected() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src)?;
        std::fs::write(src.join("a.txt"), "a")?;

        let err = copy(&src, &src.join("inner")).await.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::IoFailure));
        assert!(!src.join("inner").exists());
        Ok(())
    }

    #[tokio::test]
    async fn list_is_shallow() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        std::fs::create_dir_all(tmp.path().join("sub/deep"))?;
        std::fs::write(tmp.path().join("a.txt"), "a")?;
        std::fs::write(tmp.path().join("sub/b.txt"), "b")?;

        let mut names = list(tmp.path()).await?;
        names.sort();
        assert_eq!(names, ["a.txt", "sub"]);
        Ok(())
    }

    #[tokio::test]
    async fn change_returns_canonical_context() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        std::fs::create_dir_all(tmp.path().join("sub"))?;
        let cwd = WorkingDir::new(tmp.path());

        let next = change(&cwd, &cwd.resolve("sub/../sub")).await?;
        assert_eq!(next.base(), std::fs::canonicalize(tmp.path().join("sub"))?);
        assert_eq!(cwd.base(), tmp.path());

        let err = change(&cwd, &cwd.resolve("missing")).await.err().map(|e| e.kind());
        assert_eq!(err, Some(ErrorKind::NotFound));
        Ok(())
    }
}
