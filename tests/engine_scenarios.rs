use std::path::{Path, PathBuf};

use anyhow::Result;
use runfs::{
    AuditLog, Engine, ErrorKind, ExtractLimits, OperationRequest, Output, WorkingDir,
};
use tempfile::TempDir;

/// Engine rooted at an empty `work/` directory, logging next to it.
fn engine() -> Result<(TempDir, PathBuf, Engine)> {
    let tmp = tempfile::tempdir()?;
    let work = tmp.path().join("work");
    std::fs::create_dir(&work)?;
    let engine = Engine::with_parts(
        WorkingDir::new(&work),
        AuditLog::with_file(tmp.path().join("filelog.txt")),
        ExtractLimits::default(),
    );
    Ok((tmp, work, engine))
}

fn path(name: &str) -> PathBuf {
    PathBuf::from(name)
}

fn log_lines(tmp: &TempDir) -> Result<Vec<String>> {
    Ok(std::fs::read_to_string(tmp.path().join("filelog.txt"))?
        .lines()
        .map(str::to_string)
        .collect())
}

#[tokio::test]
async fn create_then_list_shows_the_file() -> Result<()> {
    let (_tmp, _work, mut engine) = engine()?;

    let created = engine
        .execute(&OperationRequest::CreateFile { path: path("test.txt") })
        .await;
    assert!(created.succeeded, "{}", created.message);

    let listed = engine
        .execute(&OperationRequest::ListDir { path: path(".") })
        .await;
    assert_eq!(listed.output, Some(Output::Entries(vec!["test.txt".to_string()])));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn set_then_get_permissions() -> Result<()> {
    let (_tmp, _work, mut engine) = engine()?;
    engine
        .execute(&OperationRequest::CreateFile { path: path("test.txt") })
        .await;

    let set = engine
        .execute(&OperationRequest::SetPermissions {
            path: path("test.txt"),
            permissions: "755".to_string(),
        })
        .await;
    assert!(set.succeeded, "{}", set.message);

    let got = engine
        .execute(&OperationRequest::GetPermissions { path: path("test.txt") })
        .await;
    let Some(Output::Permissions(value)) = got.output else {
        anyhow::bail!("expected permissions output, got {:?}", got.output);
    };
    assert_eq!(runfs::permissions::encode(value), "755");
    assert!(got.message.ends_with("0o755"));
    Ok(())
}

#[tokio::test]
async fn compress_then_decompress_restores_tree() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::create_dir_all(work.join("project/sub"))?;
    std::fs::write(work.join("project/a.txt"), "alpha")?;
    std::fs::write(work.join("project/sub/b.txt"), "bravo")?;

    let packed = engine.compress(Path::new("project"), Path::new("out.zip")).await;
    assert!(packed.succeeded, "{}", packed.message);

    let unpacked = engine.decompress(Path::new("out.zip"), Path::new("fresh")).await;
    assert!(unpacked.succeeded, "{}", unpacked.message);

    assert_eq!(std::fs::read_to_string(work.join("fresh/a.txt"))?, "alpha");
    assert_eq!(std::fs::read_to_string(work.join("fresh/sub/b.txt"))?, "bravo");

    let listed = engine.list_archive(Path::new("out.zip")).await;
    let Some(Output::ArchiveListing(rows)) = listed.output else {
        anyhow::bail!("expected listing, got {:?}", listed.output);
    };
    let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "sub/b.txt"]);
    Ok(())
}

#[tokio::test]
async fn copy_onto_itself_is_same_source() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::write(work.join("test.txt"), "original")?;

    let result = engine
        .execute(&OperationRequest::CopyFile {
            path: path("test.txt"),
            destination: path("test.txt"),
        })
        .await;
    assert_eq!(result.error_kind, Some(ErrorKind::SameSource));
    assert_eq!(std::fs::read_to_string(work.join("test.txt"))?, "original");
    Ok(())
}

#[tokio::test]
async fn compress_onto_its_own_source_is_refused() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::write(work.join("data.zip"), "precious bytes")?;

    let result = engine.compress(Path::new("data.zip"), Path::new("data.zip")).await;
    assert!(!result.succeeded);
    assert_eq!(result.error_kind, Some(ErrorKind::SameSource));
    assert_eq!(std::fs::read_to_string(work.join("data.zip"))?, "precious bytes");
    assert!(engine.audit_entries()[0].action().contains("(failed: same source)"));
    Ok(())
}

#[tokio::test]
async fn deleting_missing_file_only_logs_failure() -> Result<()> {
    let (tmp, work, mut engine) = engine()?;

    let result = engine
        .execute(&OperationRequest::DeleteFile { path: path("missing.txt") })
        .await;
    assert!(!result.succeeded);
    assert_eq!(result.error_kind, Some(ErrorKind::NotFound));

    let entries = engine.audit_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].action().starts_with("Deleted file (failed: not found)"));

    let lines = log_lines(&tmp)?;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(&format!(
        "Deleted file (failed: not found) - File/Directory: {}",
        work.join("missing.txt").display()
    )));
    assert_eq!(std::fs::read_dir(&work)?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn create_on_existing_target_never_modifies_it() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::write(work.join("a.txt"), "keep")?;
    std::fs::create_dir(work.join("d"))?;
    std::fs::write(work.join("d/inner"), "inner")?;

    let file = engine
        .execute(&OperationRequest::CreateFile { path: path("a.txt") })
        .await;
    let dir = engine
        .execute(&OperationRequest::CreateDir { path: path("d") })
        .await;

    assert_eq!(file.error_kind, Some(ErrorKind::AlreadyExists));
    assert_eq!(dir.error_kind, Some(ErrorKind::AlreadyExists));
    assert_eq!(std::fs::read_to_string(work.join("a.txt"))?, "keep");
    assert_eq!(std::fs::read_to_string(work.join("d/inner"))?, "inner");
    Ok(())
}

#[tokio::test]
async fn operations_on_missing_targets_are_not_found() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    let ghost = || path("ghost");

    let requests = vec![
        OperationRequest::DeleteFile { path: ghost() },
        OperationRequest::ReadFile { path: ghost() },
        OperationRequest::WriteFile { path: ghost(), content: "x".into() },
        OperationRequest::AppendFile { path: ghost(), content: "x".into() },
        OperationRequest::RenameFile { path: ghost(), new_name: path("other") },
        OperationRequest::CopyFile { path: ghost(), destination: path("other") },
        OperationRequest::GetPermissions { path: ghost() },
        OperationRequest::SetPermissions { path: ghost(), permissions: "644".into() },
        OperationRequest::DeleteDir { path: ghost() },
        OperationRequest::RenameDir { path: ghost(), new_name: path("other") },
        OperationRequest::ChangeDir { path: ghost() },
        OperationRequest::CopyDir { path: ghost(), destination: path("other") },
        OperationRequest::ListDir { path: ghost() },
        OperationRequest::GetDirPermissions { path: ghost() },
        OperationRequest::SetDirPermissions { path: ghost(), permissions: "755".into() },
    ];

    for request in &requests {
        let result = engine.execute(request).await;
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound), "{:?}", request.kind());
    }

    assert_eq!(std::fs::read_dir(&work)?.count(), 0);
    assert_eq!(engine.audit_entries().len(), requests.len());
    Ok(())
}

#[tokio::test]
async fn every_call_appends_one_ordered_entry() -> Result<()> {
    let (tmp, _work, mut engine) = engine()?;

    engine
        .execute(&OperationRequest::CreateDir { path: path("docs") })
        .await;
    engine
        .execute(&OperationRequest::CreateFile { path: path("docs/a.txt") })
        .await;
    engine
        .execute(&OperationRequest::WriteFile {
            path: path("docs/a.txt"),
            content: "hello".into(),
        })
        .await;
    engine
        .execute(&OperationRequest::SetPermissions {
            path: path("docs/a.txt"),
            permissions: "rwx".into(),
        })
        .await;
    engine.compress(Path::new("docs"), Path::new("docs.zip")).await;
    engine.decompress(Path::new("nope.zip"), Path::new("x")).await;

    let entries = engine.audit_entries();
    assert_eq!(entries.len(), 6);
    assert!(entries.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    assert!(entries[3].action().contains("failed: invalid permission format"));
    assert!(entries[4].action().starts_with("Compressed file/directory 'docs' to 'docs.zip'"));
    assert!(entries[5].action().contains("failed: not found"));

    let lines = log_lines(&tmp)?;
    assert_eq!(lines.len(), 6);
    for (line, entry) in lines.iter().zip(entries) {
        assert_eq!(line, &entry.to_string());
    }
    Ok(())
}

#[tokio::test]
async fn change_dir_moves_relative_resolution() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::create_dir(work.join("inner"))?;

    let changed = engine
        .execute(&OperationRequest::ChangeDir { path: path("inner") })
        .await;
    assert!(changed.succeeded, "{}", changed.message);
    assert_eq!(engine.working_dir().base(), std::fs::canonicalize(work.join("inner"))?);

    engine
        .execute(&OperationRequest::CreateFile { path: path("here.txt") })
        .await;
    assert!(work.join("inner/here.txt").is_file());

    // rename destinations follow the context, not the source's directory
    let absolute_source = work.join("inner/here.txt");
    let renamed = engine
        .execute(&OperationRequest::RenameFile {
            path: absolute_source,
            new_name: path("moved.txt"),
        })
        .await;
    assert!(renamed.succeeded, "{}", renamed.message);
    assert!(work.join("inner/moved.txt").is_file());
    Ok(())
}

#[tokio::test]
async fn read_write_append_round_trip() -> Result<()> {
    let (_tmp, _work, mut engine) = engine()?;
    engine
        .execute(&OperationRequest::CreateFile { path: path("log.txt") })
        .await;
    engine
        .execute(&OperationRequest::WriteFile {
            path: path("log.txt"),
            content: "one".into(),
        })
        .await;
    engine
        .execute(&OperationRequest::AppendFile {
            path: path("log.txt"),
            content: ", two".into(),
        })
        .await;

    let read = engine
        .execute(&OperationRequest::ReadFile { path: path("log.txt") })
        .await;
    assert_eq!(read.output, Some(Output::Content("one, two".to_string())));
    Ok(())
}

#[tokio::test]
async fn malformed_archive_fails_with_io_failure() -> Result<()> {
    let (_tmp, work, mut engine) = engine()?;
    std::fs::write(work.join("broken.zip"), vec![0u8; 100])?;

    let result = engine.decompress(Path::new("broken.zip"), Path::new("out")).await;
    assert_eq!(result.error_kind, Some(ErrorKind::IoFailure));
    assert_eq!(engine.audit_entries().len(), 1);
    Ok(())
}
