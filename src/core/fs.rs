// ─── Persistence helpers ───
// Atomic JSON writes and recursive directory copies shared by the stores.

use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::core::error::{LauncherError, LauncherResult};

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// The document is written to a sibling `.tmp` file, flushed to disk and then
/// renamed over the target, so a crash never leaves a truncated file behind.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> LauncherResult<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LauncherError::io(parent, source))?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .map_err(|source| LauncherError::io(&tmp_path, source))?;
    file.write_all(json.as_bytes())
        .await
        .map_err(|source| LauncherError::io(&tmp_path, source))?;
    file.sync_all()
        .await
        .map_err(|source| LauncherError::io(&tmp_path, source))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| LauncherError::io(path, source))?;

    Ok(())
}

/// Read a JSON document. `Ok(None)` when the file does not exist.
pub async fn read_json_value(path: &Path) -> LauncherResult<Option<serde_json::Value>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(LauncherError::io(path, source)),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| LauncherError::ConfigCorruption {
            path: path.to_path_buf(),
            source,
        })
}

/// Copy the contents of `source` into `destination`, merging with whatever
/// is already there. Existing files at the destination are overwritten.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(destination)?;

    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_write_replaces_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"old\": true}").unwrap();

        write_json_atomic(&path, &serde_json::json!({ "new": 1 }))
            .await
            .unwrap();

        let value = read_json_value(&path).await.unwrap().unwrap();
        assert_eq!(value, serde_json::json!({ "new": 1 }));
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn read_reports_missing_and_corrupt_files_differently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(read_json_value(&path).await.unwrap().is_none());

        std::fs::write(&path, "{not json").unwrap();
        let err = read_json_value(&path).await.unwrap_err();
        assert!(matches!(err, LauncherError::ConfigCorruption { .. }));
    }

    #[test]
    fn copy_dir_recursive_copies_nested_files() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("a/b")).unwrap();
        std::fs::write(src.path().join("a/b/file.txt"), "hello").unwrap();
        std::fs::write(src.path().join("top.txt"), "top").unwrap();

        copy_dir_recursive(src.path(), &dst.path().join("out")).unwrap();

        let nested = std::fs::read_to_string(dst.path().join("out/a/b/file.txt")).unwrap();
        assert_eq!(nested, "hello");
        assert!(dst.path().join("out/top.txt").exists());
    }
}
