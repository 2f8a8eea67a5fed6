use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::model::{Settings, SettingsPatch};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs::{read_json_value, write_json_atomic};

/// Owns the launcher settings document at an explicit path.
///
/// Construct once at startup and share it (behind an `Arc`) with every
/// consumer. Writes are merges: keys not named by a patch survive untouched.
pub struct SettingsStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles across panels.
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted settings, applying defaults to missing fields.
    ///
    /// A missing file is not an error. A malformed file is reported as
    /// `ConfigCorruption` so the caller can decide how loud to be about it.
    pub async fn read(&self) -> LauncherResult<Settings> {
        let doc = self.read_document().await?;
        Ok(Settings::from_document(&doc.unwrap_or_default()))
    }

    /// Fail-open read: any error degrades to defaults and is logged.
    pub async fn read_or_default(&self) -> Settings {
        match self.read().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Settings unreadable, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Overlay `patch` onto the persisted document and write it back atomically.
    pub async fn write(&self, patch: SettingsPatch) -> LauncherResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;

        let mut doc = match self.read_document().await {
            Ok(doc) => doc.unwrap_or_default(),
            Err(e) => {
                warn!("Replacing unreadable settings at {:?}: {}", self.path, e);
                Map::new()
            }
        };

        patch.apply_to(&mut doc);
        write_json_atomic(&self.path, &doc).await?;

        debug!("Settings written to {:?}", self.path);
        Ok(())
    }

    async fn read_document(&self) -> LauncherResult<Option<Map<String, Value>>> {
        match read_json_value(&self.path).await? {
            None => Ok(None),
            Some(value) => serde_json::from_value::<Map<String, Value>>(value)
                .map(Some)
                .map_err(|source| LauncherError::ConfigCorruption {
                    path: self.path.clone(),
                    source,
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.read().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn successive_writes_merge_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .write(SettingsPatch::default().with_raw("a", json!(1)))
            .await
            .unwrap();
        store
            .write(SettingsPatch::default().with_raw("b", json!(2)))
            .await
            .unwrap();

        let settings = store.read().await.unwrap();
        assert_eq!(settings.extra.get("a"), Some(&json!(1)));
        assert_eq!(settings.extra.get("b"), Some(&json!(2)));
        assert_eq!(settings.max_memory_mb, 2048);
        assert_eq!(settings.width, 854);
    }

    #[tokio::test]
    async fn typed_fields_from_different_writers_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store
            .write(SettingsPatch {
                max_memory_mb: Some(6144),
                fullscreen: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .write(SettingsPatch {
                username: Some("Steve".into()),
                active_profile_id: Some("abcd1234".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let settings = store.read().await.unwrap();
        assert_eq!(settings.max_memory_mb, 6144);
        assert!(settings.fullscreen);
        assert_eq!(settings.username, "Steve");
        assert_eq!(settings.active_profile_id.as_deref(), Some("abcd1234"));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_then_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ this is not json").unwrap();

        assert!(matches!(
            store.read().await,
            Err(LauncherError::ConfigCorruption { .. })
        ));
        assert_eq!(store.read_or_default().await, Settings::default());

        store
            .write(SettingsPatch {
                width: Some(1280),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(store.read().await.unwrap().width, 1280);
    }

    #[tokio::test]
    async fn non_object_document_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert!(matches!(
            store.read().await,
            Err(LauncherError::ConfigCorruption { .. })
        ));
        assert_eq!(store.read_or_default().await, Settings::default());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .write(SettingsPatch::default().with_raw(format!("key{i}"), json!(i)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let settings = store.read().await.unwrap();
        for i in 0..16 {
            assert_eq!(settings.extra.get(&format!("key{i}")), Some(&json!(i)));
        }
    }
}
