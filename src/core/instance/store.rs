use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{LoaderType, Profile, ProfileUpdate, ProfilesDocument, INSTANCE_DIRS};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::fs::{copy_dir_recursive, read_json_value, write_json_atomic};

pub const DEFAULT_PROFILE_NAME: &str = "Default";
pub const DEFAULT_PROFILE_VERSION: &str = "1.21.4";
pub const DEFAULT_PROFILE_COLOR: &str = "#4ade80";

/// What happened to the instance directory during an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRename {
    /// The name did not change the directory.
    Unchanged,
    Renamed { from: PathBuf, to: PathBuf },
    /// The profile was renamed but its files stayed under the old directory.
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub struct ProfileUpdated {
    pub profile: Profile,
    pub directory: DirectoryRename,
}

/// Owns the profile list, the active selection and the instance directories
/// under `<game root>/versions/`.
///
/// Every mutation runs under one lock and is persisted to `profiles.json`
/// before the lock is released.
pub struct InstanceStore {
    profiles_path: PathBuf,
    versions_dir: PathBuf,
    state: Mutex<ProfilesDocument>,
}

impl InstanceStore {
    /// Load `profiles.json`, synthesizing a default profile when the store is
    /// empty, missing or unreadable. An unreadable file is copied to
    /// `profiles.json.bak` before it is replaced.
    pub async fn open(profiles_path: PathBuf, game_root: &Path) -> Self {
        let mut document = match load_document(&profiles_path).await {
            Ok(document) => document,
            Err(e) => {
                warn!("Could not load profiles from {:?}: {}", profiles_path, e);
                back_up_unreadable(&profiles_path).await;
                ProfilesDocument::default()
            }
        };
        repair_active_id(&mut document);

        let store = Self {
            profiles_path,
            versions_dir: game_root.join("versions"),
            state: Mutex::new(document),
        };

        let is_empty = store.state.lock().await.profiles.is_empty();
        if is_empty {
            info!("No profiles found, creating '{}'", DEFAULT_PROFILE_NAME);
            if let Err(e) = store
                .create(
                    DEFAULT_PROFILE_NAME,
                    DEFAULT_PROFILE_VERSION,
                    LoaderType::Vanilla,
                    DEFAULT_PROFILE_COLOR,
                )
                .await
            {
                warn!("Could not create default profile: {}", e);
            }
        }

        store
    }

    pub fn versions_dir(&self) -> &Path {
        &self.versions_dir
    }

    /// All profiles in insertion order.
    pub async fn list(&self) -> Vec<Profile> {
        self.state.lock().await.profiles.clone()
    }

    pub async fn get(&self, id: &str) -> LauncherResult<Profile> {
        let state = self.state.lock().await;
        find(&state, id)
            .cloned()
            .ok_or_else(|| LauncherError::ProfileNotFound(id.to_string()))
    }

    /// The active profile, or the first one when the stored id is stale.
    pub async fn active(&self) -> LauncherResult<Profile> {
        let state = self.state.lock().await;
        state
            .active_profile_id
            .as_deref()
            .and_then(|id| find(&state, id))
            .or_else(|| state.profiles.first())
            .cloned()
            .ok_or(LauncherError::NoProfiles)
    }

    pub async fn set_active(&self, id: &str) -> LauncherResult<()> {
        let mut state = self.state.lock().await;
        if find(&state, id).is_none() {
            return Err(LauncherError::ProfileNotFound(id.to_string()));
        }

        state.active_profile_id = Some(id.to_string());
        self.persist(&state).await;
        Ok(())
    }

    /// Create a profile and its instance directory tree.
    ///
    /// Directory creation is best-effort: a failure is logged and the
    /// profile is kept; the tree is recreated on the next launch.
    pub async fn create(
        &self,
        name: &str,
        version: &str,
        loader: LoaderType,
        color: &str,
    ) -> LauncherResult<Profile> {
        validate_name(name)?;

        let profile = Profile::new(name.to_string(), version.to_string(), loader, color.to_string());
        let mut state = self.state.lock().await;

        let instance_dir = self.versions_dir.join(profile.dir_name());
        if let Err(e) = create_instance_tree(&instance_dir).await {
            warn!(
                "Could not create instance directory for '{}': {}",
                profile.name, e
            );
        }

        state.profiles.push(profile.clone());
        if state.profiles.len() == 1 || state.active_profile_id.is_none() {
            state.active_profile_id = Some(profile.id.clone());
        }
        self.persist(&state).await;

        info!("Created profile '{}' ({})", profile.name, profile.id);
        Ok(profile)
    }

    /// Apply the given fields. A name change tries to move the instance
    /// directory; when the target exists or the move fails the profile is
    /// still renamed and its files stay where they were.
    pub async fn update(&self, id: &str, update: ProfileUpdate) -> LauncherResult<ProfileUpdated> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }

        let mut state = self.state.lock().await;
        let index = state
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LauncherError::ProfileNotFound(id.to_string()))?;

        let old_dir = self.versions_dir.join(state.profiles[index].dir_name());
        let profile = &mut state.profiles[index];

        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(version) = update.version {
            profile.version = version;
        }
        if let Some(loader) = update.loader {
            profile.loader = loader;
        }
        if let Some(color) = update.color {
            profile.color = color;
        }

        let profile = profile.clone();
        let new_dir = self.versions_dir.join(profile.dir_name());
        let directory = if old_dir == new_dir {
            DirectoryRename::Unchanged
        } else {
            move_instance_dir(&old_dir, &new_dir).await
        };

        if let DirectoryRename::Skipped { reason } = &directory {
            warn!("Kept instance directory of '{}': {}", profile.name, reason);
        }

        self.persist(&state).await;
        debug!("Updated profile {}", profile.id);

        Ok(ProfileUpdated { profile, directory })
    }

    /// Remove a profile record. Returns `false` for the last profile or an
    /// unknown id. The instance directory is left on disk.
    pub async fn delete(&self, id: &str) -> bool {
        match self.try_delete(id).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Delete of {} rejected: {}", id, e);
                false
            }
        }
    }

    pub async fn try_delete(&self, id: &str) -> LauncherResult<()> {
        let mut state = self.state.lock().await;
        if state.profiles.len() <= 1 {
            return Err(LauncherError::LastProfile);
        }
        if find(&state, id).is_none() {
            return Err(LauncherError::ProfileNotFound(id.to_string()));
        }

        state.profiles.retain(|p| p.id != id);
        if state.active_profile_id.as_deref() == Some(id) {
            state.active_profile_id = state.profiles.first().map(|p| p.id.clone());
        }
        self.persist(&state).await;

        info!("Deleted profile {} (instance files kept)", id);
        Ok(())
    }

    /// Create `"<name> (Copy)"` with the same settings and copy the source
    /// instance's subdirectories into it. A subdirectory that fails to copy
    /// is logged and skipped.
    pub async fn duplicate(&self, id: &str) -> LauncherResult<Profile> {
        let source = self.get(id).await?;
        let source_dir = self.versions_dir.join(source.dir_name());

        let copy = self
            .create(
                &format!("{} (Copy)", source.name),
                &source.version,
                source.loader,
                &source.color,
            )
            .await?;
        let target_dir = self.versions_dir.join(copy.dir_name());

        if source_dir.exists() && source_dir != target_dir {
            let copied = tokio::task::spawn_blocking(move || {
                copy_instance_subdirs(&source_dir, &target_dir)
            })
            .await
            .map_err(|e| LauncherError::Other(format!("copy task failed: {e}")))?;
            debug!("Copied {} subdirectories into '{}'", copied, copy.name);
        }

        Ok(copy)
    }

    /// Instance directory derived from the profile's current name.
    /// Unknown ids fall back to `versions/<id>`.
    pub async fn instance_dir(&self, id: &str) -> PathBuf {
        let state = self.state.lock().await;
        match find(&state, id) {
            Some(profile) => self.versions_dir.join(profile.dir_name()),
            None => self.versions_dir.join(id),
        }
    }

    pub async fn mods_dir(&self, id: &str) -> PathBuf {
        self.instance_dir(id).await.join("mods")
    }

    /// Directory handed to the game as `--gameDir`. Same as the instance dir.
    pub async fn game_dir(&self, id: &str) -> PathBuf {
        self.instance_dir(id).await
    }

    /// Recreate a profile's directory tree if anything is missing.
    pub async fn ensure_instance_dirs(&self, id: &str) -> LauncherResult<PathBuf> {
        let profile = self.get(id).await?;
        let dir = self.versions_dir.join(profile.dir_name());
        create_instance_tree(&dir).await?;
        Ok(dir)
    }

    async fn persist(&self, state: &ProfilesDocument) {
        if let Err(e) = write_json_atomic(&self.profiles_path, state).await {
            warn!("Could not save profiles to {:?}: {}", self.profiles_path, e);
        }
    }
}

fn find<'a>(state: &'a ProfilesDocument, id: &str) -> Option<&'a Profile> {
    state.profiles.iter().find(|p| p.id == id)
}

fn validate_name(name: &str) -> LauncherResult<()> {
    if name.trim().is_empty() {
        return Err(LauncherError::Validation("profile name cannot be empty".into()));
    }
    Ok(())
}

async fn load_document(path: &Path) -> LauncherResult<ProfilesDocument> {
    match read_json_value(path).await? {
        Some(value) => serde_json::from_value(value).map_err(|source| {
            LauncherError::ConfigCorruption {
                path: path.to_path_buf(),
                source,
            }
        }),
        None => Ok(ProfilesDocument::default()),
    }
}

async fn back_up_unreadable(path: &Path) {
    if !path.exists() {
        return;
    }

    let backup = path.with_extension("json.bak");
    match tokio::fs::copy(path, &backup).await {
        Ok(_) => warn!("Unreadable profiles kept at {:?}", backup),
        Err(e) => warn!("Could not back up {:?}: {}", path, e),
    }
}

/// Point a stale active id at the first profile, or clear it.
fn repair_active_id(document: &mut ProfilesDocument) {
    let valid = document
        .active_profile_id
        .as_deref()
        .is_some_and(|id| find(&*document, id).is_some());
    if !valid {
        let first = document.profiles.first().map(|p| p.id.clone());
        if document.active_profile_id.is_some() {
            debug!("Active profile {:?} is gone, using {:?}", document.active_profile_id, first);
        }
        document.active_profile_id = first;
    }
}

async fn create_instance_tree(instance_dir: &Path) -> LauncherResult<()> {
    for subdir in INSTANCE_DIRS {
        let path = instance_dir.join(subdir);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| LauncherError::io(&path, source))?;
    }
    Ok(())
}

async fn move_instance_dir(old_dir: &Path, new_dir: &Path) -> DirectoryRename {
    if !old_dir.exists() {
        return DirectoryRename::Skipped {
            reason: format!("{:?} does not exist", old_dir),
        };
    }
    if new_dir.exists() {
        return DirectoryRename::Skipped {
            reason: format!("{:?} already exists", new_dir),
        };
    }

    match tokio::fs::rename(old_dir, new_dir).await {
        Ok(()) => DirectoryRename::Renamed {
            from: old_dir.to_path_buf(),
            to: new_dir.to_path_buf(),
        },
        Err(e) => DirectoryRename::Skipped {
            reason: format!("rename failed: {e}"),
        },
    }
}

fn copy_instance_subdirs(source_dir: &Path, target_dir: &Path) -> usize {
    let mut copied = 0;
    for subdir in INSTANCE_DIRS {
        let src = source_dir.join(subdir);
        if !src.exists() {
            continue;
        }
        match copy_dir_recursive(&src, &target_dir.join(subdir)) {
            Ok(()) => copied += 1,
            Err(e) => warn!("Error copying {}: {}", subdir, e),
        }
    }
    copied
}
