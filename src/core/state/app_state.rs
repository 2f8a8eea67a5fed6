use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::core::installer::InstallerService;
use crate::core::instance::InstanceStore;
use crate::core::launch::{CommandRunner, LaunchOrchestrator, ProcessRunner};
use crate::core::settings::SettingsStore;
use crate::core::version::VersionResolver;

const APP_DIR_NAME: &str = "QLauncher";
const GAME_DIR_NAME: &str = ".minecraft";
const PROFILES_FILE: &str = "profiles.json";
const SETTINGS_FILE: &str = "settings.json";

/// Where the launcher keeps its own files and where the game lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Holds `profiles.json` and `settings.json`.
    pub app_dir: PathBuf,
    /// Game root; instances live under `versions/`.
    pub game_root: PathBuf,
}

impl AppPaths {
    pub fn new(app_dir: PathBuf, game_root: PathBuf) -> Self {
        Self { app_dir, game_root }
    }

    /// Platform data directory, e.g. `%APPDATA%` on Windows.
    pub fn from_system() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            app_dir: base.join(APP_DIR_NAME),
            game_root: base.join(GAME_DIR_NAME),
        }
    }

    pub fn profiles_file(&self) -> PathBuf {
        self.app_dir.join(PROFILES_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.app_dir.join(SETTINGS_FILE)
    }
}

/// Everything the frontend talks to, built once at startup.
pub struct AppState {
    pub paths: AppPaths,
    pub instances: Arc<InstanceStore>,
    pub settings: Arc<SettingsStore>,
    pub installer: Arc<dyn InstallerService>,
    pub orchestrator: Arc<LaunchOrchestrator>,
    pub runner: Arc<dyn ProcessRunner>,
}

impl AppState {
    pub async fn new(paths: AppPaths, installer: Arc<dyn InstallerService>) -> Self {
        let runner = Arc::new(CommandRunner::new(installer.clone()));
        Self::with_runner(paths, installer, runner).await
    }

    pub async fn with_runner(
        paths: AppPaths,
        installer: Arc<dyn InstallerService>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        info!(
            "Launcher data in {:?}, game root {:?}",
            paths.app_dir, paths.game_root
        );

        let instances = Arc::new(InstanceStore::open(paths.profiles_file(), &paths.game_root).await);
        let settings = Arc::new(SettingsStore::new(paths.settings_file()));
        let orchestrator = Arc::new(LaunchOrchestrator::new(
            instances.clone(),
            settings.clone(),
            VersionResolver::new(installer.clone()),
        ));

        Self {
            paths,
            instances,
            settings,
            installer,
            orchestrator,
            runner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::installer::fake::FakeInstaller;

    #[test]
    fn file_locations_derive_from_app_dir() {
        let paths = AppPaths::new(PathBuf::from("/data/QLauncher"), PathBuf::from("/data/.minecraft"));
        assert_eq!(paths.profiles_file(), PathBuf::from("/data/QLauncher/profiles.json"));
        assert_eq!(paths.settings_file(), PathBuf::from("/data/QLauncher/settings.json"));
    }

    #[test]
    fn system_paths_share_a_base() {
        let paths = AppPaths::from_system();
        assert!(paths.app_dir.ends_with("QLauncher"));
        assert!(paths.game_root.ends_with(".minecraft"));
        assert_eq!(paths.app_dir.parent(), paths.game_root.parent());
    }

    #[tokio::test]
    async fn new_state_has_a_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::new(dir.path().join("app"), dir.path().join("game"));

        let state = AppState::new(paths.clone(), Arc::new(FakeInstaller::default())).await;

        assert_eq!(state.instances.list().await.len(), 1);
        assert!(paths.profiles_file().exists());
        assert!(paths.game_root.join("versions/Default/config").is_dir());
    }
}
