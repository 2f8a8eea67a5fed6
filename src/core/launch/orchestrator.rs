// ─── Launch Orchestrator ───
// Sequences profile lookup, version resolution and settings into a
// `LaunchConfiguration`. Owns no persistent state of its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::{LaunchConfiguration, ResolvedInstance};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::instance::{InstanceStore, ProfileUpdate};
use crate::core::progress::ProgressReporter;
use crate::core::settings::{SettingsPatch, SettingsStore};
use crate::core::version::VersionResolver;

pub struct LaunchOrchestrator {
    instances: Arc<InstanceStore>,
    settings: Arc<SettingsStore>,
    resolver: VersionResolver,
    launching: AtomicBool,
}

impl LaunchOrchestrator {
    pub fn new(
        instances: Arc<InstanceStore>,
        settings: Arc<SettingsStore>,
        resolver: VersionResolver,
    ) -> Self {
        Self {
            instances,
            settings,
            resolver,
            launching: AtomicBool::new(false),
        }
    }

    pub fn is_launching(&self) -> bool {
        self.launching.load(Ordering::Acquire)
    }

    /// Prepare everything needed to start `profile_id` as `username`.
    ///
    /// The username is validated first. After that only one launch runs at a
    /// time; a second call while one is in flight fails with
    /// `AlreadyLaunching`. On error nothing is persisted.
    pub async fn launch(
        &self,
        profile_id: &str,
        username: &str,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<LaunchConfiguration> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LauncherError::Validation("username cannot be empty".into()));
        }

        let _in_flight = InFlight::acquire(&self.launching)?;

        let profile = self.instances.get(profile_id).await?;
        let game_directory = self.instances.ensure_instance_dirs(&profile.id).await?;
        info!(
            "Launching '{}' ({} {}) for {}",
            profile.name, profile.version, profile.loader, username
        );

        let launch_version_id = self
            .resolver
            .resolve(&profile.version, profile.loader, progress, cancel)
            .await?;

        let settings = self.settings.read_or_default().await;
        let config = LaunchConfiguration::assemble(
            &profile.id,
            ResolvedInstance {
                launch_version_id,
                game_directory,
            },
            username,
            &settings,
        );

        // The launch is committed from here; persistence failures are logged only.
        if let Err(e) = self
            .instances
            .update(
                &profile.id,
                ProfileUpdate {
                    version: Some(profile.version.clone()),
                    loader: Some(profile.loader),
                    ..Default::default()
                },
            )
            .await
        {
            warn!("Could not record launched version on profile: {}", e);
        }
        if let Err(e) = self.instances.set_active(&profile.id).await {
            warn!("Could not mark profile active: {}", e);
        }
        if let Err(e) = self
            .settings
            .write(SettingsPatch {
                username: Some(username.to_string()),
                last_version: Some(profile.version.clone()),
                last_loader: Some(profile.loader.to_string()),
                active_profile_id: Some(profile.id.clone()),
                ..Default::default()
            })
            .await
        {
            warn!("Could not save launch settings: {}", e);
        }

        progress.report(format!("Launching {}...", config.version_id), 100);
        info!(
            "Launch configuration ready: {} with {:?}",
            config.version_id, config.jvm_args
        );
        Ok(config)
    }
}

/// Held for the duration of one launch.
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> LauncherResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LauncherError::AlreadyLaunching)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::sync::Notify;

    use super::*;
    use crate::core::installer::fake::FakeInstaller;
    use crate::core::instance::LoaderType;
    use crate::core::settings::Settings;

    struct Harness {
        _dir: tempfile::TempDir,
        game_root: PathBuf,
        instances: Arc<InstanceStore>,
        settings: Arc<SettingsStore>,
        installer: Arc<FakeInstaller>,
        orchestrator: Arc<LaunchOrchestrator>,
    }

    async fn harness(installer: FakeInstaller) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let game_root = dir.path().join(".minecraft");
        let instances =
            Arc::new(InstanceStore::open(dir.path().join("profiles.json"), &game_root).await);
        let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
        let installer = Arc::new(installer);
        let orchestrator = Arc::new(LaunchOrchestrator::new(
            instances.clone(),
            settings.clone(),
            VersionResolver::new(installer.clone()),
        ));

        Harness {
            _dir: dir,
            game_root,
            instances,
            settings,
            installer,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn empty_username_is_rejected_without_installer_calls() {
        let h = harness(FakeInstaller::default()).await;
        let profile = h.instances.active().await.unwrap();

        let err = h
            .orchestrator
            .launch(&profile.id, "   ", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Validation(_)));
        assert!(h.installer.calls().is_empty());
        assert_eq!(h.settings.read().await.unwrap(), Settings::default());
        assert!(!h.orchestrator.is_launching());
    }

    #[tokio::test]
    async fn unknown_profile_is_rejected() {
        let h = harness(FakeInstaller::default()).await;

        let err = h
            .orchestrator
            .launch("nope", "Steve", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::ProfileNotFound(_)));
        assert!(h.installer.calls().is_empty());
    }

    #[tokio::test]
    async fn fabric_launch_resolves_and_persists_settings() {
        let h = harness(FakeInstaller::with_installed(&["1.20.1"])).await;
        *h.installer.installed_after_loader.lock().unwrap() = Some(vec!["1.20.1-fabric".into()]);
        let profile = h
            .instances
            .create("Test", "1.20.1", LoaderType::Fabric, "#fff")
            .await
            .unwrap();
        h.settings
            .write(SettingsPatch {
                max_memory_mb: Some(3072),
                fullscreen: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();

        let (reporter, mut rx) = ProgressReporter::channel();
        let config = h
            .orchestrator
            .launch(&profile.id, "Steve", &reporter, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(config.version_id, "1.20.1-fabric");
        assert_eq!(config.username, "Steve");
        assert_eq!(config.jvm_args, vec!["-Xmx3072M"]);
        assert!(config.fullscreen);
        assert_eq!(config.game_directory, h.game_root.join("versions/Test"));

        let settings = h.settings.read().await.unwrap();
        assert_eq!(settings.username, "Steve");
        assert_eq!(settings.last_version, "1.20.1");
        assert_eq!(settings.last_loader, "Fabric");
        assert_eq!(settings.active_profile_id.as_deref(), Some(profile.id.as_str()));
        assert_eq!(settings.max_memory_mb, 3072);
        assert_eq!(h.instances.active().await.unwrap().id, profile.id);

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            assert!(event.percent == 0 || event.percent == 100);
            last = Some(event);
        }
        assert_eq!(last.unwrap().percent, 100);
    }

    #[tokio::test]
    async fn install_failure_aborts_without_persisting() {
        let installer = FakeInstaller::default();
        *installer.fail_base.lock().unwrap() = Some("disk full".into());
        let h = harness(installer).await;
        let profile = h.instances.active().await.unwrap();

        let err = h
            .orchestrator
            .launch(&profile.id, "Steve", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Install(ref m) if m == "disk full"));
        assert!(!h.settings.path().exists());
        assert!(!h.orchestrator.is_launching());
    }

    #[tokio::test]
    async fn second_launch_while_in_flight_fails_fast() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let installer = FakeInstaller {
            gate: Some((started.clone(), release.clone())),
            ..Default::default()
        };
        let h = harness(installer).await;
        let profile = h.instances.active().await.unwrap();

        let orchestrator = h.orchestrator.clone();
        let id = profile.id.clone();
        let first = tokio::spawn(async move {
            orchestrator
                .launch(&id, "Steve", &ProgressReporter::silent(), &CancellationToken::new())
                .await
        });

        started.notified().await;
        assert!(h.orchestrator.is_launching());
        let err = h
            .orchestrator
            .launch(&profile.id, "Alex", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::AlreadyLaunching));

        let err = h
            .orchestrator
            .launch(&profile.id, " ", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Validation(_)));
        assert!(h.orchestrator.is_launching());

        release.notify_one();
        let config = first.await.unwrap().unwrap();
        assert_eq!(config.username, "Steve");
        assert!(!h.orchestrator.is_launching());
    }

    #[tokio::test]
    async fn launch_recreates_missing_instance_directory() {
        let h = harness(FakeInstaller::with_installed(&["1.21.4"])).await;
        let profile = h.instances.active().await.unwrap();
        let dir = h.instances.game_dir(&profile.id).await;
        std::fs::remove_dir_all(&dir).unwrap();

        let config = h
            .orchestrator
            .launch(&profile.id, "Steve", &ProgressReporter::silent(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(config.game_directory, dir);
        assert!(dir.join("mods").is_dir());
    }
}
