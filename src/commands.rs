// ─── Frontend commands ───
// Long-running operations the UI triggers. Each one runs as a background
// task; results and progress come back over channels.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::core::error::LauncherError;
use crate::core::instance::Profile;
use crate::core::launch::{GameProcess, LaunchConfiguration};
use crate::core::progress::{ProgressEvent, ProgressReporter};
use crate::core::state::AppState;
use crate::core::task::{spawn_task, TaskHandle};
use crate::core::version::VersionResolver;

/// A running task plus the progress it reports.
pub struct TrackedTask<T> {
    pub task: TaskHandle<T>,
    pub progress: UnboundedReceiver<ProgressEvent>,
}

/// Installable release versions for the version picker.
pub fn get_available_versions(state: &AppState) -> TaskHandle<Vec<String>> {
    let installer = state.installer.clone();
    spawn_task("list-available-versions", move |_| async move {
        installer.list_available().await
    })
}

pub fn get_installed_versions(state: &AppState) -> TaskHandle<Vec<String>> {
    let installer = state.installer.clone();
    spawn_task("list-installed-versions", move |_| async move {
        installer.list_installed().await
    })
}

/// Install whatever a profile needs without launching it.
pub fn install_profile(state: &AppState, profile_id: &str) -> TrackedTask<String> {
    let (reporter, progress) = ProgressReporter::channel();
    let instances = state.instances.clone();
    let resolver = VersionResolver::new(state.installer.clone());
    let profile_id = profile_id.to_string();

    let task = spawn_task("install-profile", move |cancel| async move {
        let profile = instances.get(&profile_id).await?;
        let id = resolver
            .resolve(&profile.version, profile.loader, &reporter, &cancel)
            .await?;
        reporter.report(format!("{} is ready", id), 100);
        Ok(id)
    });

    TrackedTask { task, progress }
}

/// Resolve, install and assemble the launch configuration for a profile.
pub fn launch_profile(
    state: &AppState,
    profile_id: &str,
    username: &str,
) -> TrackedTask<LaunchConfiguration> {
    let (reporter, progress) = ProgressReporter::channel();
    let orchestrator = state.orchestrator.clone();
    let profile_id = profile_id.to_string();
    let username = username.to_string();

    let task = spawn_task("launch-profile", move |cancel| async move {
        orchestrator
            .launch(&profile_id, &username, &reporter, &cancel)
            .await
    });

    TrackedTask { task, progress }
}

/// Launch a profile and start the game process.
pub fn play(state: &AppState, profile_id: &str, username: &str) -> TrackedTask<GameProcess> {
    let (reporter, progress) = ProgressReporter::channel();
    let orchestrator = state.orchestrator.clone();
    let runner = state.runner.clone();
    let profile_id = profile_id.to_string();
    let username = username.to_string();

    let task = spawn_task("play", move |cancel| async move {
        let config = orchestrator
            .launch(&profile_id, &username, &reporter, &cancel)
            .await?;
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        let process = runner.spawn(&config).await?;
        info!("Game started for profile {}", profile_id);
        Ok(process)
    });

    TrackedTask { task, progress }
}

pub fn duplicate_profile(state: &AppState, profile_id: &str) -> TaskHandle<Profile> {
    let instances = state.instances.clone();
    let profile_id = profile_id.to_string();
    spawn_task("duplicate-profile", move |_| async move {
        instances.duplicate(&profile_id).await
    })
}
