use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::installer::InstallerService;
use crate::core::instance::LoaderType;
use crate::core::progress::ProgressReporter;

/// Where a single resolution request currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Unresolved,
    VanillaInstalling,
    VanillaReady,
    LoaderInstalling,
    Resolved,
    Failed,
}

/// One resolution request: the states it went through, in order, and its
/// result. `states` starts at `Unresolved` and ends at `Resolved` or `Failed`.
#[derive(Debug)]
pub struct ResolveTrace {
    pub states: Vec<ResolveState>,
    pub result: LauncherResult<String>,
}

impl ResolveTrace {
    pub fn final_state(&self) -> ResolveState {
        self.states.last().copied().unwrap_or(ResolveState::Unresolved)
    }
}

/// Find the installed version id that carries `loader` for `base_version`.
///
/// An id qualifies when it contains both the loader's lowercase name and the
/// base version id. The first qualifying id in listing order wins. Forge
/// skips ids that belong to NeoForge, whose name contains `forge`.
pub fn find_loader_variant<'a>(
    installed: &'a [String],
    loader: LoaderType,
    base_version: &str,
) -> Option<&'a str> {
    if !loader.is_modded() {
        return None;
    }

    installed
        .iter()
        .map(String::as_str)
        .find(|id| {
            let lower = id.to_ascii_lowercase();
            if loader == LoaderType::Forge && lower.contains(LoaderType::NeoForge.slug()) {
                return false;
            }
            lower.contains(loader.slug()) && id.contains(base_version)
        })
}

/// Turns `(base version, loader)` into the version id to launch, installing
/// whatever is missing through the [`InstallerService`].
#[derive(Clone)]
pub struct VersionResolver {
    installer: Arc<dyn InstallerService>,
}

impl VersionResolver {
    pub fn new(installer: Arc<dyn InstallerService>) -> Self {
        Self { installer }
    }

    /// Resolve the launchable version id.
    ///
    /// Cancellation is checked between steps only: an install that has
    /// started always runs to completion.
    pub async fn resolve(
        &self,
        base_version: &str,
        loader: LoaderType,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<String> {
        self.resolve_traced(base_version, loader, progress, cancel)
            .await
            .result
    }

    /// Like [`resolve`](Self::resolve), also returning every state the
    /// request passed through.
    pub async fn resolve_traced(
        &self,
        base_version: &str,
        loader: LoaderType,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> ResolveTrace {
        let mut run = Resolution::new(base_version, loader);

        let result = match self.run(&mut run, progress, cancel).await {
            Ok(id) => {
                run.advance(ResolveState::Resolved);
                info!("Resolved {} ({}) to {}", base_version, loader, id);
                Ok(id)
            }
            Err(e) => {
                run.advance(ResolveState::Failed);
                warn!("Resolving {} ({}) failed: {}", base_version, loader, e);
                Err(e)
            }
        };

        ResolveTrace {
            states: run.states,
            result,
        }
    }

    async fn run(
        &self,
        run: &mut Resolution<'_>,
        progress: &ProgressReporter,
        cancel: &CancellationToken,
    ) -> LauncherResult<String> {
        let base_version = run.base_version;
        let loader = run.loader;

        let installed = self.list_installed().await?;
        if installed.iter().any(|id| id == base_version) {
            debug!("Version {} already installed", base_version);
        } else {
            check_cancelled(cancel)?;
            run.advance(ResolveState::VanillaInstalling);
            progress.report(format!("Installing Vanilla {}...", base_version), 0);
            self.installer
                .install_base(base_version, progress)
                .await
                .map_err(into_install_error)?;
        }
        run.advance(ResolveState::VanillaReady);

        if !loader.is_modded() {
            return Ok(base_version.to_string());
        }

        let installed = self.list_installed().await?;
        if let Some(existing) = find_loader_variant(&installed, loader, base_version) {
            debug!("{} version already installed: {}", loader, existing);
            return Ok(existing.to_string());
        }

        check_cancelled(cancel)?;
        run.advance(ResolveState::LoaderInstalling);
        progress.report(format!("Installing {} for {}...", loader, base_version), 0);
        let reported = self
            .installer
            .install_loader(loader, base_version, progress)
            .await
            .map_err(into_install_error)?;

        let installed = self.list_installed().await?;
        if let Some(id) = reported.filter(|id| installed.contains(id)) {
            return Ok(id);
        }

        find_loader_variant(&installed, loader, base_version)
            .map(str::to_owned)
            .ok_or_else(|| LauncherError::LoaderResolution {
                loader: loader.to_string(),
                base_version: base_version.to_string(),
            })
    }

    async fn list_installed(&self) -> LauncherResult<Vec<String>> {
        self.installer
            .list_installed()
            .await
            .map_err(into_install_error)
    }
}

struct Resolution<'a> {
    base_version: &'a str,
    loader: LoaderType,
    states: Vec<ResolveState>,
}

impl<'a> Resolution<'a> {
    fn new(base_version: &'a str, loader: LoaderType) -> Self {
        Self {
            base_version,
            loader,
            states: vec![ResolveState::Unresolved],
        }
    }

    fn advance(&mut self, next: ResolveState) {
        debug!(
            "Resolve {} ({}): {:?} -> {:?}",
            self.base_version,
            self.loader,
            self.states.last(),
            next
        );
        self.states.push(next);
    }
}

fn check_cancelled(cancel: &CancellationToken) -> LauncherResult<()> {
    if cancel.is_cancelled() {
        return Err(LauncherError::Cancelled);
    }
    Ok(())
}

/// Installer failures keep their message but always surface as `Install`.
fn into_install_error(error: LauncherError) -> LauncherError {
    match error {
        e @ (LauncherError::Install(_) | LauncherError::Cancelled) => e,
        other => LauncherError::Install(other.to_string()),
    }
}
