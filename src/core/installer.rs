// ─── Installer Service ───
// Boundary to the component that downloads and installs game versions and
// loaders. The launcher core only decides *what* to install; how manifests
// are parsed and artifacts verified lives behind this trait.

use async_trait::async_trait;

use crate::core::error::LauncherResult;
use crate::core::instance::LoaderType;
use crate::core::launch::LaunchConfiguration;
use crate::core::progress::ProgressReporter;

#[async_trait]
pub trait InstallerService: Send + Sync {
    /// Release version ids that can be installed.
    async fn list_available(&self) -> LauncherResult<Vec<String>>;

    /// Version ids present in the game root, in listing order.
    async fn list_installed(&self) -> LauncherResult<Vec<String>>;

    /// Install a base game version, reporting `(status, progress)` as it goes.
    async fn install_base(&self, version_id: &str, progress: &ProgressReporter)
        -> LauncherResult<()>;

    /// Install `loader` on top of `base_version`. Returns the installed
    /// version id when the installer knows it.
    async fn install_loader(
        &self,
        loader: LoaderType,
        base_version: &str,
        progress: &ProgressReporter,
    ) -> LauncherResult<Option<String>>;

    /// Full command line (program first) that starts the resolved version
    /// with the given configuration.
    async fn build_command(&self, config: &LaunchConfiguration) -> LauncherResult<Vec<String>>;
}
