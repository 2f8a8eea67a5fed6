use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::core::settings::Settings;

pub const LAUNCHER_NAME: &str = "QLauncher";
pub const LAUNCHER_VERSION: &str = "1.0";

/// Outcome of resolution for one launch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub launch_version_id: String,
    pub game_directory: PathBuf,
}

/// Everything the process runner needs to start the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchConfiguration {
    pub profile_id: String,
    pub version_id: String,
    pub username: String,
    /// Fresh per launch.
    pub session_id: String,
    pub access_token: String,
    pub launcher_name: String,
    pub launcher_version: String,
    pub jvm_args: Vec<String>,
    pub custom_resolution: bool,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Only set when the configured binary exists on disk.
    pub java_executable: Option<PathBuf>,
    pub game_directory: PathBuf,
}

impl LaunchConfiguration {
    pub fn assemble(
        profile_id: &str,
        resolved: ResolvedInstance,
        username: &str,
        settings: &Settings,
    ) -> Self {
        let java_executable = match &settings.java_path {
            Some(path) if path.exists() => Some(path.clone()),
            Some(path) => {
                warn!("Configured Java {:?} does not exist, using default", path);
                None
            }
            None => None,
        };

        Self {
            profile_id: profile_id.to_string(),
            version_id: resolved.launch_version_id,
            username: username.to_string(),
            session_id: Uuid::new_v4().to_string(),
            access_token: String::new(),
            launcher_name: LAUNCHER_NAME.to_string(),
            launcher_version: LAUNCHER_VERSION.to_string(),
            jvm_args: vec![memory_flag(settings.max_memory_mb)],
            custom_resolution: true,
            width: settings.width,
            height: settings.height,
            fullscreen: settings.fullscreen,
            java_executable,
            game_directory: resolved.game_directory,
        }
    }

    /// `--width`/`--height` game arguments for the custom resolution.
    pub fn resolution_args(&self) -> Vec<String> {
        if !self.custom_resolution {
            return Vec::new();
        }
        vec![
            "--width".into(),
            self.width.to_string(),
            "--height".into(),
            self.height.to_string(),
        ]
    }
}

/// JVM max-heap flag, e.g. `-Xmx2048M`.
pub fn memory_flag(max_memory_mb: u32) -> String {
    format!("-Xmx{}M", max_memory_mb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedInstance {
        ResolvedInstance {
            launch_version_id: "1.20.1".into(),
            game_directory: PathBuf::from("/games/versions/Test"),
        }
    }

    #[test]
    fn defaults_produce_standard_flags() {
        let config = LaunchConfiguration::assemble("abcd1234", resolved(), "Steve", &Settings::default());

        assert_eq!(config.jvm_args, vec!["-Xmx2048M"]);
        assert_eq!(config.resolution_args(), vec!["--width", "854", "--height", "480"]);
        assert!(!config.fullscreen);
        assert!(config.java_executable.is_none());
        assert_eq!(config.launcher_name, "QLauncher");
        assert_eq!(config.game_directory, PathBuf::from("/games/versions/Test"));
    }

    #[test]
    fn each_launch_gets_a_new_session() {
        let settings = Settings::default();
        let a = LaunchConfiguration::assemble("p", resolved(), "Steve", &settings);
        let b = LaunchConfiguration::assemble("p", resolved(), "Steve", &settings);

        assert_ne!(a.session_id, b.session_id);
        assert!(Uuid::parse_str(&a.session_id).is_ok());
    }

    #[test]
    fn java_override_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let java = dir.path().join("java");
        std::fs::write(&java, b"").unwrap();

        let mut settings = Settings {
            java_path: Some(java.clone()),
            max_memory_mb: 4096,
            ..Default::default()
        };
        let config = LaunchConfiguration::assemble("p", resolved(), "Alex", &settings);
        assert_eq!(config.java_executable, Some(java));
        assert_eq!(config.jvm_args, vec!["-Xmx4096M"]);

        settings.java_path = Some(dir.path().join("missing-java"));
        let config = LaunchConfiguration::assemble("p", resolved(), "Alex", &settings);
        assert!(config.java_executable.is_none());
    }
}
