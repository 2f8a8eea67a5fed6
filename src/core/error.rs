use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt configuration at {path:?}: {source}")]
    ConfigCorruption {
        path: PathBuf,
        source: serde_json::Error,
    },

    // ── Validation ──────────────────────────────────────
    #[error("Invalid input: {0}")]
    Validation(String),

    // ── Profiles ────────────────────────────────────────
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Cannot delete the last remaining profile")]
    LastProfile,

    #[error("No profiles available")]
    NoProfiles,

    // ── Install / resolution ────────────────────────────
    #[error("Install failed: {0}")]
    Install(String),

    #[error("{loader} was installed for {base_version} but no matching version id was found")]
    LoaderResolution {
        loader: String,
        base_version: String,
    },

    // ── Launch ──────────────────────────────────────────
    #[error("A launch is already in progress")]
    AlreadyLaunching,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to start game process: {0}")]
    Spawn(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}
