// ─── QLauncher Core ───
// Profile-based launcher orchestration.
//
// Architecture:
//   core/
//     instance/  : Profiles, active selection, per-profile instance dirs
//     settings/  : Launcher settings document with merge-on-write
//     version/   : Resolves (version, loader) to a launchable version id
//     launch/    : Launch configuration, orchestrator, process runner
//     installer  : Boundary to the external installer service
//     task       : Background task submission with cancellation
//     progress   : Progress events over a channel
//     state/     : Application wiring and paths

pub mod error;
pub mod fs;
pub mod installer;
pub mod instance;
pub mod launch;
pub mod progress;
pub mod settings;
pub mod state;
pub mod task;
pub mod version;
