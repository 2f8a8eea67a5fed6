pub mod config;
pub mod orchestrator;
pub mod runner;

pub use config::{LaunchConfiguration, ResolvedInstance};
pub use orchestrator::LaunchOrchestrator;
pub use runner::{CommandRunner, GameOutput, GameProcess, ProcessRunner};
