// ─── Process Runner ───
// Spawns the game from a `LaunchConfiguration` and streams its output.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::LaunchConfiguration;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::installer::InstallerService;

/// One item of game output. `Exited` is always the last item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOutput {
    Stdout(String),
    Stderr(String),
    Exited(Option<i32>),
}

/// Handle to a running game.
pub struct GameProcess {
    pid: Option<u32>,
    output: mpsc::UnboundedReceiver<GameOutput>,
    kill: CancellationToken,
}

impl GameProcess {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next line or the exit code; `None` once the stream is drained.
    pub async fn next_output(&mut self) -> Option<GameOutput> {
        self.output.recv().await
    }

    pub fn kill(&self) {
        self.kill.cancel();
    }

    /// Drain output until exit, returning the exit code.
    pub async fn wait(mut self) -> Option<i32> {
        while let Some(item) = self.output.recv().await {
            if let GameOutput::Exited(code) = item {
                return code;
            }
        }
        None
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn spawn(&self, config: &LaunchConfiguration) -> LauncherResult<GameProcess>;
}

/// Runs the command line the installer builds for the resolved version.
pub struct CommandRunner {
    installer: Arc<dyn InstallerService>,
}

impl CommandRunner {
    pub fn new(installer: Arc<dyn InstallerService>) -> Self {
        Self { installer }
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn spawn(&self, config: &LaunchConfiguration) -> LauncherResult<GameProcess> {
        let mut args = self.installer.build_command(config).await?;
        if config.fullscreen {
            args.push("--fullscreen".into());
        }

        tokio::fs::create_dir_all(&config.game_directory)
            .await
            .map_err(|source| LauncherError::io(&config.game_directory, source))?;

        info!("Starting {} in {:?}", config.version_id, config.game_directory);
        spawn_command(&args, &config.game_directory)
    }
}

/// Spawn `args` (program first) in `working_dir` with piped output.
pub fn spawn_command(args: &[String], working_dir: &Path) -> LauncherResult<GameProcess> {
    let (program, rest) = args
        .split_first()
        .ok_or_else(|| LauncherError::Spawn("empty command line".into()))?;

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("Command (copy/paste): {}", format_command_for_logs(args));

    let mut child = cmd
        .spawn()
        .map_err(|e| LauncherError::Spawn(format!("{program}: {e}")))?;
    let pid = child.id();

    let (tx, rx) = mpsc::unbounded_channel();
    let stdout = child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward_lines(out, tx.clone(), GameOutput::Stdout)));
    let stderr = child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward_lines(err, tx.clone(), GameOutput::Stderr)));

    let kill = CancellationToken::new();
    let kill_requested = kill.clone();
    tokio::spawn(async move {
        let status = tokio::select! {
            status = child.wait() => status,
            _ = kill_requested.cancelled() => {
                info!("Killing game process {:?}", pid);
                if let Err(e) = child.kill().await {
                    warn!("Could not kill game process: {}", e);
                }
                child.wait().await
            }
        };

        for reader in [stdout, stderr].into_iter().flatten() {
            let _ = reader.await;
        }

        let code = match status {
            Ok(status) => status.code(),
            Err(e) => {
                warn!("Waiting for game process failed: {}", e);
                None
            }
        };
        info!("Game process exited with {:?}", code);
        let _ = tx.send(GameOutput::Exited(code));
    });

    Ok(GameProcess {
        pid,
        output: rx,
        kill,
    })
}

async fn forward_lines<R>(
    reader: R,
    tx: mpsc::UnboundedSender<GameOutput>,
    wrap: fn(String) -> GameOutput,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Game output stream closed: {}", e);
                break;
            }
        }
    }
}

fn format_command_for_logs(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
