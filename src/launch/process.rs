// ABOUTME: LaunchValidator that runs the real server binary as a child process.
// ABOUTME: Watches stdout for the ready regex, then stops the server via stdin or kill.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::oneshot;

use super::{LaunchError, LaunchOutcome, LaunchValidator};
use crate::config::LaunchConfig;

/// Spawns the configured server command inside the install directory.
#[derive(Debug, Clone)]
pub struct ProcessValidator {
    config: LaunchConfig,
}

impl ProcessValidator {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    fn resolve_command(&self, install_dir: &Path) -> PathBuf {
        if self.config.command.is_absolute() {
            self.config.command.clone()
        } else {
            install_dir.join(&self.config.command)
        }
    }

    /// Stop the server: polite stop command first, kill after the grace period.
    async fn terminate(&self, child: &mut Child) {
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }

        if let (Some(stop), Some(stdin)) = (&self.config.stop_command, child.stdin.as_mut()) {
            let line = format!("{stop}\n");
            if stdin.write_all(line.as_bytes()).await.is_ok() && stdin.flush().await.is_ok() {
                match tokio::time::timeout(self.config.stop_grace, child.wait()).await {
                    Ok(Ok(status)) => {
                        tracing::debug!("server stopped after stop command: {}", status);
                        return;
                    }
                    Ok(Err(e)) => tracing::warn!("failed waiting for server to stop: {}", e),
                    Err(_) => tracing::warn!(
                        "server ignored '{}' for {}s, killing",
                        stop,
                        self.config.stop_grace.as_secs()
                    ),
                }
            }
        }

        if let Err(e) = child.kill().await {
            tracing::warn!("failed to kill validation server: {}", e);
        }
    }
}

/// Read server output until it closes, signalling the first ready line.
///
/// Output is matched lossily and drained until the pipe closes, including
/// after ready while the server is being stopped.
async fn watch_output(
    stdout: ChildStdout,
    ready: Regex,
    start: Instant,
    ready_tx: oneshot::Sender<Duration>,
) {
    let mut reader = BufReader::new(stdout);
    let mut ready_tx = Some(ready_tx);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("stopped reading server output: {}", e);
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        tracing::trace!("server: {}", line);

        if ready_tx.is_some() && ready.is_match(line) {
            if let Some(tx) = ready_tx.take() {
                // Receiver is gone once the launch has timed out.
                let _ = tx.send(start.elapsed());
            }
        }
    }
}

#[async_trait]
impl LaunchValidator for ProcessValidator {
    async fn validate(
        &self,
        install_dir: &Path,
        timeout: Duration,
    ) -> Result<LaunchOutcome, LaunchError> {
        let command = self.resolve_command(install_dir);
        tracing::info!("launching {} for validation", command.display());

        let mut child = Command::new(&command)
            .args(&self.config.args)
            .envs(&self.config.env)
            .current_dir(install_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.clone(),
                source,
            })?;

        let start = Instant::now();
        let (ready_tx, ready_rx) = oneshot::channel();
        let ready = self.config.ready_pattern.clone();
        let drain = child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(watch_output(stdout, ready, start, ready_tx)));

        let watch = async {
            if let Ok(elapsed) = ready_rx.await {
                return LaunchOutcome::Ready { elapsed };
            }

            // Output closed without the ready line: judge by exit status.
            match child.wait().await {
                Ok(status) if status.success() => LaunchOutcome::ExitedEarly,
                Ok(status) => LaunchOutcome::Crashed {
                    code: status.code(),
                },
                Err(e) => {
                    tracing::warn!("failed to collect server exit status: {}", e);
                    LaunchOutcome::Crashed { code: None }
                }
            }
        };

        let outcome = match tokio::time::timeout(timeout, watch).await {
            Ok(outcome) => outcome,
            Err(_) => LaunchOutcome::TimedOut { after: timeout },
        };

        self.terminate(&mut child).await;
        if let Some(drain) = drain {
            drain.abort();
        }

        tracing::info!("validation launch: {}", outcome);
        Ok(outcome)
    }
}
