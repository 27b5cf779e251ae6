//! Replica distribution through an rsync daemon.
//!
//! The daemon is launched once when the service starts and serves the
//! published indexes according to its own configuration file. `rsync --daemon`
//! detaches by itself, so starting it only waits for the launcher to exit;
//! build cycles never wait on it.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("rsync binary not found: {0}")]
    NotFound(String),

    #[error("rsync config {0} does not exist")]
    MissingConfig(PathBuf),

    #[error("failed to launch rsync daemon: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("rsync daemon exited with {0}")]
    Exit(String),
}

#[derive(Debug, Clone)]
pub struct SyncDaemon {
    rsync: PathBuf,
    config: PathBuf,
}

impl SyncDaemon {
    pub fn new(rsync: impl Into<PathBuf>, config: impl Into<PathBuf>) -> Self {
        Self {
            rsync: rsync.into(),
            config: config.into(),
        }
    }

    pub fn config(&self) -> &Path {
        &self.config
    }

    /// Resolve the rsync binary (bare names go through `PATH`).
    pub fn resolve_binary(&self) -> Result<PathBuf, SyncError> {
        which::which(&self.rsync).map_err(|e| SyncError::NotFound(format!("{}: {e}", self.rsync.display())))
    }

    /// `rsync --config=<config> --daemon`.
    pub fn command(&self, rsync: &Path) -> Command {
        let mut cmd = Command::new(rsync);
        cmd.arg(format!("--config={}", self.config.display()))
            .arg("--daemon");
        cmd
    }

    /// Launch the daemon. Returns once rsync has detached.
    pub fn start(&self) -> Result<(), SyncError> {
        if !self.config.is_file() {
            return Err(SyncError::MissingConfig(self.config.clone()));
        }
        let rsync = self.resolve_binary()?;
        let status = self.command(&rsync).status()?;
        if !status.success() {
            return Err(SyncError::Exit(status.to_string()));
        }
        info!(rsync = %rsync.display(), config = %self.config.display(), "sync_daemon_started");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn command_passes_config_then_daemon_flag() {
        let daemon = SyncDaemon::new("rsync", "/etc/rsyncd.conf");
        let cmd = daemon.command(Path::new("/usr/bin/rsync"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["--config=/etc/rsyncd.conf", "--daemon"]);
        assert_eq!(cmd.get_program(), "/usr/bin/rsync");
    }

    #[test]
    fn missing_config_is_reported_before_launch() {
        let tmp = TempDir::new().unwrap();
        let daemon = SyncDaemon::new("rsync", tmp.path().join("rsyncd.conf"));
        assert!(matches!(daemon.start(), Err(SyncError::MissingConfig(_))));
    }

    #[test]
    fn missing_binary_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("rsyncd.conf");
        std::fs::write(&config, "[indexes]\npath = /tmp\n").unwrap();
        let daemon = SyncDaemon::new(tmp.path().join("no-such-rsync"), &config);
        assert!(matches!(daemon.start(), Err(SyncError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn launcher_exit_status_is_checked() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("rsyncd.conf");
        std::fs::write(&config, "").unwrap();
        assert!(SyncDaemon::new("true", &config).start().is_ok());
        assert!(matches!(
            SyncDaemon::new("false", &config).start(),
            Err(SyncError::Exit(_))
        ));
    }
}
