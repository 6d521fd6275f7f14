//! PTY process control via portable-pty.
//!
//! Owns the master/slave pair and the spawned child. The session layer
//! takes the reader, writer and child handle; resize stays here because it
//! is a master-side ioctl.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tracing::info;

/// Configuration for spawning a PTY-attached child process.
#[derive(Debug, Clone)]
pub struct PtyProcessConfig {
    /// Command and arguments, e.g. `["claude", "--add-dir", "."]`
    pub command: Vec<String>,
    /// Working directory for the child (inherited when `None`)
    pub cwd: Option<PathBuf>,
    /// Environment variables to add or override
    pub env: Option<HashMap<String, String>>,
    pub cols: u16,
    pub rows: u16,
}

impl Default for PtyProcessConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            cwd: None,
            env: None,
            cols: 120,
            rows: 30,
        }
    }
}

/// A child process attached to a PTY.
pub struct PtyProcess {
    master: Box<dyn MasterPty + Send>,
    child: Option<Box<dyn Child + Send + Sync>>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
}

impl PtyProcess {
    /// Open a PTY pair and spawn the configured command on the slave side.
    pub fn spawn(config: &PtyProcessConfig) -> Result<Self> {
        if config.command.is_empty() {
            return Err(anyhow!("command must not be empty"));
        }
        if config.cols == 0 || config.rows == 0 {
            return Err(anyhow!(
                "cols/rows must be positive, got {}x{}",
                config.cols,
                config.rows
            ));
        }

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("openpty failed")?;

        let mut cmd = CommandBuilder::new(&config.command[0]);
        cmd.args(&config.command[1..]);
        if let Some(ref cwd) = config.cwd {
            cmd.cwd(cwd);
        }
        // CommandBuilder starts from an empty environment; copy the
        // parent's so PATH and locale survive, then apply overrides.
        for (key, value) in std::env::vars() {
            cmd.env(key, value);
        }
        cmd.env("TERM", "xterm-256color");
        if let Some(ref extra) = config.env {
            for (key, value) in extra {
                cmd.env(key, value);
            }
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("failed to spawn {:?}", config.command[0]))?;
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();
        info!(pid, command = %config.command.join(" "), "pty child spawned");

        Ok(Self {
            master: pair.master,
            child: Some(child),
            killer,
            pid,
        })
    }

    /// Clone the PTY output reader. Reads block; run them on a dedicated
    /// thread.
    pub fn take_reader(&self) -> Result<Box<dyn Read + Send>> {
        self.master.try_clone_reader().context("clone pty reader")
    }

    /// Take the PTY input writer. May only be taken once.
    pub fn take_writer(&self) -> Result<Box<dyn Write + Send>> {
        self.master.take_writer().context("take pty writer")
    }

    /// Take the child handle for exit monitoring. May only be taken once.
    pub fn take_child(&mut self) -> Option<Box<dyn Child + Send + Sync>> {
        self.child.take()
    }

    /// Resize the PTY (master-side ioctl). The terminal model is resized
    /// separately by the session worker.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        if cols == 0 || rows == 0 {
            return Err(anyhow!("cols/rows must be positive, got {cols}x{rows}"));
        }
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("pty resize")
    }

    /// Forcibly terminate the child.
    pub fn kill(&mut self) -> Result<()> {
        self.killer.kill().context("kill pty child")
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_command() {
        let config = PtyProcessConfig::default();
        assert!(PtyProcess::spawn(&config).is_err());
    }

    #[test]
    fn rejects_zero_geometry() {
        let config = PtyProcessConfig {
            command: vec!["true".to_string()],
            cols: 0,
            ..Default::default()
        };
        assert!(PtyProcess::spawn(&config).is_err());
    }
}
