use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

use crate::error::ShellError;

use super::{RemoteShell, SpawnedCommand, Terminate};

/// Runs commands through `adb shell` on a local child process.
#[derive(Debug, Clone)]
pub struct AdbShell {
    adb: PathBuf,
    serial: Option<String>,
}

impl AdbShell {
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial,
        }
    }

    fn command(&self, remote: &str) -> Command {
        let mut cmd = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.arg("shell").arg(remote);
        cmd
    }
}

impl RemoteShell for AdbShell {
    fn run(&self, command: &str) -> Result<String, ShellError> {
        log::debug!("Executing: adb shell {}", command);
        let output = self.command(command).stdin(Stdio::null()).output()?;

        if !output.status.success() {
            return Err(ShellError::CommandFailed {
                command: command.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, command: &str) -> Result<SpawnedCommand, ShellError> {
        log::debug!("Spawning: adb shell {}", command);
        let mut child = self
            .command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        Ok(SpawnedCommand {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            terminator: Arc::new(ChildTerminator {
                child: Mutex::new(Some(child)),
            }),
        })
    }
}

fn missing_pipe(name: &str) -> ShellError {
    ShellError::Io(std::io::Error::other(format!("adb {} was not captured", name)))
}

/// Killing the local adb client closes the shell session, which hangs up the
/// remote command.
struct ChildTerminator {
    child: Mutex<Option<Child>>,
}

impl Terminate for ChildTerminator {
    fn terminate(&self) {
        let Ok(mut guard) = self.child.lock() else {
            return;
        };
        let Some(mut child) = guard.take() else {
            return;
        };

        if let Err(e) = child.kill() {
            log::debug!("adb already exited: {}", e);
        }
        match child.wait() {
            Ok(status) => log::debug!("adb exited with {}", status),
            Err(e) => log::warn!("Failed to reap adb: {}", e),
        }
    }
}

impl Drop for ChildTerminator {
    fn drop(&mut self) {
        self.terminate();
    }
}
