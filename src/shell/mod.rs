//! Remote command execution on the device.
//!
//! The recorder only needs to run a one-shot command and to stream a
//! long-lived one, so that is all [`RemoteShell`] exposes.

mod adb;
mod ssh;

pub use adb::AdbShell;
pub use ssh::SshShell;

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::error::ShellError;

pub trait RemoteShell: Send + Sync {
    /// Run `command` to completion and return its standard output.
    fn run(&self, command: &str) -> Result<String, ShellError>;

    /// Start a long-lived `command` and hand back its output streams.
    fn spawn(&self, command: &str) -> Result<SpawnedCommand, ShellError>;
}

/// Asks a running remote command to exit. Safe to call more than once.
pub trait Terminate: Send + Sync {
    fn terminate(&self);
}

/// Output of a spawned command. The two streams are independent and may be
/// read from different threads.
pub struct SpawnedCommand {
    pub stdout: Box<dyn Read + Send>,
    pub stderr: Box<dyn Read + Send>,
    pub terminator: Arc<dyn Terminate>,
}

/// `Read` adapter over chunks delivered through a channel.
///
/// The stream ends when every sender is dropped.
pub struct ChannelReader {
    rx: Receiver<io::Result<Vec<u8>>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    pub fn new(rx: Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Ok(0),
            }
        }

        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Log every non-empty line of a command's error stream until it closes.
/// Returns the number of lines logged.
pub fn drain_stderr(stderr: Box<dyn Read + Send>) -> usize {
    let mut logged = 0;
    for line in BufReader::new(stderr).lines() {
        match line {
            Ok(line) if line.trim().is_empty() => {}
            Ok(line) => {
                log::warn!("[getevent] {}", line.trim_end());
                logged += 1;
            }
            Err(e) => {
                log::debug!("stderr closed: {}", e);
                break;
            }
        }
    }
    logged
}
