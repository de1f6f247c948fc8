use std::io;

use thiserror::Error;

/// Failure of the remote command channel (adb or ssh).
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("ssh error: {0}")]
    Ssh(#[from] ssh2::Error),
    #[error("could not resolve host address `{0}`")]
    Resolve(String),
    #[error("ssh authentication failed")]
    AuthenticationFailed,
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },
}

/// Discovery found neither a touchscreen nor a hardware key source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no touch or key input device found")]
pub struct NotFound;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("device discovery failed: {0}")]
    DiscoveryFailed(#[from] NotFound),
    #[error("capability dump failed: {0}")]
    CapabilityDump(#[source] ShellError),
    #[error("failed to start event stream `{command}`: {source}")]
    StreamSpawnFailed {
        command: String,
        #[source]
        source: ShellError,
    },
    #[error("event stream read failed: {0}")]
    StreamRead(#[source] io::Error),
    #[error("event stream thread panicked")]
    SessionPanicked,
}

pub type Result<T, E = RecorderError> = std::result::Result<T, E>;
