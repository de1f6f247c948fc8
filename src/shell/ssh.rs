use std::io::{self, ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ssh2::{Channel, Session};

use crate::config::Auth;
use crate::error::ShellError;

use super::{ChannelReader, RemoteShell, SpawnedCommand, Terminate};

/// Timeout for SSH operations
const SSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle wait of the stream pump when neither stream has data
const PUMP_IDLE: Duration = Duration::from_millis(2);

const PUMP_CHUNK: usize = 4096;

/// Runs commands over SSH (e.g. a rooted device running sshd).
///
/// Every command gets its own session so a long-lived stream can be switched
/// to non-blocking mode without affecting anything else.
#[derive(Clone)]
pub struct SshShell {
    host: String,
    port: u16,
    user: String,
    auth: Auth,
}

impl SshShell {
    pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>, auth: Auth) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            auth,
        }
    }

    fn connect_and_authenticate(&self) -> Result<Session, ShellError> {
        log::info!("Connecting to {}:{}", self.host, self.port);
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| ShellError::Resolve(self.host.clone()))?;
        let tcp = TcpStream::connect_timeout(&addr, SSH_TIMEOUT)?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.set_timeout(SSH_TIMEOUT.as_millis() as u32);
        session.handshake()?;
        self.authenticate(&session)?;
        // Streams may stay quiet for a long time; only the handshake is bounded.
        session.set_timeout(0);

        Ok(session)
    }

    fn authenticate(&self, session: &Session) -> Result<(), ShellError> {
        match &self.auth {
            Auth::Key(path) => {
                session.userauth_pubkey_file(&self.user, None, path.as_ref(), None)?;
            }
            Auth::Password(pass) => {
                session.userauth_password(&self.user, pass)?;
            }
        }

        if !session.authenticated() {
            return Err(ShellError::AuthenticationFailed);
        }

        Ok(())
    }
}

impl RemoteShell for SshShell {
    fn run(&self, command: &str) -> Result<String, ShellError> {
        let session = self.connect_and_authenticate()?;
        let mut channel = session.channel_session()?;
        log::debug!("Executing: {}", command);
        channel.exec(command)?;

        let mut output = String::new();
        channel.read_to_string(&mut output)?;
        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;
        channel.close()?;
        channel.wait_close()?;

        let status = channel.exit_status()?;
        if status != 0 {
            return Err(ShellError::CommandFailed {
                command: command.to_string(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output)
    }

    fn spawn(&self, command: &str) -> Result<SpawnedCommand, ShellError> {
        let session = self.connect_and_authenticate()?;
        let mut channel = session.channel_session()?;
        log::debug!("Executing: {}", command);
        channel.exec(command)?;
        session.set_blocking(false);

        let stop = Arc::new(AtomicBool::new(false));
        let (out_tx, out_rx) = mpsc::channel();
        let (err_tx, err_rx) = mpsc::channel();

        let pump_stop = stop.clone();
        thread::spawn(move || {
            pump(&mut channel, &pump_stop, &out_tx, &err_tx);
            if let Err(e) = channel.close() {
                log::debug!("SSH channel close failed: {}", e);
            }
            drop(session);
            log::debug!("SSH stream pump finished");
        });

        log::info!("Stream ready for `{}`", command);
        Ok(SpawnedCommand {
            stdout: Box::new(ChannelReader::new(out_rx)),
            stderr: Box::new(ChannelReader::new(err_rx)),
            terminator: Arc::new(StopFlag(stop)),
        })
    }
}

struct StopFlag(Arc<AtomicBool>);

impl Terminate for StopFlag {
    fn terminate(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Outcome of polling one stream of a non-blocking channel.
enum Poll {
    Data,
    Idle,
    Eof,
    Failed,
}

fn poll_stream(stream: &mut impl Read, buf: &mut [u8], tx: &Sender<io::Result<Vec<u8>>>) -> Poll {
    match stream.read(buf) {
        Ok(0) => Poll::Eof,
        Ok(n) => {
            // A dropped reader just means nobody listens to this stream anymore.
            let _ = tx.send(Ok(buf[..n].to_vec()));
            Poll::Data
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
            Poll::Idle
        }
        Err(e) => {
            let _ = tx.send(Err(e));
            Poll::Failed
        }
    }
}

/// Move stdout and stderr of `channel` into their readers until the remote
/// command exits, the channel fails, or the stop flag is raised.
fn pump(
    channel: &mut Channel,
    stop: &AtomicBool,
    out_tx: &Sender<io::Result<Vec<u8>>>,
    err_tx: &Sender<io::Result<Vec<u8>>>,
) {
    let mut buf = [0u8; PUMP_CHUNK];
    let mut stderr = channel.stderr();
    let mut stderr_open = true;

    while !stop.load(Ordering::Acquire) {
        let out = poll_stream(channel, &mut buf, out_tx);
        let err = if stderr_open {
            poll_stream(&mut stderr, &mut buf, err_tx)
        } else {
            Poll::Idle
        };

        match (out, err) {
            (Poll::Failed, _) => return,
            (Poll::Eof, _) if channel.eof() => return,
            (_, Poll::Eof | Poll::Failed) => stderr_open = false,
            (Poll::Data, _) | (_, Poll::Data) => {}
            _ => thread::sleep(PUMP_IDLE),
        }
    }
}
