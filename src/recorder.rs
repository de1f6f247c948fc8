//! Recording session lifecycle: discovery, stream spawn, read loop, stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::device::{self, Selection};
use crate::error::{RecorderError, Result};
use crate::input::{run_stream, DeviceInputEvent, EventStreamParser};
use crate::mode::StreamMode;
use crate::shell::{drain_stderr, RemoteShell, Terminate};

/// Commands and discovery policy for a [`Recorder`].
#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// `getevent` binary on the device.
    pub getevent: String,
    /// Ask `getevent` for symbolic labels (`-l`) instead of hex codes.
    pub labels: bool,
    pub mode: StreamMode,
    /// Keep the first discovery result for later sessions.
    pub reuse_discovery: bool,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            getevent: "getevent".into(),
            labels: true,
            mode: StreamMode::Multi,
            reuse_discovery: false,
        }
    }
}

impl RecorderOptions {
    pub fn capability_command(&self) -> String {
        if self.labels {
            format!("{} -pl", self.getevent)
        } else {
            format!("{} -p", self.getevent)
        }
    }

    pub fn stream_command(&self, selection: &Selection) -> String {
        let mut cmd = self.getevent.clone();
        if self.labels {
            cmd.push_str(" -l");
        }
        if self.mode == StreamMode::Single {
            if let Some(path) = selection.monitored_path() {
                cmd.push(' ');
                cmd.push_str(path);
            }
        }
        cmd
    }
}

/// Requests the end of a running session from any thread.
///
/// Stopping raises the cancellation flag first and then terminates the
/// remote command; the read loop notices on its next wake-up.
#[derive(Clone)]
pub struct StopHandle {
    cancelled: Arc<AtomicBool>,
    terminator: Arc<dyn Terminate>,
}

impl StopHandle {
    pub fn stop(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            log::info!("Stopping event stream");
            self.terminator.terminate();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

struct ActiveSession {
    handle: StopHandle,
    reader: JoinHandle<Result<()>>,
}

impl ActiveSession {
    fn join(self) -> Result<()> {
        self.reader.join().map_err(|_| RecorderError::SessionPanicked)?
    }
}

/// Records normalized input events from one remote device.
///
/// A recorder runs at most one session at a time. Events are delivered to
/// the callback on the session's reader thread, in stream order.
pub struct Recorder {
    shell: Arc<dyn RemoteShell>,
    options: RecorderOptions,
    selection: Option<Selection>,
    session: Option<ActiveSession>,
}

impl Recorder {
    pub fn new(shell: Arc<dyn RemoteShell>, options: RecorderOptions) -> Self {
        Self {
            shell,
            options,
            selection: None,
            session: None,
        }
    }

    /// Devices chosen by the most recent discovery.
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn discover(&mut self) -> Result<&Selection> {
        let command = self.options.capability_command();
        let selection = device::discover(self.shell.as_ref(), &command)?;
        Ok(self.selection.insert(selection))
    }

    /// Start a session delivering events to `on_event`.
    ///
    /// Fails before anything is streamed if no usable device is found or the
    /// stream command cannot be started. Calling `start` while a session is
    /// running returns that session's handle and ignores `on_event`.
    pub fn start<F>(&mut self, on_event: F) -> Result<StopHandle>
    where
        F: FnMut(DeviceInputEvent) + Send + 'static,
    {
        if let Some(session) = &self.session {
            if !session.reader.is_finished() {
                log::debug!("Recorder already running");
                return Ok(session.handle.clone());
            }
        }
        if let Some(previous) = self.session.take() {
            if let Err(e) = previous.join() {
                log::warn!("Previous session ended with error: {}", e);
            }
        }

        let cached = if self.options.reuse_discovery {
            self.selection.clone()
        } else {
            None
        };
        let selection = match cached {
            Some(selection) => selection,
            None => self.discover()?.clone(),
        };

        let command = self.options.stream_command(&selection);
        if self.options.mode == StreamMode::Single {
            warn_unmonitored(&selection);
        }

        log::debug!("Executing: {}", command);
        let spawned = self
            .shell
            .spawn(&command)
            .map_err(|source| RecorderError::StreamSpawnFailed {
                command: command.clone(),
                source,
            })?;
        log::info!("Event stream ready ({})", command);

        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = StopHandle {
            cancelled: cancelled.clone(),
            terminator: spawned.terminator,
        };

        let stderr = spawned.stderr;
        thread::spawn(move || drain_stderr(stderr));

        let mut stdout = spawned.stdout;
        let mut parser = EventStreamParser::for_selection(&selection);
        let mut on_event = on_event;
        let reader = thread::spawn(move || {
            let result = run_stream(&mut *stdout, &mut parser, &cancelled, &mut on_event);
            if let Err(e) = &result {
                log::error!("{}", e);
            }
            result
        });

        self.session = Some(ActiveSession {
            handle: handle.clone(),
            reader,
        });
        Ok(handle)
    }

    /// Request the running session to stop. Returns immediately.
    pub fn stop(&self) {
        if let Some(session) = &self.session {
            session.handle.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.reader.is_finished())
    }

    /// Block until the current session ends and report how it ended.
    pub fn wait(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.join(),
            None => Ok(()),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn warn_unmonitored(selection: &Selection) {
    let monitored = selection.monitored_path();
    let skipped: Vec<&str> = selection
        .key_devices
        .iter()
        .map(String::as_str)
        .filter(|p| Some(*p) != monitored)
        .collect();
    if !skipped.is_empty() {
        log::warn!(
            "Single-device mode only streams {}; ignoring {}",
            monitored.unwrap_or("?"),
            skipped.join(", ")
        );
    }
}
