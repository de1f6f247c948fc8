//! Incremental decoding of the `getevent` byte stream.

use std::collections::BTreeSet;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::device::{Calibration, Selection};
use crate::error::RecorderError;

use super::event::{DeviceInputEvent, EventKind, KeyAction, KeyCode};
use super::frame::TouchFrame;
use super::line::{split_device, tokenize, RawEvent};

const READ_CHUNK: usize = 4096;

/// Holds the incomplete tail of the stream between reads.
///
/// Bytes are only decoded once a full line is present, so neither lines nor
/// multi-byte characters are torn by transport chunking.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and call `on_line` for every line it completes.
    pub fn push(&mut self, chunk: &[u8], mut on_line: impl FnMut(&str)) {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return;
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        for line in complete[..last_newline].split(|&b| b == b'\n') {
            on_line(&String::from_utf8_lossy(line));
        }
    }

    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

/// Which parts of the recorder a line is relevant to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Source {
    touch: bool,
    key: bool,
}

/// Routes lines to the touch frame machine and/or key handling by device path.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    touch: Option<String>,
    keys: BTreeSet<String>,
}

impl DeviceFilter {
    pub fn new(touch: Option<String>, keys: BTreeSet<String>) -> Self {
        Self { touch, keys }
    }

    /// Lines without a path prefix come from a single-device stream and are
    /// attributed to the monitored device: the touchscreen if there is one,
    /// otherwise a key device.
    fn classify(&self, device: Option<&str>) -> Option<Source> {
        let Some(path) = device else {
            return Some(Source {
                touch: self.touch.is_some(),
                key: match &self.touch {
                    Some(touch) => self.keys.contains(touch),
                    None => true,
                },
            });
        };

        let source = Source {
            touch: self.touch.as_deref() == Some(path),
            key: self.keys.contains(path),
        };
        (source.touch || source.key).then_some(source)
    }
}

/// Turns `getevent` output into [`DeviceInputEvent`]s.
#[derive(Debug)]
pub struct EventStreamParser {
    buffer: LineBuffer,
    filter: DeviceFilter,
    calibration: Calibration,
    frame: TouchFrame,
}

impl EventStreamParser {
    pub fn new(filter: DeviceFilter, calibration: Calibration) -> Self {
        Self {
            buffer: LineBuffer::new(),
            filter,
            calibration,
            frame: TouchFrame::new(),
        }
    }

    pub fn for_selection(selection: &Selection) -> Self {
        let touch = selection.touch.as_ref();
        let filter = DeviceFilter::new(touch.map(|t| t.path.clone()), selection.key_devices.clone());
        let calibration = touch.map(|t| t.calibration).unwrap_or_default();
        Self::new(filter, calibration)
    }

    /// Feed one chunk of stream output. Events are delivered in stream order.
    pub fn feed(&mut self, chunk: &[u8], emit: &mut dyn FnMut(DeviceInputEvent)) {
        let Self {
            buffer,
            filter,
            calibration,
            frame,
        } = self;

        buffer.push(chunk, |line| {
            if let Some(ev) = handle_line(filter, calibration, frame, line) {
                emit(ev);
            }
        });
    }

    /// Bytes of an incomplete trailing line still waiting for a newline.
    pub fn pending(&self) -> &[u8] {
        self.buffer.pending()
    }
}

fn handle_line(
    filter: &DeviceFilter,
    calibration: &Calibration,
    frame: &mut TouchFrame,
    line: &str,
) -> Option<DeviceInputEvent> {
    let (device, body) = split_device(line);
    let source = filter.classify(device)?;
    let ev = tokenize(body)?;

    if source.key {
        if let Some(key) = key_event(ev) {
            return Some(key);
        }
    }

    if source.touch {
        return frame.apply(ev, calibration);
    }

    None
}

fn key_event(ev: RawEvent) -> Option<DeviceInputEvent> {
    if ev.kind != EventKind::Key {
        return None;
    }
    let key_code = KeyCode::from_raw(ev.code)?;
    let key_action = match ev.value {
        1 => KeyAction::Down,
        0 => KeyAction::Up,
        _ => return None,
    };
    Some(DeviceInputEvent::Key {
        key_code,
        key_action,
    })
}

/// Read `reader` until it ends or `cancelled` is raised, feeding `parser`.
///
/// A read error is returned unless cancellation was already requested, in
/// which case it is the expected result of terminating the remote command.
pub fn run_stream(
    reader: &mut dyn Read,
    parser: &mut EventStreamParser,
    cancelled: &AtomicBool,
    on_event: &mut dyn FnMut(DeviceInputEvent),
) -> Result<(), RecorderError> {
    let mut buf = [0u8; READ_CHUNK];
    let mut emitted: u64 = 0;
    let mut emit = |ev: DeviceInputEvent| {
        if emitted == 0 {
            log::info!("Input events flowing");
        }
        emitted += 1;
        if emitted % 500 == 0 {
            log::debug!("Input events emitted: {}", emitted);
        }
        on_event(ev);
    };

    loop {
        if cancelled.load(Ordering::Acquire) {
            log::debug!("Event stream cancelled");
            return Ok(());
        }

        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if cancelled.load(Ordering::Acquire) => {
                log::debug!("Ignoring read error after stop: {}", e);
                return Ok(());
            }
            Err(e) => return Err(RecorderError::StreamRead(e)),
        };

        if cancelled.load(Ordering::Acquire) {
            log::debug!("Event stream cancelled, dropping {} bytes", n);
            return Ok(());
        }

        parser.feed(&buf[..n], &mut emit);
    }

    if !parser.pending().is_empty() {
        log::debug!("Discarding {} bytes of incomplete line at end of stream", parser.pending().len());
    }
    log::info!("Event stream closed");
    Ok(())
}
