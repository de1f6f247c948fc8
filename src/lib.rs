//! Record touch and hardware-key input from a remote Android device.
//!
//! The device is reached through a [`shell::RemoteShell`] (adb or ssh).
//! [`Recorder`] discovers the touchscreen and key devices from
//! `getevent -p` output, streams `getevent`, and turns each frame into a
//! normalized [`DeviceInputEvent`].

pub mod config;
pub mod device;
pub mod error;
pub mod input;
pub mod mode;
pub mod recorder;
pub mod shell;

pub use device::Selection;
pub use error::{NotFound, RecorderError, Result, ShellError};
pub use input::{DeviceInputEvent, KeyAction, KeyCode, TouchAction};
pub use recorder::{Recorder, RecorderOptions, StopHandle};
pub use shell::RemoteShell;
