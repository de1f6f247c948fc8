mod event;
mod frame;
mod line;
mod stream;

pub use event::{DeviceInputEvent, EventKind, KeyAction, KeyCode, TouchAction};
pub use frame::TouchFrame;
pub use line::{split_device, tokenize, RawEvent};
pub use stream::{run_stream, DeviceFilter, EventStreamParser, LineBuffer};
