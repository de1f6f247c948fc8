//! Kernel input event codes and the normalized events handed to consumers.

use evdevil::event::{Abs, Key};
use serde::{Deserialize, Serialize};

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const SYN_REPORT: u16 = 0;

/// Value `getevent` prints for a released tracking ID (-1 as u32).
pub const TRACKING_ID_NONE: i32 = -1;

pub fn abs_mt_position_x() -> u16 {
    Abs::MT_POSITION_X.raw()
}

pub fn abs_mt_position_y() -> u16 {
    Abs::MT_POSITION_Y.raw()
}

pub fn abs_mt_tracking_id() -> u16 {
    Abs::MT_TRACKING_ID.raw()
}

pub fn btn_touch() -> u16 {
    Key::BTN_TOUCH.raw()
}

/// Event type of a tokenized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Sync,
    Key,
    Abs,
}

impl EventKind {
    pub fn from_raw(ty: u16) -> Option<Self> {
        match ty {
            EV_SYN => Some(EventKind::Sync),
            EV_KEY => Some(EventKind::Key),
            EV_ABS => Some(EventKind::Abs),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "EV_SYN" => Some(EventKind::Sync),
            "EV_KEY" => Some(EventKind::Key),
            "EV_ABS" => Some(EventKind::Abs),
            _ => None,
        }
    }
}

/// Resolve a symbolic code printed by `getevent -l` to its raw value.
///
/// Only the codes the recorder reacts to are known; anything else is `None`.
pub fn code_from_label(label: &str) -> Option<u16> {
    let code = match label {
        "SYN_REPORT" => SYN_REPORT,
        "ABS_MT_POSITION_X" => abs_mt_position_x(),
        "ABS_MT_POSITION_Y" => abs_mt_position_y(),
        "ABS_MT_TRACKING_ID" => abs_mt_tracking_id(),
        "BTN_TOUCH" => btn_touch(),
        "KEY_POWER" => Key::KEY_POWER.raw(),
        "KEY_VOLUMEUP" => Key::KEY_VOLUMEUP.raw(),
        "KEY_VOLUMEDOWN" => Key::KEY_VOLUMEDOWN.raw(),
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Down,
    Up,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    Down,
    Up,
}

/// Hardware keys the recorder forwards, named after their Android key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCode {
    Power,
    VolumeUp,
    VolumeDown,
}

impl KeyCode {
    pub fn from_raw(code: u16) -> Option<Self> {
        if code == Key::KEY_POWER.raw() {
            Some(KeyCode::Power)
        } else if code == Key::KEY_VOLUMEUP.raw() {
            Some(KeyCode::VolumeUp)
        } else if code == Key::KEY_VOLUMEDOWN.raw() {
            Some(KeyCode::VolumeDown)
        } else {
            None
        }
    }

    /// `KEYCODE_*` value from `android.view.KeyEvent`.
    pub fn android_keycode(self) -> i32 {
        match self {
            KeyCode::VolumeUp => 24,
            KeyCode::VolumeDown => 25,
            KeyCode::Power => 26,
        }
    }
}

/// One normalized input event reconstructed from the raw stream.
///
/// Touch coordinates are fractions of the calibrated axis range and are not
/// clamped: a reading outside the reported `min`/`max` yields a value outside
/// `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceInputEvent {
    Touch {
        x: f64,
        y: f64,
        action: TouchAction,
    },
    Key {
        key_code: KeyCode,
        key_action: KeyAction,
    },
}
