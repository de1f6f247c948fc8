mod capabilities;
mod select;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{NotFound, RecorderError};
use crate::shell::RemoteShell;

pub use capabilities::{parse_capability_dump, CapabilityBlock};
pub use select::{best_touch, is_key_device, touch_candidate};

/// Reported `min`/`max` of one absolute axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// Position of `value` within the range. Not clamped.
    pub fn normalize(&self, value: i32) -> f64 {
        (value as f64 - self.min as f64) / (self.max as f64 - self.min as f64)
    }
}

/// Axis ranges of the selected touchscreen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Calibration {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl Calibration {
    pub fn normalize(&self, x: i32, y: i32) -> (f64, f64) {
        (self.x.normalize(x), self.y.normalize(y))
    }
}

/// A device reporting both multi-touch position axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchDeviceCandidate {
    pub path: String,
    pub name: String,
    pub calibration: Calibration,
}

impl TouchDeviceCandidate {
    pub fn area(&self) -> i64 {
        self.calibration.x.max as i64 * self.calibration.y.max as i64
    }
}

/// Devices chosen for a recording session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub touch: Option<TouchDeviceCandidate>,
    pub key_devices: BTreeSet<String>,
}

impl Selection {
    /// Device to stream when only one path can be passed to `getevent`.
    pub fn monitored_path(&self) -> Option<&str> {
        self.touch
            .as_ref()
            .map(|t| t.path.as_str())
            .or_else(|| self.key_devices.iter().next().map(String::as_str))
    }
}

/// Select the touchscreen and key devices from a capability dump.
pub fn select(dump: &str) -> Result<Selection, NotFound> {
    let blocks = parse_capability_dump(dump);
    log::debug!("Capability dump lists {} devices", blocks.len());

    let candidates: Vec<TouchDeviceCandidate> = blocks.iter().filter_map(touch_candidate).collect();
    for c in &candidates {
        log::debug!("Touch candidate {} ({:?}), area {}", c.path, c.name, c.area());
    }

    let selection = Selection {
        touch: best_touch(candidates),
        key_devices: blocks
            .iter()
            .filter(|b| is_key_device(b))
            .map(|b| b.path.to_string())
            .collect(),
    };

    if selection.touch.is_none() && selection.key_devices.is_empty() {
        return Err(NotFound);
    }
    Ok(selection)
}

/// Run the capability dump on the remote device and select from its output.
pub fn discover(shell: &dyn RemoteShell, command: &str) -> Result<Selection, RecorderError> {
    log::debug!("Executing: {}", command);
    let dump = shell.run(command).map_err(RecorderError::CapabilityDump)?;
    let selection = select(&dump)?;

    match &selection.touch {
        Some(t) => log::info!(
            "Touch device: {} ({:?}) x={}..{} y={}..{}",
            t.path,
            t.name,
            t.calibration.x.min,
            t.calibration.x.max,
            t.calibration.y.min,
            t.calibration.y.max
        ),
        None => log::warn!("No touch device found, recording keys only"),
    }
    if !selection.key_devices.is_empty() {
        log::info!(
            "Key devices: {}",
            selection.key_devices.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = "add device 1: /dev/input/event5
  name:     \"uinput-fpc\"
  events:
    KEY (0001): KEY_HOME
    ABS (0003): ABS_MT_POSITION_X     : value 0, min 0, max 4095, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_Y     : value 0, min 0, max 4095, fuzz 0, flat 0, resolution 0
add device 2: /dev/input/event3
  name:     \"stylus\"
  events:
    ABS (0003): ABS_MT_POSITION_X     : value 0, min 0, max 0, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_Y     : value 0, min 0, max 0, fuzz 0, flat 0, resolution 0
add device 3: /dev/input/event2
  name:     \"fts_ts\"
  events:
    KEY (0001): BTN_TOUCH
    ABS (0003): ABS_MT_SLOT           : value 0, min 0, max 9, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_X     : value 0, min 0, max 1079, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_Y     : value 0, min 0, max 2339, fuzz 0, flat 0, resolution 0
                ABS_MT_TRACKING_ID    : value 0, min 0, max 65535, fuzz 0, flat 0, resolution 0
add device 4: /dev/input/event0
  name:     \"qpnp_pon\"
  events:
    KEY (0001): KEY_VOLUMEDOWN        KEY_POWER
add device 5: /dev/input/event1
  name:     \"gpio-keys\"
  events:
    KEY (0001): KEY_VOLUMEUP
add device 6: /dev/input/event4
  name:     \"hall_sensor\"
  events:
    SW  (0005): SW_LID
";

    #[test]
    fn test_select_phone_dump() {
        let selection = select(PHONE).unwrap();
        let touch = selection.touch.unwrap();
        assert_eq!(touch.path, "/dev/input/event2");
        assert_eq!(touch.name, "fts_ts");
        assert_eq!(
            touch.calibration,
            Calibration {
                x: AxisRange { min: 0, max: 1079 },
                y: AxisRange { min: 0, max: 2339 },
            }
        );
        let keys: Vec<&str> = selection.key_devices.iter().map(String::as_str).collect();
        assert_eq!(keys, vec!["/dev/input/event0", "/dev/input/event1"]);
    }

    #[test]
    fn test_select_hex_dump() {
        let dump = "add device 1: /dev/input/event1
  name:     \"pmic_pwrkey\"
  events:
    KEY (0001): 0074
add device 2: /dev/input/event2
  name:     \"himax-touchscreen\"
  events:
    KEY (0001): 014a
    ABS (0003): 0035  : value 0, min 0, max 719, fuzz 0, flat 0, resolution 0
                0036  : value 0, min 0, max 1439, fuzz 0, flat 0, resolution 0
";
        let selection = select(dump).unwrap();
        assert_eq!(selection.touch.map(|t| t.path), Some("/dev/input/event2".into()));
        assert!(selection.key_devices.contains("/dev/input/event1"));
        assert_eq!(selection.key_devices.len(), 1);
    }

    #[test]
    fn test_select_keys_only() {
        let dump = "add device 1: /dev/input/event0\n  name:     \"gpio-keys\"\n  events:\n    KEY (0001): KEY_VOLUMEUP\n";
        let selection = select(dump).unwrap();
        assert!(selection.touch.is_none());
        assert_eq!(selection.monitored_path(), Some("/dev/input/event0"));
    }

    #[test]
    fn test_select_nothing() {
        let dump = "add device 1: /dev/input/event4\n  name:     \"hall_sensor\"\n  events:\n    SW  (0005): SW_LID\n";
        assert_eq!(select(dump), Err(NotFound));
        assert_eq!(select(""), Err(NotFound));
    }

    #[test]
    fn test_select_is_idempotent() {
        assert_eq!(select(PHONE).unwrap(), select(PHONE).unwrap());
    }

    #[test]
    fn test_normalize_is_not_clamped() {
        let cal = Calibration {
            x: AxisRange { min: 100, max: 200 },
            y: AxisRange { min: 0, max: 50 },
        };
        assert_eq!(cal.normalize(150, 100), (0.5, 2.0));
        assert_eq!(cal.normalize(50, 0), (-0.5, 0.0));
    }
}
