//! Pick the touchscreen and hardware-key sources out of the parsed blocks.

use std::cmp::Ordering;

use super::capabilities::CapabilityBlock;
use super::{Calibration, TouchDeviceCandidate};

const KEY_NAME_HINTS: [&str; 6] = ["key", "gpio", "power", "pwr", "vol", "button"];

const KEY_MARKERS: [&str; 6] = [
    "KEY_POWER",
    "0074",
    "KEY_VOLUMEUP",
    "0073",
    "KEY_VOLUMEDOWN",
    "0072",
];

/// A block qualifies as a touch candidate when it reports both multi-touch
/// position axes with a usable range.
pub fn touch_candidate(block: &CapabilityBlock<'_>) -> Option<TouchDeviceCandidate> {
    let x = block.axis_range("ABS_MT_POSITION_X", "0035")?;
    let y = block.axis_range("ABS_MT_POSITION_Y", "0036")?;

    if x.max <= 0 || y.max <= 0 || x.max <= x.min || y.max <= y.min {
        log::debug!(
            "Ignoring {} ({:?}): degenerate touch range x={:?} y={:?}",
            block.path,
            block.name,
            x,
            y
        );
        return None;
    }

    Some(TouchDeviceCandidate {
        path: block.path.to_string(),
        name: block.name.to_string(),
        calibration: Calibration { x, y },
    })
}

pub fn is_key_device(block: &CapabilityBlock<'_>) -> bool {
    let name = block.name.to_lowercase();
    KEY_NAME_HINTS.iter().any(|hint| name.contains(hint)) || block.has_capability(&KEY_MARKERS)
}

fn is_fingerprint(name: &str) -> bool {
    name.contains("fp") || name.contains("fingerprint")
}

fn name_score(name: &str) -> i32 {
    let mut score = 0;
    if name.contains("touchscreen") {
        score += 10;
    }
    if name.contains("ts") {
        score += 5;
    }
    score
}

/// Fingerprint exclusion first, then name affinity, then axis area.
fn rank(candidate: &TouchDeviceCandidate) -> (bool, i32, i64) {
    let name = candidate.name.to_lowercase();
    (!is_fingerprint(&name), name_score(&name), candidate.area())
}

/// Highest-ranked candidate. On a full tie the one listed first wins.
pub fn best_touch(candidates: Vec<TouchDeviceCandidate>) -> Option<TouchDeviceCandidate> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b) if rank(&candidate).cmp(&rank(&b)) != Ordering::Greater => Some(b),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::AxisRange;

    fn candidate(path: &str, name: &str, max_x: i32, max_y: i32) -> TouchDeviceCandidate {
        TouchDeviceCandidate {
            path: path.into(),
            name: name.into(),
            calibration: Calibration {
                x: AxisRange { min: 0, max: max_x },
                y: AxisRange { min: 0, max: max_y },
            },
        }
    }

    fn best_path(candidates: Vec<TouchDeviceCandidate>) -> Option<String> {
        best_touch(candidates).map(|c| c.path)
    }

    #[test]
    fn test_fingerprint_always_loses() {
        let picked = best_path(vec![
            candidate("/dev/input/event1", "fingerprint_touchscreen_ts", 4000, 4000),
            candidate("/dev/input/event2", "panel", 100, 100),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event2"));

        let picked = best_path(vec![
            candidate("/dev/input/event2", "panel", 100, 100),
            candidate("/dev/input/event3", "uinput-fpc", 4000, 4000),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event2"));
    }

    #[test]
    fn test_name_score_beats_area() {
        let picked = best_path(vec![
            candidate("/dev/input/event1", "pen_digitizer", 20000, 15000),
            candidate("/dev/input/event2", "sec_touchscreen", 1080, 2400),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event2"));
    }

    #[test]
    fn test_score_is_additive() {
        let picked = best_path(vec![
            candidate("/dev/input/event1", "touchscreen", 1080, 2400),
            candidate("/dev/input/event2", "touchscreen_ts", 100, 100),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event2"));
    }

    #[test]
    fn test_area_breaks_ties() {
        let picked = best_path(vec![
            candidate("/dev/input/event1", "panel_a", 720, 1280),
            candidate("/dev/input/event2", "panel_b", 1080, 2400),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event2"));
    }

    #[test]
    fn test_full_tie_keeps_first() {
        let picked = best_path(vec![
            candidate("/dev/input/event1", "panel", 1080, 2400),
            candidate("/dev/input/event2", "panel", 1080, 2400),
        ]);
        assert_eq!(picked.as_deref(), Some("/dev/input/event1"));
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(best_path(Vec::new()), None);
    }
}
