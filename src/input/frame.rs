//! Single-contact touch frame accumulator.
//!
//! Axis, tracking-ID and `BTN_TOUCH` events only record signals; nothing is
//! emitted until the `SYN_REPORT` that closes the frame. Contact state
//! (`is_down`, tracking ID, last position) survives frame boundaries, the
//! per-frame signals do not.

use crate::device::Calibration;

use super::event::{
    abs_mt_position_x, abs_mt_position_y, abs_mt_tracking_id, btn_touch, DeviceInputEvent,
    EventKind, TouchAction, SYN_REPORT, TRACKING_ID_NONE,
};
use super::line::RawEvent;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FrameSignals {
    down: bool,
    up: bool,
    moved: bool,
}

#[derive(Debug)]
pub struct TouchFrame {
    current_x: Option<i32>,
    current_y: Option<i32>,
    is_down: bool,
    tracking_id: i32,
    signals: FrameSignals,
}

impl Default for TouchFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchFrame {
    pub fn new() -> Self {
        Self {
            current_x: None,
            current_y: None,
            is_down: false,
            tracking_id: TRACKING_ID_NONE,
            signals: FrameSignals::default(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }

    /// Apply one event from the touch device. Returns the synthesized event
    /// when `ev` closes a frame that produced one.
    pub fn apply(&mut self, ev: RawEvent, calibration: &Calibration) -> Option<DeviceInputEvent> {
        match ev.kind {
            EventKind::Abs if ev.code == abs_mt_position_x() => {
                self.current_x = Some(ev.value);
                self.signals.moved = true;
            }
            EventKind::Abs if ev.code == abs_mt_position_y() => {
                self.current_y = Some(ev.value);
                self.signals.moved = true;
            }
            EventKind::Abs if ev.code == abs_mt_tracking_id() => {
                if ev.value == TRACKING_ID_NONE {
                    self.lift();
                    self.tracking_id = TRACKING_ID_NONE;
                } else {
                    if !self.is_down {
                        self.press();
                    }
                    self.tracking_id = ev.value;
                }
            }
            EventKind::Key if ev.code == btn_touch() => match ev.value {
                1 => self.press(),
                0 => self.lift(),
                _ => {}
            },
            EventKind::Sync if ev.code == SYN_REPORT => return self.sync(calibration),
            _ => {}
        }
        None
    }

    fn press(&mut self) {
        self.signals.down = true;
        self.is_down = true;
    }

    fn lift(&mut self) {
        self.signals.up = true;
        self.is_down = false;
    }

    /// Close the current frame. Signals are cleared whether or not an event
    /// is produced.
    fn sync(&mut self, calibration: &Calibration) -> Option<DeviceInputEvent> {
        let signals = std::mem::take(&mut self.signals);
        let (x, y) = self.current_x.zip(self.current_y)?;

        let action = if signals.down {
            TouchAction::Down
        } else if signals.up {
            TouchAction::Up
        } else if signals.moved && self.is_down {
            TouchAction::Move
        } else {
            return None;
        };

        let (x, y) = calibration.normalize(x, y);
        Some(DeviceInputEvent::Touch { x, y, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::AxisRange;
    use crate::input::line::{split_device, tokenize};

    fn calibration() -> Calibration {
        Calibration {
            x: AxisRange { min: 0, max: 100 },
            y: AxisRange { min: 0, max: 100 },
        }
    }

    fn feed(frame: &mut TouchFrame, lines: &[&str]) -> Vec<DeviceInputEvent> {
        let cal = calibration();
        lines
            .iter()
            .filter_map(|l| tokenize(split_device(l).1))
            .filter_map(|ev| frame.apply(ev, &cal))
            .collect()
    }

    fn actions(events: &[DeviceInputEvent]) -> Vec<TouchAction> {
        events
            .iter()
            .map(|e| match e {
                DeviceInputEvent::Touch { action, .. } => *action,
                other => panic!("unexpected event {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_down_signal_consumed_at_boundary() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_KEY BTN_TOUCH DOWN",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_POSITION_X 0032",
                "EV_ABS ABS_MT_POSITION_Y 0064",
                "EV_SYN SYN_REPORT 0000",
            ],
        );
        assert_eq!(
            events,
            vec![DeviceInputEvent::Touch { x: 0.5, y: 1.0, action: TouchAction::Move }]
        );
    }

    #[test]
    fn test_new_contact_after_btn_touch_up() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_ABS ABS_MT_TRACKING_ID 00000005",
                "EV_KEY BTN_TOUCH DOWN",
                "EV_ABS ABS_MT_POSITION_X 00000010",
                "EV_ABS ABS_MT_POSITION_Y 00000010",
                "EV_SYN SYN_REPORT 00000000",
                "EV_KEY BTN_TOUCH UP",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_TRACKING_ID 00000006",
                "EV_ABS ABS_MT_POSITION_X 00000020",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_POSITION_X 00000030",
                "EV_SYN SYN_REPORT 00000000",
            ],
        );
        assert_eq!(
            actions(&events),
            vec![TouchAction::Down, TouchAction::Up, TouchAction::Down, TouchAction::Move]
        );
        assert!(frame.is_down());
    }

    #[test]
    fn test_tracking_id_reuse_sequence() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_ABS ABS_MT_TRACKING_ID 00000003",
                "EV_ABS ABS_MT_POSITION_X 00000010",
                "EV_ABS ABS_MT_POSITION_Y 00000010",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_TRACKING_ID ffffffff",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_TRACKING_ID 00000005",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_POSITION_X 00000020",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_TRACKING_ID 00000005",
                "EV_ABS ABS_MT_POSITION_Y 00000030",
                "EV_SYN SYN_REPORT 00000000",
                "EV_ABS ABS_MT_TRACKING_ID ffffffff",
                "EV_SYN SYN_REPORT 00000000",
            ],
        );
        assert_eq!(
            actions(&events),
            vec![
                TouchAction::Down,
                TouchAction::Up,
                TouchAction::Down,
                TouchAction::Move,
                TouchAction::Move,
                TouchAction::Up,
            ]
        );
    }

    #[test]
    fn test_no_event_without_position() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &["EV_ABS ABS_MT_TRACKING_ID 00000001", "EV_SYN SYN_REPORT 00000000"],
        );
        assert!(events.is_empty());
        assert!(frame.is_down());
    }

    #[test]
    fn test_move_requires_contact() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_ABS ABS_MT_POSITION_X 00000010",
                "EV_ABS ABS_MT_POSITION_Y 00000010",
                "EV_SYN SYN_REPORT 00000000",
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_down_wins_over_up_in_same_frame() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_ABS ABS_MT_POSITION_X 00000010",
                "EV_ABS ABS_MT_POSITION_Y 00000010",
                "EV_KEY BTN_TOUCH UP",
                "EV_KEY BTN_TOUCH DOWN",
                "EV_SYN SYN_REPORT 00000000",
            ],
        );
        assert_eq!(actions(&events), vec![TouchAction::Down]);
    }

    #[test]
    fn test_coordinates_are_not_clamped() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "0001 014a 00000001",
                "0003 0035 000000c8",
                "0003 0036 00000000",
                "0000 0000 00000000",
            ],
        );
        assert_eq!(
            events,
            vec![DeviceInputEvent::Touch { x: 2.0, y: 0.0, action: TouchAction::Down }]
        );
    }

    #[test]
    fn test_non_report_sync_is_not_a_boundary() {
        let mut frame = TouchFrame::new();
        let events = feed(
            &mut frame,
            &[
                "EV_ABS ABS_MT_TRACKING_ID 00000001",
                "EV_ABS ABS_MT_POSITION_X 00000010",
                "EV_ABS ABS_MT_POSITION_Y 00000010",
                "EV_SYN SYN_MT_REPORT 00000000",
                "0000 0002 00000000",
            ],
        );
        assert!(events.is_empty());
    }
}
