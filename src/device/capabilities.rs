//! Split a `getevent -p` / `getevent -pl` capability dump into per-device blocks.
//!
//! The format is human-oriented and varies between vendors and between the
//! labeled and hex variants, so blocks are scanned for tokens rather than
//! parsed field by field:
//!
//! ```text
//! add device 3: /dev/input/event2
//!   name:     "sec_touchscreen"
//!   events:
//!     KEY (0001): BTN_TOUCH
//!     ABS (0003): ABS_MT_POSITION_X     : value 0, min 0, max 1079, fuzz 0, flat 0, resolution 0
//!                 ABS_MT_POSITION_Y     : value 0, min 0, max 2399, fuzz 0, flat 0, resolution 0
//!   input props:
//!     INPUT_PROP_DIRECT
//! ```

use super::AxisRange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityBlock<'a> {
    pub path: &'a str,
    pub name: &'a str,
    lines: Vec<&'a str>,
}

impl<'a> CapabilityBlock<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            name: "",
            lines: Vec::new(),
        }
    }

    /// Lines of the `events:` section, or the whole block when the dump has
    /// no such section.
    fn capability_lines(&self) -> &[&'a str] {
        let start = self
            .lines
            .iter()
            .position(|l| l.trim() == "events:")
            .map(|i| i + 1);
        let Some(start) = start else {
            return &self.lines;
        };
        let end = self.lines[start..]
            .iter()
            .position(|l| l.trim_start().starts_with("input props:"))
            .map_or(self.lines.len(), |i| start + i);
        &self.lines[start..end]
    }

    /// Whether any capability token equals one of `markers`.
    pub fn has_capability(&self, markers: &[&str]) -> bool {
        self.capability_lines()
            .iter()
            .flat_map(|l| l.split_whitespace())
            .map(|t| t.trim_end_matches(':'))
            .any(|t| markers.contains(&t))
    }

    /// `min`/`max` of the first axis line naming `label` or its hex `code`.
    pub fn axis_range(&self, label: &str, code: &str) -> Option<AxisRange> {
        self.capability_lines()
            .iter()
            .filter(|l| {
                l.split_whitespace()
                    .map(|t| t.trim_end_matches(':'))
                    .any(|t| t == label || t == code)
            })
            .find_map(|l| {
                Some(AxisRange {
                    min: field(l, "min")?,
                    max: field(l, "max")?,
                })
            })
    }
}

/// Value following `key` in a `value 0, min 0, max 1079, ...` list.
fn field(line: &str, key: &str) -> Option<i32> {
    let mut tokens = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());
    tokens.find(|&t| t == key)?;
    tokens.next()?.parse().ok()
}

/// Header lines carry the device path after their last colon
/// (`add device 3: /dev/input/event2`).
fn header_path(line: &str) -> Option<&str> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let (_, path) = line.rsplit_once(':')?;
    let path = path.trim();
    (path.starts_with('/') || line.starts_with("add device")).then_some(path)
}

fn quoted_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("name:")?.trim();
    match (rest.find('"'), rest.rfind('"')) {
        (Some(open), Some(close)) if close > open => Some(&rest[open + 1..close]),
        _ => Some(rest),
    }
}

/// Parse a capability dump into blocks. Text before the first header is ignored.
pub fn parse_capability_dump(text: &str) -> Vec<CapabilityBlock<'_>> {
    let mut blocks: Vec<CapabilityBlock<'_>> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(path) = header_path(line) {
            blocks.push(CapabilityBlock::new(path));
            continue;
        }

        let Some(block) = blocks.last_mut() else {
            continue;
        };
        if block.name.is_empty() {
            if let Some(name) = quoted_name(line) {
                block.name = name;
                continue;
            }
        }
        block.lines.push(line);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELED: &str = "could not get driver version for /dev/input/mice, Not a typewriter
add device 1: /dev/input/event2
  bus:      0000
  vendor    0000
  product   0000
  version   0000
  name:     \"sec_touchscreen\"
  location: \"sec_touchscreen/input1\"
  id:       \"\"
  version:  1.0.1
  events:
    KEY (0001): KEY_POWER             BTN_TOUCH
    ABS (0003): ABS_MT_SLOT           : value 0, min 0, max 9, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_X     : value 0, min 0, max 1079, fuzz 0, flat 0, resolution 0
                ABS_MT_POSITION_Y     : value 0, min -10, max 2399, fuzz 0, flat 0, resolution 0
  input props:
    INPUT_PROP_DIRECT
add device 2: /dev/input/event0
  name:     \"gpio_keys\"
  events:
    KEY (0001): KEY_VOLUMEDOWN        KEY_VOLUMEUP
";

    const HEX: &str = "add device 1: /dev/input/event3
  bus:      0018
  vendor    0074
  name:     \"touch_dev\"
  events:
    KEY (0001): 014a
    ABS (0003): 0035  : value 0, min 0, max 1439, fuzz 0, flat 0, resolution 0
                0036  : value 0, min 0, max 3119, fuzz 0, flat 0, resolution 0
                0039  : value 0, min 0, max 65535, fuzz 0, flat 0, resolution 0
  input props:
    0001
";

    #[test]
    fn test_blocks_and_names() {
        let blocks = parse_capability_dump(LABELED);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].path, "/dev/input/event2");
        assert_eq!(blocks[0].name, "sec_touchscreen");
        assert_eq!(blocks[1].path, "/dev/input/event0");
        assert_eq!(blocks[1].name, "gpio_keys");
    }

    #[test]
    fn test_labeled_axis_ranges() {
        let blocks = parse_capability_dump(LABELED);
        assert_eq!(
            blocks[0].axis_range("ABS_MT_POSITION_X", "0035"),
            Some(AxisRange { min: 0, max: 1079 })
        );
        assert_eq!(
            blocks[0].axis_range("ABS_MT_POSITION_Y", "0036"),
            Some(AxisRange { min: -10, max: 2399 })
        );
        assert_eq!(blocks[1].axis_range("ABS_MT_POSITION_X", "0035"), None);
    }

    #[test]
    fn test_hex_axis_ranges() {
        let blocks = parse_capability_dump(HEX);
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].axis_range("ABS_MT_POSITION_Y", "0036"),
            Some(AxisRange { min: 0, max: 3119 })
        );
    }

    #[test]
    fn test_capabilities_ignore_id_fields() {
        let blocks = parse_capability_dump(HEX);
        // vendor 0074 sits outside the events section
        assert!(!blocks[0].has_capability(&["0074"]));
        assert!(blocks[0].has_capability(&["014a"]));
    }

    #[test]
    fn test_block_without_events_section() {
        let dump = "add device 7: /dev/input/event7\n  name: \"vendor_keys\"\n  KEY_POWER\n";
        let blocks = parse_capability_dump(dump);
        assert!(blocks[0].has_capability(&["KEY_POWER"]));
    }
}
