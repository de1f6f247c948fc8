//! Tokenizer for `getevent` output lines.
//!
//! Two stages: [`split_device`] peels off the optional timestamp and
//! `/dev/input/eventN:` prefix so lines from unselected devices can be dropped
//! early, then [`tokenize`] classifies the remainder. Labeled lines
//! (`EV_ABS ABS_MT_POSITION_X 000001f4`) are recognised by their `EV_` token;
//! anything else falls back to reading the last three tokens as
//! `type code value` in hex (`0003 0035 000001f4`).

use super::event::{code_from_label, EventKind};

/// A recognised `(type, code, value)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

/// Split a line into its device-path prefix (without the trailing `:`) and
/// the rest. A `getevent -t` timestamp (`[  1234.567890]`) is skipped.
pub fn split_device(line: &str) -> (Option<&str>, &str) {
    let mut rest = line.trim();
    if rest.starts_with('[') {
        if let Some(end) = rest.find(']') {
            rest = rest[end + 1..].trim_start();
        }
    }

    let first = rest.split_whitespace().next().unwrap_or("");
    match first.strip_suffix(':') {
        Some(path) if !path.is_empty() => (Some(path), rest[first.len()..].trim_start()),
        _ => (None, rest),
    }
}

/// Classify the body of a line. `None` means the line carries no usable
/// event and should be skipped.
pub fn tokenize(body: &str) -> Option<RawEvent> {
    let tokens: Vec<&str> = body.split_whitespace().collect();

    match tokens.iter().position(|t| t.starts_with("EV_")) {
        Some(idx) => parse_labeled(&tokens[idx..]),
        None => parse_raw_hex(&tokens),
    }
}

fn parse_labeled(tokens: &[&str]) -> Option<RawEvent> {
    let [ty, code, value, ..] = tokens else {
        return None;
    };
    let kind = EventKind::from_label(ty)?;
    let code = code_from_label(code).or_else(|| parse_hex_u16(code))?;
    let value = match *value {
        "DOWN" => 1,
        "UP" => 0,
        other => parse_hex_i32(other)?,
    };
    Some(RawEvent { kind, code, value })
}

fn parse_raw_hex(tokens: &[&str]) -> Option<RawEvent> {
    let [.., ty, code, value] = tokens else {
        return None;
    };
    let ty = parse_hex_u16(ty)?;
    let code = parse_hex_u16(code)?;
    let value = parse_hex_i32(value)?;
    let kind = EventKind::from_raw(ty)?;
    Some(RawEvent { kind, code, value })
}

fn is_hex(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_hex_u16(token: &str) -> Option<u16> {
    if !is_hex(token) {
        return None;
    }
    u16::from_str_radix(token, 16).ok()
}

/// Values are printed as 32-bit hex, so `ffffffff` is -1.
fn parse_hex_i32(token: &str) -> Option<i32> {
    if !is_hex(token) {
        return None;
    }
    u32::from_str_radix(token, 16).ok().map(|v| v as i32)
}
