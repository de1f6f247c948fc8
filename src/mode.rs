//! Transport and stream-mode selection.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How commands reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// `adb shell` through the local adb client.
    #[default]
    Adb,
    /// An SSH server on the device.
    Ssh,
}

/// Shape of the event-stream command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamMode {
    /// One `getevent` over all devices; lines carry a device-path prefix.
    #[default]
    Multi,
    /// `getevent <path>` for the touchscreen only; lines have no prefix.
    Single,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Adb => write!(f, "adb"),
            Transport::Ssh => write!(f, "ssh"),
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adb" => Ok(Transport::Adb),
            "ssh" => Ok(Transport::Ssh),
            _ => Err(format!("Invalid transport '{}'. Valid values: adb, ssh", s)),
        }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamMode::Multi => write!(f, "multi"),
            StreamMode::Single => write!(f, "single"),
        }
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multi" | "multi-device" | "multi_device" => Ok(StreamMode::Multi),
            "single" | "single-device" | "single_device" => Ok(StreamMode::Single),
            _ => Err(format!("Invalid stream mode '{}'. Valid values: multi, single", s)),
        }
    }
}
