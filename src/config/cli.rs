use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::mode::{StreamMode, Transport};

#[derive(Parser)]
#[command(name = "tap-rec")]
#[command(about = "Record touch and hardware-key input from a remote Android device")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Transport used to reach the device (adb, ssh)
    #[arg(long, value_parser = clap::value_parser!(Transport))]
    pub transport: Option<Transport>,

    /// adb device serial
    #[arg(long, env = "TAPREC_SERIAL")]
    pub serial: Option<String>,

    /// Path to the adb executable
    #[arg(long)]
    pub adb: Option<PathBuf>,

    /// SSH host (IP or hostname)
    #[arg(long, env = "TAPREC_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long)]
    pub port: Option<u16>,

    /// SSH user
    #[arg(long)]
    pub user: Option<String>,

    /// SSH key path for authentication
    #[arg(long)]
    pub key_path: Option<String>,

    /// SSH password (if set, key_path is ignored)
    #[arg(long, env = "TAPREC_PASSWORD")]
    pub password: Option<String>,

    /// Event stream mode (multi, single)
    #[arg(long, value_parser = clap::value_parser!(StreamMode))]
    pub mode: Option<StreamMode>,

    /// Use raw hex getevent output instead of symbolic labels
    #[arg(long)]
    pub no_labels: bool,

    /// getevent binary on the device
    #[arg(long)]
    pub getevent: Option<String>,

    /// Keep the discovered devices across sessions instead of re-running discovery
    #[arg(long)]
    pub reuse_discovery: bool,

    /// Path to config file
    #[arg(long, env = "TAPREC_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record input events and print them as JSON lines (default)
    Record {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Run device discovery and print the selected devices
    Devices,
    /// Dump raw event stream lines for debugging
    Dump,
}
