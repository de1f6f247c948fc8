mod cli;
mod file;

pub use cli::{Cli, Command};

use std::path::PathBuf;
use std::sync::Arc;

use crate::mode::{StreamMode, Transport};
use crate::recorder::RecorderOptions;
use crate::shell::{AdbShell, RemoteShell, SshShell};

const DEFAULT_ADB: &str = "adb";
const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_SSH_USER: &str = "root";
const DEFAULT_KEY_PATH: &str = "tap-rec-key";

/// Authentication method for SSH connection.
#[derive(Clone)]
pub enum Auth {
    Key(PathBuf),
    Password(String),
}

/// Merged configuration from CLI args and TOML file.
#[derive(Debug, Clone)]
pub struct Config {
    pub transport: Transport,
    pub serial: Option<String>,
    pub adb: PathBuf,
    pub host: Option<String>,
    pub port: u16,
    pub user: String,
    pub key_path: Option<String>,
    pub password: Option<String>,
    pub mode: StreamMode,
    pub labels: bool,
    pub getevent: String,
    pub reuse_discovery: bool,
}

impl Config {
    /// Load configuration by merging TOML file with CLI overrides.
    pub fn load(cli: &Cli) -> Self {
        let file_config = cli
            .config
            .as_ref()
            .and_then(|p| file::load_from_path(p))
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();

        Self {
            transport: cli.transport.unwrap_or(file_config.transport),
            serial: cli.serial.clone().or(file_config.serial),
            adb: cli
                .adb
                .clone()
                .or(file_config.adb)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ADB)),
            host: cli.host.clone().or(file_config.host),
            port: cli.port.or(file_config.port).unwrap_or(DEFAULT_SSH_PORT),
            user: cli
                .user
                .clone()
                .or(file_config.user)
                .unwrap_or_else(|| DEFAULT_SSH_USER.into()),
            key_path: cli.key_path.clone().or(file_config.key_path),
            password: cli.password.clone().or(file_config.password),
            mode: cli.mode.unwrap_or(file_config.mode),
            labels: !cli.no_labels && file_config.labels,
            getevent: cli.getevent.clone().unwrap_or(file_config.getevent),
            reuse_discovery: cli.reuse_discovery || file_config.reuse_discovery,
        }
    }

    pub fn auth(&self) -> Auth {
        if let Some(ref password) = self.password {
            return Auth::Password(password.clone());
        }
        let path = self.key_path.as_deref().unwrap_or(DEFAULT_KEY_PATH);
        Auth::Key(PathBuf::from(path))
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.transport == Transport::Ssh && self.host.is_none() {
            return Err("The ssh transport needs --host");
        }
        if self.getevent.trim().is_empty() {
            return Err("getevent command must not be empty");
        }
        Ok(())
    }

    pub fn shell(&self) -> Arc<dyn RemoteShell> {
        match self.transport {
            Transport::Adb => Arc::new(AdbShell::new(self.adb.clone(), self.serial.clone())),
            Transport::Ssh => Arc::new(SshShell::new(
                self.host.clone().unwrap_or_default(),
                self.port,
                self.user.clone(),
                self.auth(),
            )),
        }
    }

    pub fn recorder_options(&self) -> RecorderOptions {
        RecorderOptions {
            getevent: self.getevent.clone(),
            labels: self.labels,
            mode: self.mode,
            reuse_discovery: self.reuse_discovery,
        }
    }
}
