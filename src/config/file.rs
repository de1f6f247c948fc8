use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::mode::{StreamMode, Transport};

const DEFAULT_GETEVENT: &str = "getevent";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub transport: Transport,
    pub serial: Option<String>,
    pub adb: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub key_path: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub mode: StreamMode,
    #[serde(default = "default_true")]
    pub labels: bool,
    #[serde(default = "default_getevent")]
    pub getevent: String,
    #[serde(default)]
    pub reuse_discovery: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            serial: None,
            adb: None,
            host: None,
            port: None,
            user: None,
            key_path: None,
            password: None,
            mode: StreamMode::default(),
            labels: true,
            getevent: DEFAULT_GETEVENT.into(),
            reuse_discovery: false,
        }
    }
}

fn default_getevent() -> String {
    DEFAULT_GETEVENT.into()
}

fn default_true() -> bool {
    true
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match parse(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

fn parse(content: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("tap-rec.toml"));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("tap-rec.toml"));
    }

    paths
}
