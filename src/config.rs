use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::game::Mode;
use crate::geometry::Size;
use crate::tracking::TrackerConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub dwell_threshold_ms: u64,
    pub computer_delay_ms: u64,
    pub surface_width: u32,
    pub surface_height: u32,
    pub tick_rate_ms: u64,
    pub start_mode: Mode,
    pub tracker: TrackerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dwell_threshold_ms: 1500,
            computer_delay_ms: 500,
            surface_width: 800,
            surface_height: 800,
            tick_rate_ms: 33,
            start_mode: Mode::PvP,
            tracker: TrackerConfig::default(),
        }
    }
}

impl Config {
    pub fn dwell_threshold(&self) -> Duration {
        Duration::from_millis(self.dwell_threshold_ms)
    }

    pub fn computer_delay(&self) -> Duration {
        Duration::from_millis(self.computer_delay_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn surface(&self) -> Size {
        Size::new(self.surface_width as f64, self.surface_height as f64)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "dwelltoe") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("dwelltoe_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
            tracing::warn!("ignoring unreadable config at {}", self.path.display());
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
