use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::session::AdvancePolicy;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Settings read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_interval_ms: u64,
    pub advance_policy: AdvancePolicy,
    pub seed_sample_recipes: bool,
    pub recipes_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            advance_policy: AdvancePolicy::default(),
            seed_sample_recipes: true,
            recipes_path: None,
        }
    }
}

/// One-run overrides taken from the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub tick_interval_ms: Option<u64>,
    pub advance_policy: Option<AdvancePolicy>,
    pub recipes_path: Option<PathBuf>,
}

impl Config {
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(ms) = overrides.tick_interval_ms {
            self.tick_interval_ms = ms;
        }
        if let Some(policy) = overrides.advance_policy {
            self.advance_policy = policy;
        }
        if let Some(path) = &overrides.recipes_path {
            self.recipes_path = Some(path.clone());
        }
        self
    }

    /// Tick cadence, never shorter than 10ms
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(10))
    }
}

/// Where the persistent [`Config`] lives
pub trait ConfigStore {
    /// Falls back to defaults when the file is missing or unreadable.
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

/// JSON config file, by default `config.json` in the platform config dir
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_path(
            AppDirs::config_path().unwrap_or_else(|| PathBuf::from("sizzle_config.json")),
        )
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
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
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Config::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read config");
                return Config::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, cfg).map_err(io::Error::other)
    }
}
