use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::passage::Difficulty;
use crate::session::Mode;

/// Preferences persisted between runs. Enum-valued settings are stored as
/// lowercase keys and parsed leniently on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub difficulty: String,
    pub mode: String,
    pub target_seconds: Option<u64>,
    pub target_word_count: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: "medium".to_string(),
            mode: "fixedquote".to_string(),
            target_seconds: None,
            target_word_count: None,
        }
    }
}

impl Config {
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_key(&self.difficulty)
    }

    pub fn mode(&self) -> Mode {
        match self.mode.to_lowercase().as_str() {
            "timed" => Mode::Timed,
            "wordcount" => Mode::WordCount,
            _ => Mode::FixedQuote,
        }
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
        let path = if let Some(pd) = ProjectDirs::from("", "", "kadence") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("kadence_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
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
