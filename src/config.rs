use anyhow::{Context, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::SyncSettings;

pub(crate) const CONFIG_FILE: &str = "config.json";
pub(crate) const DB_FILE: &str = "budgetplan.db";
pub(crate) const LOG_FILE: &str = "budgetplan.log";
/// Overrides every other database path setting.
pub(crate) const DB_ENV_VAR: &str = "BUDGETPLAN_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Quiet period after the last edit before pending edits are written.
    pub(crate) settle_window_ms: u64,
    pub(crate) max_auto_retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) database_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) default_year: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        let sync = SyncSettings::default();
        Self {
            settle_window_ms: sync.settle_window.as_millis() as u64,
            max_auto_retries: sync.max_auto_retries,
            database_path: None,
            default_year: None,
        }
    }
}

impl Config {
    /// Read the config file. A missing file means defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Write the defaults out so there is a file to edit. Existing files are
    /// left alone.
    pub(crate) fn write_default_if_missing(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(&Self::default())?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write config: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub(crate) fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            settle_window: Duration::from_millis(self.settle_window_ms),
            max_auto_retries: self.max_auto_retries,
        }
    }

    pub(crate) fn start_year(&self) -> i32 {
        self.default_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    /// Environment override first, then the config file, then the data dir.
    pub(crate) fn database_path(&self, data_dir: &Path, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(|| data_dir.join(DB_FILE))
    }
}

/// Platform directories for data (database, log) and configuration.
#[derive(Debug, Clone)]
pub(crate) struct AppDirs {
    pub(crate) data_dir: PathBuf,
    pub(crate) config_dir: PathBuf,
}

impl AppDirs {
    pub(crate) fn discover() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "budgetplan", "budgetplan")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let dirs = Self {
            data_dir: proj_dirs.data_dir().to_path_buf(),
            config_dir: proj_dirs.config_dir().to_path_buf(),
        };
        for dir in [&dirs.data_dir, &dirs.config_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(dirs)
    }

    pub(crate) fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub(crate) fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}
