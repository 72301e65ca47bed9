use std::path::PathBuf;

use anyhow::Result;
use chrono::Datelike;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::traits::Clock;

const APP_DIR: &str = "semester-planner";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub term: TermConfig,
    pub parser: ParserConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TermConfig {
    /// Calendar year whose week 1 anchors the term. Defaults to the current year.
    pub year: Option<i32>,
}

impl TermConfig {
    pub fn resolve_year(&self, clock: &dyn Clock) -> i32 {
        self.year.unwrap_or_else(|| clock.today().year())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParserConfig {
    pub grid_week_offset: u32,
    pub block_week_offset: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            grid_week_offset: 37,
            block_week_offset: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub snapshot_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, or `<data_dir>/semester-planner/schedule.json`.
    pub fn resolve_snapshot_path(&self) -> PathBuf {
        self.snapshot_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("schedule.json")
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        let builder = Config::builder()
            // 1. Load default values
            // Term
            .set_default("term.year", None::<i64>)?
            // Parser
            .set_default("parser.grid_week_offset", 37)?
            .set_default("parser.block_week_offset", 1)?
            // Storage
            .set_default("storage.snapshot_path", None::<String>)?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (PLANNER__TERM__YEAR=...)
            .add_source(Environment::with_prefix("PLANNER").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }
}
