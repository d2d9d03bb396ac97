//! Application configuration

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use knave_core::Edition;

/// Default storage directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./knave-data";

/// Application configuration loaded from environment and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding one JSON file per storage key
    pub data_dir: PathBuf,
    /// Rules edition for new characters and derived values
    pub edition: Edition,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            edition: Edition::Second,
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(dir) = lookup("KNAVE_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(edition) = lookup("KNAVE_EDITION") {
            config.edition = edition
                .parse::<Edition>()
                .map_err(|e: String| anyhow!(e))
                .context("KNAVE_EDITION must be 1 or 2")?;
        }
        if let Some(seed) = lookup("KNAVE_SEED") {
            config.seed = Some(
                seed.trim()
                    .parse::<u64>()
                    .context("KNAVE_SEED must be an unsigned integer")?,
            );
        }
        Ok(config)
    }

    /// Apply command line overrides on top of this configuration.
    pub fn with_args(mut self, args: &[String]) -> Result<Self> {
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--data-dir" => {
                    let dir = args.get(i + 1).context("--data-dir needs a path")?;
                    self.data_dir = PathBuf::from(dir);
                    i += 1;
                }
                "--edition" => {
                    let edition = args.get(i + 1).context("--edition needs a value")?;
                    self.edition = edition
                        .parse::<Edition>()
                        .map_err(|e: String| anyhow!(e))
                        .context("--edition must be 1 or 2")?;
                    i += 1;
                }
                "--seed" => {
                    let seed = args.get(i + 1).context("--seed needs a value")?;
                    self.seed = Some(seed.parse::<u64>().context("--seed must be an unsigned integer")?);
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }
        Ok(self)
    }
}
