//! Subcommands.

pub mod batch;
pub mod config;
pub mod process;
pub mod serve;

use std::path::{Path, PathBuf};

use invex_core::InvexConfig;
use tracing::debug;

/// `<config_dir>/invex/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

/// The config file in use: `--config` when given, the default location otherwise.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Read the config file without the environment overlay.
///
/// An explicit `--config` must exist; a missing default file means defaults.
pub fn read_config_file(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    let path = config_file(config_path);
    if path.exists() {
        debug!("Loading config from {}", path.display());
        load_file(&path)
    } else if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        Ok(InvexConfig::default())
    }
}

/// Defaults, then the config file, then the environment. Flags are applied by callers.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    let mut config = read_config_file(config_path)?;
    config.apply_env()?;
    Ok(config)
}

fn load_file(path: &Path) -> anyhow::Result<InvexConfig> {
    InvexConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}
