use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::doer::{self, Setter};

/// Engine defaults loaded from `~/.config/txe/config.toml`.
///
/// Applications feed these into a doer via [`TxeConfig::setters`] before the
/// first call; absent file sections fall back to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxeConfig {
    /// Per-attempt timeout in seconds (0 disables the attempt deadline).
    pub timeout_secs: u64,
    /// Maximum ping attempts per reconnect probe (0 disables probing).
    pub max_ping: u32,
    /// Maximum retry attempts for the outer loop (0 retries without ceiling).
    pub max_retry: u32,
    /// Propagate work-unit panics instead of converting them to errors.
    #[serde(default)]
    pub rethrow_panic: bool,
}

impl Default for TxeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_ping: 4,
            max_retry: 4,
            rethrow_panic: false,
        }
    }
}

impl TxeConfig {
    /// Ordered setter list for `DoerBase::multi_set`.
    pub fn setters<O>(&self) -> Vec<Setter<O>> {
        vec![
            doer::with_timeout(Duration::from_secs(self.timeout_secs)),
            doer::with_max_ping(self.max_ping),
            doer::with_max_retry(self.max_retry),
            doer::with_rethrow_panic(self.rethrow_panic),
        ]
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("txe")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TxeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TxeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TxeConfig = toml::from_str(&data)?;
    Ok(cfg)
}
