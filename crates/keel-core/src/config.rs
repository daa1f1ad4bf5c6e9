use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::DEFAULT_LOCK_FILE;

/// Global user configuration loaded from `~/.keel/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Lock store settings from `[lock]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_path")]
    pub path: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            path: default_lock_path(),
        }
    }
}

fn default_lock_path() -> String {
    DEFAULT_LOCK_FILE.to_string()
}

/// Logging settings from `[log]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Fallback `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl GlobalConfig {
    /// Load the global configuration, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| keel_util::errors::KeelError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        toml::from_str(&content).map_err(|e| {
            keel_util::errors::KeelError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// The lock file path, resolved against `root` when relative.
    pub fn lock_path(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.lock.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }
}

/// Returns the keel data directory: `$KEEL_HOME`, else `~/.keel/`.
pub fn dirs_path() -> PathBuf {
    if let Ok(home) = std::env::var("KEEL_HOME") {
        return PathBuf::from(home);
    }
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".keel")
}
