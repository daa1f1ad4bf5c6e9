pub mod ops_lock;
pub mod ops_resolve;
pub mod ops_trace;

use std::path::{Path, PathBuf};

use keel_core::config::GlobalConfig;
use keel_core::lockfile::Lock;
use keel_util::errors::KeelResult;

/// The lock file to operate on: `explicit` if given, else the configured
/// `[lock] path` relative to `project_root`.
pub fn lock_path(project_root: &Path, explicit: Option<&Path>) -> KeelResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(project_root.join(path));
    }
    let config = GlobalConfig::load()?;
    Ok(config.lock_path(project_root))
}

/// Read the lock at `path`; a missing file is an empty lock.
pub fn read_lock(path: &Path) -> KeelResult<Lock> {
    if !path.is_file() {
        tracing::debug!("no lock at {}", path.display());
        return Ok(Lock::default());
    }
    Lock::from_path(path)
}
