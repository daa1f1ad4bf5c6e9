//! Handler for `keel trace`.

use std::path::PathBuf;

use miette::Result;

pub fn exec(source: &str, lock: Option<PathBuf>, depth: Option<usize>) -> Result<()> {
    let project_root = super::current_dir()?;
    let lock_path = keel_ops::lock_path(&project_root, lock.as_deref())?;
    keel_ops::ops_trace::trace(&lock_path, source, depth)
}
