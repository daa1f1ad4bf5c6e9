//! Handler for `keel lock`.

use std::path::PathBuf;

use miette::Result;

pub fn exec(lock: Option<PathBuf>) -> Result<()> {
    let project_root = super::current_dir()?;
    let lock_path = keel_ops::lock_path(&project_root, lock.as_deref())?;
    keel_ops::ops_lock::show(&lock_path)
}
