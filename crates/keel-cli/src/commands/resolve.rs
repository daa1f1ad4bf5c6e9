//! Handler for `keel resolve`.

use std::path::PathBuf;

use miette::Result;

use keel_ops::ops_resolve::{self, ResolveOptions};

pub async fn exec(
    meta: PathBuf,
    package: String,
    inactive: bool,
    lock: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let project_root = super::current_dir()?;
    let lock_path = keel_ops::lock_path(&project_root, lock.as_deref())?;

    let opts = ResolveOptions {
        meta: project_root.join(meta),
        package,
        inactive,
        json,
    };
    ops_resolve::resolve(&lock_path, &opts).await.map(|_| ())
}
