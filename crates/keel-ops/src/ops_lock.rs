//! Operation: list the packages recorded in the lock.

use std::path::Path;

use keel_core::lockfile::Lock;
use keel_util::errors::KeelResult;

/// One line per lock entry, sorted by source.
pub fn summarize(lock: &Lock) -> Vec<String> {
    let mut packages: Vec<_> = lock.packages.iter().collect();
    packages.sort_by(|a, b| a.source.cmp(&b.source));
    packages
        .into_iter()
        .map(|p| {
            let deps = match p.dependencies.len() {
                0 => "no dependencies".to_string(),
                1 => "1 dependency".to_string(),
                n => format!("{n} dependencies"),
            };
            format!("{} {} ({deps})", p.source, p.version)
        })
        .collect()
}

/// Print the lock at `lock_path`.
pub fn show(lock_path: &Path) -> KeelResult<()> {
    let lock = crate::read_lock(lock_path)?;
    if lock.packages.is_empty() {
        keel_util::status::status_info("Empty", &format!("{}", lock_path.display()));
        return Ok(());
    }

    for line in summarize(&lock) {
        println!("{line}");
    }
    keel_util::status::status_info(
        "Lock",
        &format!(
            "{} packages at revision {}",
            lock.packages.len(),
            lock.revision
        ),
    );
    Ok(())
}
