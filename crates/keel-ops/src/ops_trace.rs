//! Operation: print the transitive dependencies of an installed package.

use std::path::Path;

use keel_resolver::graph::{Dag, DependencyGraph};
use keel_util::errors::KeelResult;

/// Print the dependency tree of `source` as recorded in the lock.
pub fn trace(lock_path: &Path, source: &str, depth: Option<usize>) -> KeelResult<()> {
    let lock = crate::read_lock(lock_path)?;
    let graph = DependencyGraph::from_packages(&lock.packages).map_err(miette::Report::new)?;

    if !graph.node_exists(source) {
        return Err(keel_util::errors::KeelError::Generic {
            message: format!("Package '{source}' is not in {}", lock_path.display()),
        }
        .into());
    }

    print!("{}", graph.print_tree(source, depth));

    let tree = graph.trace_node(source).map_err(miette::Report::new)?;
    let missing: Vec<&str> = tree
        .values()
        .filter(|n| n.is_placeholder())
        .map(|n| n.id())
        .collect();
    if missing.is_empty() {
        keel_util::status::status_info(
            "Traced",
            &format!("{} dependencies, all installed", tree.len()),
        );
    } else {
        keel_util::status::status_warn(
            "Traced",
            &format!(
                "{} dependencies, {} missing: {}",
                tree.len(),
                missing.len(),
                missing.join(", ")
            ),
        );
    }
    Ok(())
}
