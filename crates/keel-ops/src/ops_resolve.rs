//! Operation: resolve one package revision against the lock file.

use std::path::{Path, PathBuf};

use keel_core::meta::PackageMeta;
use keel_core::revision::{DesiredState, PackageRevision};
use keel_resolver::{DependencyCounts, FileLockStore, ResolveError, Resolver};
use keel_util::errors::{KeelError, KeelResult};
use serde::Serialize;

/// Options for `keel resolve`.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Package metadata file.
    pub meta: PathBuf,
    /// Package reference, `source[:tag]` or `source@digest`.
    pub package: String,
    /// Resolve the revision as inactive, removing it from the lock.
    pub inactive: bool,
    /// Print a JSON report on stdout instead of status lines.
    pub json: bool,
}

/// Machine-readable outcome of one resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub package: String,
    pub desired_state: &'static str,
    #[serde(flatten)]
    pub counts: DependencyCounts,
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveReport {
    fn new(revision: &PackageRevision, outcome: &Result<DependencyCounts, ResolveError>) -> Self {
        let desired_state = match revision.desired_state {
            DesiredState::Active => "active",
            DesiredState::Inactive => "inactive",
        };
        let (counts, missing, invalid, error) = match outcome {
            Ok(counts) => (*counts, vec![], vec![], None),
            Err(e) => {
                let (missing, invalid) = match e {
                    ResolveError::MissingDependencies { missing, .. } => (missing.clone(), vec![]),
                    ResolveError::IncompatibleDependencies { invalid, .. } => {
                        (vec![], invalid.clone())
                    }
                    _ => (vec![], vec![]),
                };
                (e.counts(), missing, invalid, Some(e.to_string()))
            }
        };
        Self {
            package: revision.package.clone(),
            desired_state,
            counts,
            missing,
            invalid,
            error,
        }
    }
}

/// Resolve the revision described by `opts` against the lock at `lock_path`.
pub async fn resolve(lock_path: &Path, opts: &ResolveOptions) -> KeelResult<DependencyCounts> {
    let meta = PackageMeta::from_path(&opts.meta)?;
    let state = if opts.inactive {
        DesiredState::Inactive
    } else {
        DesiredState::Active
    };
    let revision = PackageRevision::new(&opts.package, state);

    tracing::debug!(
        "resolving {} ({:?}) against {}",
        revision.package,
        state,
        lock_path.display()
    );
    let resolver = Resolver::new(FileLockStore::new(lock_path));
    let outcome = resolver.resolve(&meta, &revision).await;

    let report = ResolveReport::new(&revision, &outcome);
    if opts.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| KeelError::Generic {
            message: format!("Failed to serialize report: {e}"),
        })?;
        println!("{json}");
    } else {
        print_report(&report);
    }

    outcome.map_err(into_report)
}

/// Dependency problems become [`KeelError::Resolution`]; everything else
/// keeps its own diagnostic.
fn into_report(err: ResolveError) -> miette::Report {
    match err {
        ResolveError::MissingDependencies { .. } | ResolveError::IncompatibleDependencies { .. } => {
            KeelError::Resolution {
                message: err.to_string(),
            }
            .into()
        }
        other => miette::Report::new(other),
    }
}

fn print_report(report: &ResolveReport) {
    use keel_util::status::{status, status_error, status_warn};

    let counts = &report.counts;
    let summary = format!(
        "{}: {} of {} dependencies installed, {} invalid",
        report.package, counts.installed, counts.total, counts.invalid
    );
    match &report.error {
        None if report.desired_state == "inactive" => status("Removed", &report.package),
        None => status("Resolved", &summary),
        Some(_) if !report.missing.is_empty() || !report.invalid.is_empty() => {
            status_warn("Unresolved", &summary);
            for id in &report.missing {
                status_warn("Missing", id);
            }
            for id in &report.invalid {
                status_warn("Invalid", id);
            }
        }
        Some(_) => status_error("Failed", &report.package),
    }
}
