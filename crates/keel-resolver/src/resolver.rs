//! Reconcile one package revision's desired state against the lock.
//!
//! A resolution rebuilds the dependency graph from the lock, registers or
//! removes the revision's own lock entry, and then checks that the
//! revision's transitive dependencies are installed and that its direct
//! dependencies satisfy their version constraints.

use keel_core::lockfile::{Dependency, Lock, LockPackage};
use keel_core::meta::PackageMeta;
use keel_core::revision::{DesiredState, PackageRevision};
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::constraint;
use crate::graph::{Dag, DeclaredDependencies, DependencyGraph, GraphError, Linker, Node};
use crate::store::{LockStore, StoreError};

/// Best-effort dependency counts for one resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DependencyCounts {
    /// Size of the transitive closure of the revision's package.
    pub total: usize,
    /// Closure members backed by an installed package.
    pub installed: usize,
    /// Direct dependencies whose installed version violates their constraint.
    pub invalid: usize,
}

impl DependencyCounts {
    pub fn missing(&self) -> usize {
        self.total.saturating_sub(self.installed)
    }
}

/// Why a resolution failed.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("cannot get lock: {source}")]
    #[diagnostic(help("the lock store could not be read; retry once it is reachable"))]
    GetLock { source: StoreError },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error("missing dependencies: {}", .missing.join(", "))]
    #[diagnostic(help("install the missing packages, then resolve again"))]
    MissingDependencies {
        missing: Vec<String>,
        counts: DependencyCounts,
    },

    #[error("incompatible dependencies: {}", .invalid.join(", "))]
    #[diagnostic(help("installed versions do not satisfy the declared constraints"))]
    IncompatibleDependencies {
        invalid: Vec<String>,
        counts: DependencyCounts,
    },
}

impl ResolveError {
    /// Counts at the point of failure; all zero unless dependencies were
    /// examined.
    pub fn counts(&self) -> DependencyCounts {
        match self {
            Self::MissingDependencies { counts, .. }
            | Self::IncompatibleDependencies { counts, .. } => *counts,
            _ => DependencyCounts::default(),
        }
    }

    /// Whether calling resolve again without other changes may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GetLock { .. } | Self::Store(_))
    }
}

/// Builds a fresh graph for each resolution.
pub type DagFactory<D> = Box<dyn Fn() -> D + Send + Sync>;

/// Resolves package revisions against a lock store.
pub struct Resolver<S, D = DependencyGraph> {
    store: S,
    new_dag: DagFactory<D>,
}

impl<S: LockStore> Resolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            new_dag: Box::new(DependencyGraph::new),
        }
    }
}

impl<S: LockStore, D: Dag> Resolver<S, D> {
    /// Use `new_dag` instead of [`DependencyGraph`] for every resolution.
    pub fn with_dag(store: S, new_dag: impl Fn() -> D + Send + Sync + 'static) -> Self {
        Self {
            store,
            new_dag: Box::new(new_dag),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconcile `revision` against the lock.
    ///
    /// An active revision missing from the lock is registered before its
    /// dependencies are checked, and stays registered if the check fails.
    pub async fn resolve(
        &self,
        meta: &PackageMeta,
        revision: &PackageRevision,
    ) -> Result<DependencyCounts, ResolveError> {
        let declared = meta
            .depends_on()
            .ok_or_else(|| ResolveError::InvalidInput {
                message: format!("unrecognised package metadata kind {}", meta.kind()),
            })?;

        let mut lock = self
            .store
            .get()
            .await
            .map_err(|source| ResolveError::GetLock { source })?;

        let mut dag = (self.new_dag)();
        let nodes = lock.packages.iter().cloned().map(Node::Resolved).collect();
        let linkers: [&dyn Linker; 1] = [&DeclaredDependencies];
        let implied = dag.init(nodes, &linkers)?;
        tracing::debug!(
            "lock revision {} has {} packages, {} unresolved references",
            lock.revision,
            lock.packages.len(),
            implied.len()
        );

        let reference = revision
            .reference()
            .map_err(|e| ResolveError::InvalidInput {
                message: e.to_string(),
            })?;
        let source = reference.source().to_string();

        if revision.desired_state == DesiredState::Inactive {
            return self.deactivate(&mut lock, &source).await;
        }

        let dependencies = declared
            .iter()
            .map(Dependency::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ResolveError::InvalidInput {
                message: e.to_string(),
            })?;
        let me = LockPackage {
            source: source.clone(),
            version: reference.identifier().to_string(),
            dependencies,
        };

        if !lock.contains(&source) {
            // Another package may already reference us as a placeholder.
            if !dag.node_exists(&source) {
                dag.add_node(Node::Resolved(me.clone()))?;
            }
            dag.add_or_update_nodes(vec![Node::Resolved(me.clone())])?;
            lock.packages.push(me.clone());
            self.persist(&lock).await?;
            tracing::info!("registered {source} at {} in lock", me.version);
        }

        let tree = dag.trace_node(&source)?;
        let mut installed = tree.values().filter(|n| !n.is_placeholder()).count();
        let mut missing: Vec<String> = tree
            .values()
            .filter(|n| n.is_placeholder())
            .map(|n| n.id().to_string())
            .collect();

        // The lock entry for self may predate the metadata and leave direct
        // dependencies outside the closure.
        let mut undeclared: Vec<&str> = me
            .dependencies
            .iter()
            .map(|d| d.package.as_str())
            .filter(|p| *p != source && !tree.contains_key(*p))
            .collect();
        undeclared.sort_unstable();
        undeclared.dedup();
        for package in undeclared {
            match dag.get_node(package) {
                Ok(node) if !node.is_placeholder() => installed += 1,
                Ok(_) | Err(GraphError::NodeNotFound { .. }) => missing.push(package.to_string()),
                Err(e) => return Err(e.into()),
            }
        }
        missing.sort();

        let mut counts = DependencyCounts {
            total: installed + missing.len(),
            installed,
            invalid: 0,
        };
        if !missing.is_empty() {
            tracing::debug!("{source}: {} of {} dependencies missing", missing.len(), counts.total);
            return Err(ResolveError::MissingDependencies { missing, counts });
        }

        let mut invalid = Vec::new();
        for dep in &me.dependencies {
            let Some(wanted) = dep.constraint() else {
                continue;
            };
            let installed = match dag.get_node(&dep.package) {
                Ok(node) => node.version(),
                Err(GraphError::NodeNotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            };
            let compatible = installed.is_some_and(|v| constraint::is_compatible(wanted, v));
            tracing::debug!(
                "{source}: {} {} against {wanted}: {}",
                dep.package,
                installed.unwrap_or("<none>"),
                if compatible { "ok" } else { "incompatible" }
            );
            if !compatible {
                invalid.push(dep.package.clone());
            }
        }
        invalid.sort();
        invalid.dedup();

        counts.invalid = invalid.len();
        if !invalid.is_empty() {
            return Err(ResolveError::IncompatibleDependencies { invalid, counts });
        }
        Ok(counts)
    }

    async fn deactivate(
        &self,
        lock: &mut Lock,
        source: &str,
    ) -> Result<DependencyCounts, ResolveError> {
        let dependents: Vec<String> = lock
            .dependents_of(source)
            .into_iter()
            .map(|p| p.source.clone())
            .collect();
        if lock.remove(source).is_none() {
            tracing::debug!("{source} is inactive and absent from lock");
            return Ok(DependencyCounts::default());
        }
        if !dependents.is_empty() {
            tracing::warn!(
                "removing {source} from lock while {} still depend on it",
                dependents.join(", ")
            );
        }

        self.persist(lock).await?;
        tracing::info!("removed {source} from lock");
        Ok(DependencyCounts::default())
    }

    async fn persist(&self, lock: &Lock) -> Result<(), ResolveError> {
        self.store.update(lock).await.map_err(|e| {
            if e.is_conflict() {
                tracing::warn!("lock changed during resolution: {e}");
            }
            ResolveError::Store(e)
        })
    }
}
