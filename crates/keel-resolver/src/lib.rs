//! Dependency resolution engine: package graph with placeholder nodes,
//! transitive tracing, version constraint checks, and lock reconciliation.

pub mod constraint;
pub mod graph;
pub mod resolver;
pub mod store;

pub use resolver::{DependencyCounts, ResolveError, Resolver};
pub use store::{FileLockStore, LockStore, MemoryLockStore, StoreError};
