//! Core data types for keel.
//!
//! This crate defines the records the dependency engine consumes and
//! produces: the lock ledger of installed packages, package metadata with
//! its declared dependencies, package revisions with their desired state,
//! and user configuration.
//!
//! No async code and no graph logic live here.

/// Name of the lock file used when nothing else is configured.
pub const DEFAULT_LOCK_FILE: &str = "Keel.lock";

pub mod config;
pub mod lockfile;
pub mod meta;
pub mod revision;
