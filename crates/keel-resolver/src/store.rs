//! Lock persistence boundary.
//!
//! The resolver reads the lock once and writes it at most once per call.
//! Stores detect stale writes through [`Lock::revision`]: an update is
//! accepted only when the caller's revision matches the stored one.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use keel_core::lockfile::Lock;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by a [`LockStore`].
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("lock was modified concurrently (expected revision {expected}, found {found})")]
    #[diagnostic(help("re-run resolution against the current lock"))]
    Conflict { expected: u64, found: u64 },

    #[error("cannot access lock at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse lock at {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize lock: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("lock store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Whether the write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Fetch and persist the lock.
///
/// Callers bound the time spent here by dropping the future (for example
/// with `tokio::time::timeout`); stores add no timeout of their own.
pub trait LockStore: Send + Sync {
    fn get(&self) -> impl Future<Output = Result<Lock, StoreError>> + Send;

    /// Persist `lock`, failing with [`StoreError::Conflict`] when the stored
    /// revision no longer matches `lock.revision`.
    fn update(&self, lock: &Lock) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-process lock store.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    lock: Mutex<Lock>,
}

impl MemoryLockStore {
    pub fn new(lock: Lock) -> Self {
        Self {
            lock: Mutex::new(lock),
        }
    }

    /// A copy of the currently stored lock.
    pub fn snapshot(&self) -> Lock {
        self.lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LockStore for MemoryLockStore {
    async fn get(&self) -> Result<Lock, StoreError> {
        Ok(self.snapshot())
    }

    async fn update(&self, lock: &Lock) -> Result<(), StoreError> {
        let mut current = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if current.revision != lock.revision {
            return Err(StoreError::Conflict {
                expected: lock.revision,
                found: current.revision,
            });
        }
        let mut next = lock.clone();
        next.revision += 1;
        *current = next;
        Ok(())
    }
}

/// Lock store backed by a TOML lock file.
///
/// A missing file reads as an empty lock at revision 0. Writes go through a
/// temporary file and a rename.
#[derive(Debug)]
pub struct FileLockStore {
    path: PathBuf,
    write: tokio::sync::Mutex<()>,
}

impl FileLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Lock, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no lock at {}, starting empty", self.path.display());
                return Ok(Lock::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Lock::parse_toml(&content).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl LockStore for FileLockStore {
    async fn get(&self) -> Result<Lock, StoreError> {
        self.read().await
    }

    async fn update(&self, lock: &Lock) -> Result<(), StoreError> {
        let _guard = self.write.lock().await;

        let current = self.read().await?;
        if current.revision != lock.revision {
            return Err(StoreError::Conflict {
                expected: lock.revision,
                found: current.revision,
            });
        }

        let mut next = lock.clone();
        next.revision += 1;
        let content = next.to_string_pretty()?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            keel_util::fs::write_atomic(&path, content.as_bytes())
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|r| r)
        .map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
