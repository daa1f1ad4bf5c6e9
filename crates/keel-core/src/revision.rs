//! Package revisions and the references they install from.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier recorded for references that carry neither tag nor digest.
pub const DEFAULT_IDENTIFIER: &str = "latest";

/// Whether a revision should be installed and dependency-valid, or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesiredState {
    #[default]
    Active,
    Inactive,
}

/// One revision of a package under resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRevision {
    /// `reference[:tag]` or `reference@digest`.
    pub package: String,
    #[serde(default, rename = "desired-state")]
    pub desired_state: DesiredState,
}

impl PackageRevision {
    pub fn new(package: &str, desired_state: DesiredState) -> Self {
        Self {
            package: package.to_string(),
            desired_state,
        }
    }

    pub fn reference(&self) -> Result<PackageReference, ReferenceError> {
        PackageReference::parse(&self.package)
    }
}

/// A package reference split into its tag-independent source and the
/// identifier (tag or digest) of the revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageReference {
    source: String,
    identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("package reference is empty")]
    Empty,
    #[error("package reference {0:?} has no repository")]
    MissingRepository(String),
    #[error("package reference {0:?} has an empty tag or digest")]
    EmptyIdentifier(String),
}

impl PackageReference {
    /// Parse `registry/org/name:tag` or `registry/org/name@sha256:...`.
    ///
    /// A colon before the last `/` belongs to a registry port, not a tag.
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let (source, identifier) = if let Some((base, digest)) = reference.split_once('@') {
            (base, Some(digest))
        } else {
            let last_slash = reference.rfind('/').map_or(0, |i| i + 1);
            match reference[last_slash..].rfind(':') {
                Some(i) => {
                    let split = last_slash + i;
                    (&reference[..split], Some(&reference[split + 1..]))
                }
                None => (reference, None),
            }
        };

        if source.is_empty() || source.ends_with('/') {
            return Err(ReferenceError::MissingRepository(reference.to_string()));
        }
        if identifier.is_some_and(str::is_empty) {
            return Err(ReferenceError::EmptyIdentifier(reference.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            identifier: identifier.map(str::to_string),
        })
    }

    /// The tag- and digest-free reference used as the lock key.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The tag or digest, defaulting to [`DEFAULT_IDENTIFIER`].
    pub fn identifier(&self) -> &str {
        self.identifier.as_deref().unwrap_or(DEFAULT_IDENTIFIER)
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            Some(id) if id.contains(':') => write!(f, "{}@{id}", self.source),
            Some(id) => write!(f, "{}:{id}", self.source),
            None => f.write_str(&self.source),
        }
    }
}
