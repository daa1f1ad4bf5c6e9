use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Ledger of installed packages and the dependency edges they declare.
///
/// Entries are keyed uniquely by [`LockPackage::source`]. `revision` is the
/// optimistic-concurrency token checked by lock stores on write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    #[serde(default)]
    pub revision: u64,
    #[serde(default, rename = "package")]
    pub packages: Vec<LockPackage>,
}

/// A single installed package with the dependencies it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPackage {
    /// Package reference without tag or digest.
    pub source: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

/// A dependency edge: the referenced package, its kind and an optional
/// version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub package: String,
    #[serde(rename = "type")]
    pub kind: PackageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The kind of package a dependency refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Provider,
    Configuration,
    Function,
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Provider => "provider",
            Self::Configuration => "configuration",
            Self::Function => "function",
        };
        f.write_str(s)
    }
}

impl Dependency {
    /// The version constraint, treating an empty string as absent.
    pub fn constraint(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

impl Lock {
    /// Load and parse a lock file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| keel_util::errors::KeelError::Lock {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        Self::parse_toml(&content).map_err(|e| {
            keel_util::errors::KeelError::Lock {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Parse a lock from TOML text.
    pub fn parse_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize the lock to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Look up an installed package by its source.
    pub fn find(&self, source: &str) -> Option<&LockPackage> {
        self.packages.iter().find(|p| p.source == source)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.find(source).is_some()
    }

    /// Remove the entry for `source`, returning it if it was present.
    pub fn remove(&mut self, source: &str) -> Option<LockPackage> {
        let pos = self.packages.iter().position(|p| p.source == source)?;
        Some(self.packages.remove(pos))
    }

    /// Packages that declare a dependency on `source`.
    pub fn dependents_of(&self, source: &str) -> Vec<&LockPackage> {
        self.packages
            .iter()
            .filter(|p| p.dependencies.iter().any(|d| d.package == source))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(package: &str, version: Option<&str>) -> Dependency {
        Dependency {
            package: package.to_string(),
            kind: PackageType::Provider,
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn empty_constraint_is_none() {
        assert_eq!(dep("a", Some("  ")).constraint(), None);
        assert_eq!(dep("a", None).constraint(), None);
        assert_eq!(dep("a", Some(">=v1.0.0")).constraint(), Some(">=v1.0.0"));
    }

    #[test]
    fn remove_returns_entry() {
        let mut lock = Lock {
            revision: 3,
            packages: vec![
                LockPackage {
                    source: "org/a".into(),
                    version: "v1.0.0".into(),
                    dependencies: vec![dep("org/b", None)],
                },
                LockPackage {
                    source: "org/b".into(),
                    version: "v0.2.0".into(),
                    dependencies: vec![],
                },
            ],
        };
        assert!(lock.contains("org/b"));
        assert_eq!(lock.dependents_of("org/b").len(), 1);

        let removed = lock.remove("org/b").unwrap();
        assert_eq!(removed.version, "v0.2.0");
        assert!(!lock.contains("org/b"));
        assert!(lock.remove("org/b").is_none());
        assert_eq!(lock.revision, 3);
    }

    #[test]
    fn package_type_display() {
        assert_eq!(PackageType::Configuration.to_string(), "configuration");
        assert_eq!(PackageType::Function.to_string(), "function");
    }
}
