//! Package metadata: the dependencies a package declares before it is
//! confirmed installed.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lockfile::{Dependency, PackageType};

/// Package metadata, tagged by `kind`.
///
/// Unrecognised kinds deserialize to [`PackageMeta::Unknown`] so callers can
/// reject them explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PackageMeta {
    Configuration(MetaSpec),
    Provider(MetaSpec),
    Function(MetaSpec),
    #[serde(other)]
    Unknown,
}

/// Fields shared by every metadata kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "depends-on")]
    pub depends_on: Vec<MetaDependency>,
}

/// A declared dependency. Exactly one of the reference fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaDependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A metadata dependency entry that cannot be turned into a [`Dependency`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    #[error("dependency declares no provider, configuration or function reference")]
    NoReference,
    #[error("dependency declares more than one reference: {}", .0.join(", "))]
    MultipleReferences(Vec<String>),
}

impl PackageMeta {
    /// Load and parse a metadata file.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| keel_util::errors::KeelError::Metadata {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        Self::parse_toml(&content).map_err(|e| {
            keel_util::errors::KeelError::Metadata {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    pub fn parse_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The metadata body, or `None` for an unrecognised kind.
    pub fn spec(&self) -> Option<&MetaSpec> {
        match self {
            Self::Configuration(spec) | Self::Provider(spec) | Self::Function(spec) => Some(spec),
            Self::Unknown => None,
        }
    }

    /// Declared dependencies, or `None` for an unrecognised kind.
    pub fn depends_on(&self) -> Option<&[MetaDependency]> {
        self.spec().map(|s| s.depends_on.as_slice())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration",
            Self::Provider(_) => "Provider",
            Self::Function(_) => "Function",
            Self::Unknown => "Unknown",
        }
    }
}

impl MetaDependency {
    pub fn provider(package: &str) -> Self {
        Self {
            provider: Some(package.to_string()),
            ..Default::default()
        }
    }

    pub fn configuration(package: &str) -> Self {
        Self {
            configuration: Some(package.to_string()),
            ..Default::default()
        }
    }

    pub fn function(package: &str) -> Self {
        Self {
            function: Some(package.to_string()),
            ..Default::default()
        }
    }

    /// Attach a version constraint.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }
}

impl TryFrom<&MetaDependency> for Dependency {
    type Error = MetaError;

    fn try_from(dep: &MetaDependency) -> Result<Self, Self::Error> {
        let refs: Vec<(PackageType, &String)> = [
            (PackageType::Provider, dep.provider.as_ref()),
            (PackageType::Configuration, dep.configuration.as_ref()),
            (PackageType::Function, dep.function.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, r)| r.map(|r| (kind, r)))
        .collect();

        match refs.as_slice() {
            [] => Err(MetaError::NoReference),
            [(kind, package)] => Ok(Dependency {
                package: (*package).clone(),
                kind: *kind,
                version: dep
                    .version
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            }),
            many => Err(MetaError::MultipleReferences(
                many.iter().map(|(_, r)| (*r).clone()).collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reference_maps_to_type() {
        let dep = Dependency::try_from(
            &MetaDependency::provider("crossplane/provider-aws").with_version(">=v0.1.0"),
        )
        .unwrap();
        assert_eq!(dep.package, "crossplane/provider-aws");
        assert_eq!(dep.kind, PackageType::Provider);
        assert_eq!(dep.version.as_deref(), Some(">=v0.1.0"));
    }

    #[test]
    fn empty_version_is_dropped() {
        let dep =
            Dependency::try_from(&MetaDependency::function("org/fn-a").with_version("")).unwrap();
        assert_eq!(dep.kind, PackageType::Function);
        assert!(dep.version.is_none());
    }

    #[test]
    fn no_reference_is_rejected() {
        let err = Dependency::try_from(&MetaDependency::default()).unwrap_err();
        assert_eq!(err, MetaError::NoReference);
    }

    #[test]
    fn multiple_references_are_rejected() {
        let mut entry = MetaDependency::provider("org/a");
        entry.configuration = Some("org/b".into());
        let err = Dependency::try_from(&entry).unwrap_err();
        assert_eq!(
            err,
            MetaError::MultipleReferences(vec!["org/a".into(), "org/b".into()])
        );
    }

    #[test]
    fn unknown_kind_has_no_dependencies() {
        let meta = PackageMeta::parse_toml("kind = \"Composition\"\n").unwrap();
        assert!(matches!(meta, PackageMeta::Unknown));
        assert!(meta.depends_on().is_none());
    }
}
