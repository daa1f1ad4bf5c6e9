//! Version constraint parsing and compatibility checks.
//!
//! A constraint is one or more alternatives separated by `||`. Each
//! alternative is a list of terms separated by commas or whitespace, and
//! every term must hold:
//!
//! - `=`, `==`, `!=`, `>`, `>=`, `<`, `<=`, `~`, `^` followed by a version
//! - a bare version, which means an exact match
//! - `*` / `x`, which matches any release
//!
//! Versions may carry a leading `v` and may be partial (`1`, `1.2`, `1.x`).
//! Ordering and pre-release precedence follow semantic versioning.

use semver::{Comparator, Version, VersionReq};
use thiserror::Error;

const OPERATORS: [&str; 9] = ["==", "!=", ">=", "<=", "=", ">", "<", "~", "^"];

/// Why a constraint or version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("version constraint is empty")]
    Empty,
    #[error("invalid constraint term {term:?}: {message}")]
    InvalidTerm { term: String, message: String },
    #[error("invalid version {version:?}: {message}")]
    InvalidVersion { version: String, message: String },
}

/// A parsed version constraint.
#[derive(Debug, Clone)]
pub struct Constraint {
    alternatives: Vec<Alternative>,
}

/// One `||` branch: a semver requirement plus any `!=` exclusions.
#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<Version>,
}

impl Alternative {
    fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.iter().any(|v| v == version)
    }
}

impl Constraint {
    pub fn parse(expr: &str) -> Result<Self, ConstraintError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(ConstraintError::Empty);
        }

        let alternatives = trimmed
            .split("||")
            .map(parse_alternative)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { alternatives })
    }

    /// Whether `version` satisfies any alternative.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alt| alt.matches(version))
    }

    /// Whether the installed version string satisfies this constraint.
    ///
    /// An unparsable version never satisfies anything.
    pub fn check(&self, installed: &str) -> bool {
        parse_version(installed).is_ok_and(|v| self.matches(&v))
    }
}

/// Whether `installed` satisfies `constraint`.
///
/// A malformed constraint or version is reported as incompatible rather
/// than as an error.
pub fn is_compatible(constraint: &str, installed: &str) -> bool {
    match Constraint::parse(constraint) {
        Ok(c) => c.check(installed),
        Err(e) => {
            tracing::debug!("constraint {constraint:?} rejected: {e}");
            false
        }
    }
}

/// Parse an installed version, accepting a leading `v` and padding
/// partial `major[.minor]` versions with zeros.
pub fn parse_version(version: &str) -> Result<Version, ConstraintError> {
    let raw = strip_v(version.trim());
    if raw.is_empty() {
        return Err(ConstraintError::InvalidVersion {
            version: version.to_string(),
            message: "empty version".to_string(),
        });
    }

    match Version::parse(raw) {
        Ok(v) => Ok(v),
        Err(e) => {
            let parts: Vec<&str> = raw.split('.').collect();
            let numeric = parts
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
            if numeric && parts.len() < 3 {
                let mut padded = parts.clone();
                padded.resize(3, "0");
                if let Ok(v) = Version::parse(&padded.join(".")) {
                    return Ok(v);
                }
            }
            Err(ConstraintError::InvalidVersion {
                version: version.to_string(),
                message: e.to_string(),
            })
        }
    }
}

fn parse_alternative(text: &str) -> Result<Alternative, ConstraintError> {
    let terms = split_terms(text);
    if terms.is_empty() {
        return Err(ConstraintError::Empty);
    }

    let mut alt = Alternative {
        req: VersionReq {
            comparators: Vec::new(),
        },
        excluded: Vec::new(),
    };

    for term in terms {
        let (op, rest) = split_operator(&term);
        let rest = strip_v(rest.trim());
        if rest.is_empty() {
            return Err(ConstraintError::InvalidTerm {
                term,
                message: "missing version".to_string(),
            });
        }

        match op {
            "!=" => {
                let v = Version::parse(rest).map_err(|e| ConstraintError::InvalidTerm {
                    term: term.clone(),
                    message: e.to_string(),
                })?;
                alt.excluded.push(v);
            }
            "" if is_wildcard(rest) => {}
            "" if rest.split('.').any(is_wildcard) => {
                let cmp = Comparator::parse(rest).map_err(|e| ConstraintError::InvalidTerm {
                    term: term.clone(),
                    message: e.to_string(),
                })?;
                alt.req.comparators.push(cmp);
            }
            _ => {
                // A bare version is an exact match, not semver's default caret.
                let op = match op {
                    "" | "==" => "=",
                    other => other,
                };
                let cmp = Comparator::parse(&format!("{op}{rest}")).map_err(|e| {
                    ConstraintError::InvalidTerm {
                        term: term.clone(),
                        message: e.to_string(),
                    }
                })?;
                alt.req.comparators.push(cmp);
            }
        }
    }

    Ok(alt)
}

/// Split an alternative into terms, rejoining an operator written apart
/// from its version (`>= 1.2`).
fn split_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for chunk in text.split(',') {
        let mut pending = String::new();
        for token in chunk.split_whitespace() {
            pending.push_str(token);
            if token.chars().all(|c| "=!<>~^".contains(c)) {
                continue;
            }
            terms.push(std::mem::take(&mut pending));
        }
        if !pending.is_empty() {
            terms.push(pending);
        }
    }
    terms
}

fn split_operator(term: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = term.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", term)
}

fn strip_v(s: &str) -> &str {
    s.strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s)
}

fn is_wildcard(s: &str) -> bool {
    matches!(s, "*" | "x" | "X")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greater_or_equal_with_v_prefix() {
        assert!(is_compatible(">=v0.1.0", "v0.20.0"));
        assert!(is_compatible(">=v0.1.0", "v0.100.1"));
        assert!(is_compatible(">=v0.1.0", "v0.1.0"));
        assert!(!is_compatible(">=v0.1.0", "v0.0.1"));
    }

    #[test]
    fn bare_version_is_exact() {
        assert!(is_compatible("v1.2.3", "1.2.3"));
        assert!(!is_compatible("v1.2.3", "1.2.4"));
        assert!(!is_compatible("1.2.3", "1.3.0"));
    }

    #[test]
    fn range_with_comma_and_spaces() {
        let c = Constraint::parse(">= 1.2, < 2.0").unwrap();
        assert!(c.check("1.2.0"));
        assert!(c.check("v1.9.9"));
        assert!(!c.check("2.0.0"));
        assert!(!c.check("1.1.9"));

        let c = Constraint::parse(">=1.2 <2").unwrap();
        assert!(c.check("1.5.0"));
        assert!(!c.check("2.0.0"));
    }

    #[test]
    fn alternatives() {
        let c = Constraint::parse("<1.0.0 || >=3.0.0").unwrap();
        assert!(c.check("0.9.0"));
        assert!(c.check("3.1.0"));
        assert!(!c.check("2.0.0"));
    }

    #[test]
    fn tilde_and_caret() {
        assert!(is_compatible("~1.2.3", "1.2.9"));
        assert!(!is_compatible("~1.2.3", "1.3.0"));
        assert!(is_compatible("^0.2.1", "0.2.5"));
        assert!(!is_compatible("^0.2.1", "0.3.0"));
    }

    #[test]
    fn not_equal() {
        let c = Constraint::parse(">=1.0.0, !=1.4.0").unwrap();
        assert!(c.check("1.3.0"));
        assert!(!c.check("1.4.0"));
        assert!(c.check("1.4.1"));
    }

    #[test]
    fn wildcards() {
        assert!(is_compatible("*", "4.5.6"));
        assert!(is_compatible("1.x", "1.9.0"));
        assert!(!is_compatible("1.x", "2.0.0"));
    }

    #[test]
    fn prerelease_precedence() {
        assert!(is_compatible(">=1.0.0-alpha.1", "1.0.0-beta"));
        assert!(is_compatible(">=1.0.0-alpha.1", "1.0.0"));
        assert!(!is_compatible(">=1.0.0", "1.0.0-rc.1"));
        assert!(!is_compatible(">=1.0.0", "2.0.0-rc.1"));
    }

    #[test]
    fn partial_installed_versions_are_padded() {
        assert_eq!(parse_version("v1.2").unwrap(), Version::new(1, 2, 0));
        assert_eq!(parse_version("3").unwrap(), Version::new(3, 0, 0));
    }

    #[test]
    fn malformed_inputs_are_incompatible() {
        assert!(!is_compatible("", "1.0.0"));
        assert!(!is_compatible(">=", "1.0.0"));
        assert!(!is_compatible(">=banana", "1.0.0"));
        assert!(!is_compatible(">=1.0.0", ""));
        assert!(!is_compatible(">=1.0.0", "latest"));
        assert!(!is_compatible(">=1.0.0", "sha256:abc"));
    }

    #[test]
    fn parse_errors_are_typed() {
        assert!(matches!(Constraint::parse("  "), Err(ConstraintError::Empty)));
        assert!(matches!(
            Constraint::parse(">=1.0 ||"),
            Err(ConstraintError::Empty)
        ));
        assert!(matches!(
            Constraint::parse("!=1.x"),
            Err(ConstraintError::InvalidTerm { .. })
        ));
    }
}
