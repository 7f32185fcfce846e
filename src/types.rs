//! Resolution result types shared across the engine

use std::collections::BTreeSet;

use semver::Version;

/// The versions an update resolves to.
///
/// `latest` is the newest acceptable release overall; `satisfies`, when
/// present, is the newest release that still matches the original comparator.
/// Invariant: `satisfies` is always distinct from and lower than `latest`,
/// and always satisfies the comparator; `latest` need not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versions {
    pub latest: Version,
    pub satisfies: Option<Version>,
}

impl Versions {
    pub fn new(latest: Version, satisfies: Option<Version>) -> Self {
        Self { latest, satisfies }
    }
}

/// The registry distribution tag that produced a matched version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UpdateChannel {
    /// The `latest` dist-tag, the normal release line.
    #[default]
    Latest,
    /// Any other dist-tag (`next`, `beta`, ...).
    Other(String),
}

impl UpdateChannel {
    /// Build a channel from a dist-tag name.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "latest" {
            UpdateChannel::Latest
        } else {
            UpdateChannel::Other(tag.to_string())
        }
    }
}

/// A resolved, actionable update for a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub versions: Versions,
    pub channel: UpdateChannel,
    /// Exclusion-filter patterns that caused a version to be skipped while
    /// resolving this update.
    pub affected_by_filters: BTreeSet<String>,
}

/// How a package came to be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeprecationKind {
    /// The registry carries an explicit deprecation reason.
    Deprecated,
    /// Inferred from long release inactivity; never registry-supplied.
    Unmaintained,
}

/// A package suggested as a substitute for a deprecated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub name: String,
    pub version: Version,
}

/// A resolved deprecation (or abandonment) for a single package.
///
/// `Unmaintained` results never carry a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub kind: DeprecationKind,
    pub reason: String,
    pub replacement: Option<Replacement>,
}
