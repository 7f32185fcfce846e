//! Registry client trait, the engine's only I/O seam

use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, Utc};
use semver::Version;

/// Read-only queries against a package registry.
///
/// All calls are idempotent and may fail; a failure is signaled as an absent
/// result, never an error propagating into resolver logic. Implementations
/// are expected to bound each request with a timeout so one hung call cannot
/// stall a whole batch.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// The version currently published under the `latest` dist-tag.
    async fn latest_version(&self, name: &str) -> Option<Version>;

    /// Every published version, ascending; unparsable versions are skipped.
    async fn all_versions(&self, name: &str) -> Option<Vec<Version>>;

    /// All dist-tags, mapping tag name to version string.
    async fn all_tags(&self, name: &str) -> Option<HashMap<String, String>>;

    /// The version string currently published under one dist-tag.
    async fn version_for_tag(&self, name: &str, tag: &str) -> Option<String>;

    /// The deprecation reason for the release matching `selector`, which may
    /// be a concrete version, a range, or a dist-tag. `None` means the
    /// release is not deprecated (or the query failed).
    async fn deprecation_reason(&self, name: &str, selector: &str) -> Option<String>;

    /// When the package was last modified (usually its last release).
    async fn last_modified(&self, name: &str) -> Option<DateTime<Utc>>;
}
