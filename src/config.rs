use std::collections::HashSet;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default lifetime of a cached resolution result, in minutes.
pub const DEFAULT_CACHE_DURATION_MINUTES: u64 = 60;

/// Timeout applied to every registry request (30 seconds).
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of days without a release before a package counts as
/// unmaintained.
pub const DEFAULT_UNMAINTAINED_DAYS: u32 = 365;

// =============================================================================
// Concurrency constants
// =============================================================================

/// Upper bound on scan parallelism. A cap at this value disables the
/// admission gate entirely.
pub const MAX_PARALLELISM: usize = 64;

/// Default number of resolution tasks allowed in flight during a scan.
pub const DEFAULT_MAX_PARALLELISM: usize = 8;

/// Resolution-time configuration, typically deserialized from the editor
/// integration's settings payload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverConfig {
    /// How long a cached result stays valid, in minutes.
    pub cache_duration_minutes: u64,
    /// Maximum number of resolution tasks in flight during a scan.
    pub max_parallelism: usize,
    /// Version patterns to skip during resolution, per package name.
    /// Patterns use the comparator grammar (`*` excludes everything,
    /// `x`/`X` act as wildcards).
    pub excluded_versions: IndexMap<String, Vec<String>>,
    /// Packages never flagged as unmaintained.
    pub excluded_unmaintained_packages: HashSet<String>,
    /// Days without a release before a package counts as unmaintained.
    /// 0 disables the check.
    pub unmaintained_days: u32,
    /// Resolve digit-free tag comparators (`latest`, `next`, ...) to the
    /// tag's current version so callers can suggest pinning them.
    pub suggest_replacing_tags: bool,
    /// Treat fully static comparators (`1.2.3`) as upgradable.
    pub check_static_comparators: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_duration_minutes: DEFAULT_CACHE_DURATION_MINUTES,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
            excluded_versions: IndexMap::new(),
            excluded_unmaintained_packages: HashSet::new(),
            unmaintained_days: DEFAULT_UNMAINTAINED_DAYS,
            suggest_replacing_tags: false,
            check_static_comparators: false,
        }
    }
}

impl ResolverConfig {
    /// Exclusion patterns configured for a package, if any.
    pub fn exclusions_for(&self, name: &str) -> &[String] {
        self.excluded_versions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The effective scan parallelism, clamped to `1..=MAX_PARALLELISM`.
    pub fn effective_parallelism(&self) -> usize {
        self.max_parallelism.clamp(1, MAX_PARALLELISM)
    }
}
