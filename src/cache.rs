//! Per-scan result cache
//!
//! One entry per package and result kind, scoped to the comparator that
//! produced it and to a configurable TTL. The cache is an explicitly owned
//! object held by the engine, shared across concurrent resolution tasks;
//! there is no process-global state.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::types::{Deprecation, Update};

/// A cached resolution outcome. `data: None` records "resolved, nothing
/// actionable" so a clean package is not re-queried within the TTL either.
#[derive(Debug, Clone, PartialEq)]
struct CacheEntry<T> {
    data: Option<T>,
    added_at: DateTime<Utc>,
    comparator: String,
}

impl<T> CacheEntry<T> {
    fn is_valid(&self, comparator: &str, ttl_minutes: u64) -> bool {
        self.comparator == comparator
            && Utc::now() - self.added_at < Duration::minutes(ttl_minutes as i64)
    }
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// A valid entry exists; its payload may itself be an absent result.
    Hit(Option<T>),
    /// No entry, or the entry was stale and has been evicted.
    Miss,
}

type Shard<T> = RwLock<HashMap<String, CacheEntry<T>>>;

/// Independent update and deprecation result maps, keyed by package name.
#[derive(Debug, Default)]
pub struct ScanCache {
    updates: Shard<Update>,
    deprecations: Shard<Deprecation>,
}

fn read<T>(shard: &Shard<T>) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<T>>> {
    shard.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(shard: &Shard<T>) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<T>>> {
    shard.write().unwrap_or_else(PoisonError::into_inner)
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup_update(
        &self,
        name: &str,
        comparator: &str,
        ttl_minutes: u64,
    ) -> CacheLookup<Update> {
        Self::lookup(&self.updates, name, comparator, ttl_minutes)
    }

    pub fn lookup_deprecation(
        &self,
        name: &str,
        comparator: &str,
        ttl_minutes: u64,
    ) -> CacheLookup<Deprecation> {
        Self::lookup(&self.deprecations, name, comparator, ttl_minutes)
    }

    fn lookup<T: Clone>(
        shard: &Shard<T>,
        name: &str,
        comparator: &str,
        ttl_minutes: u64,
    ) -> CacheLookup<T> {
        if let Some(entry) = read(shard).get(name) {
            if entry.is_valid(comparator, ttl_minutes) {
                return CacheLookup::Hit(entry.data.clone());
            }
        } else {
            return CacheLookup::Miss;
        }

        // Stale or comparator mismatch: evict, re-checking under the write
        // lock since another task may have refreshed the entry meanwhile.
        let mut entries = write(shard);
        match entries.get(name) {
            Some(entry) if entry.is_valid(comparator, ttl_minutes) => {
                CacheLookup::Hit(entry.data.clone())
            }
            Some(_) => {
                debug!(package = name, "evicting stale cache entry");
                entries.remove(name);
                CacheLookup::Miss
            }
            None => CacheLookup::Miss,
        }
    }

    /// Store an update result, keeping the existing timestamp when the value
    /// has not changed since the last resolution.
    pub fn store_update(&self, name: &str, comparator: &str, data: Option<Update>) {
        Self::store(&self.updates, name, comparator, data);
    }

    /// Store a deprecation result; same replace-if-different policy.
    pub fn store_deprecation(&self, name: &str, comparator: &str, data: Option<Deprecation>) {
        Self::store(&self.deprecations, name, comparator, data);
    }

    fn store<T: PartialEq>(shard: &Shard<T>, name: &str, comparator: &str, data: Option<T>) {
        let mut entries = write(shard);
        if let Some(existing) = entries.get(name)
            && existing.comparator == comparator
            && existing.data == data
        {
            return;
        }
        entries.insert(
            name.to_string(),
            CacheEntry {
                data,
                added_at: Utc::now(),
                comparator: comparator.to_string(),
            },
        );
    }

    /// Drop the update entry for one package, forcing recomputation.
    pub fn evict_update(&self, name: &str) {
        write(&self.updates).remove(name);
    }

    /// Drop update entries for packages absent from the current batch.
    pub fn retain_updates(&self, names: &HashSet<String>) {
        write(&self.updates).retain(|name, _| names.contains(name));
    }

    /// Drop deprecation entries for packages absent from the current batch.
    pub fn retain_deprecations(&self, names: &HashSet<String>) {
        write(&self.deprecations).retain(|name, _| names.contains(name));
    }

    /// Remove all entries regardless of TTL. Used when settings that affect
    /// resolution change.
    pub fn clear(&self) {
        write(&self.updates).clear();
        write(&self.deprecations).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UpdateChannel, Versions};
    use semver::Version;
    use std::collections::BTreeSet;

    fn update(latest: &str) -> Update {
        Update {
            versions: Versions::new(Version::parse(latest).unwrap(), None),
            channel: UpdateChannel::Latest,
            affected_by_filters: BTreeSet::new(),
        }
    }

    #[test]
    fn round_trip_within_ttl_returns_identical_value() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));

        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 60),
            CacheLookup::Hit(Some(update("18.2.0")))
        );
    }

    #[test]
    fn negative_results_are_cached_too() {
        let cache = ScanCache::new();
        cache.store_update("react", "^18.0.0", None);

        assert_eq!(
            cache.lookup_update("react", "^18.0.0", 60),
            CacheLookup::Hit(None)
        );
    }

    #[test]
    fn comparator_change_evicts_and_misses() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));

        assert_eq!(
            cache.lookup_update("react", "^18.0.0", 60),
            CacheLookup::Miss
        );
        // The stale entry is gone even for the original comparator now.
        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 60),
            CacheLookup::Miss
        );
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));

        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 0),
            CacheLookup::Miss
        );
    }

    #[test]
    fn store_keeps_timestamp_when_value_unchanged() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));
        let first = read(&cache.updates).get("react").unwrap().added_at;

        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));
        let second = read(&cache.updates).get("react").unwrap().added_at;
        assert_eq!(first, second);

        cache.store_update("react", "^17.0.0", Some(update("18.3.0")));
        let third = read(&cache.updates).get("react").unwrap().added_at;
        assert!(third >= second);
        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 60),
            CacheLookup::Hit(Some(update("18.3.0")))
        );
    }

    #[test]
    fn retain_drops_packages_missing_from_batch() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));
        cache.store_update("lodash", "^4.0.0", Some(update("4.17.21")));

        let keep: HashSet<String> = ["react".to_string()].into();
        cache.retain_updates(&keep);

        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 60),
            CacheLookup::Hit(Some(update("18.2.0")))
        );
        assert_eq!(
            cache.lookup_update("lodash", "^4.0.0", 60),
            CacheLookup::Miss
        );
    }

    #[test]
    fn clear_removes_everything() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));
        cache.store_deprecation(
            "request",
            "^2.0.0",
            Some(Deprecation {
                kind: crate::types::DeprecationKind::Deprecated,
                reason: "request has been deprecated".to_string(),
                replacement: None,
            }),
        );

        cache.clear();

        assert_eq!(
            cache.lookup_update("react", "^17.0.0", 60),
            CacheLookup::Miss
        );
        assert_eq!(
            cache.lookup_deprecation("request", "^2.0.0", 60),
            CacheLookup::Miss
        );
    }

    #[test]
    fn update_and_deprecation_shards_are_independent() {
        let cache = ScanCache::new();
        cache.store_update("react", "^17.0.0", Some(update("18.2.0")));

        assert_eq!(
            cache.lookup_deprecation("react", "^17.0.0", 60),
            CacheLookup::Miss
        );
    }
}
