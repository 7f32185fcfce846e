//! Deprecation and unmaintained-package resolution
//!
//! Determines why a package is deprecated, extracts a suggested replacement
//! from the registry's free-text reason, and separately flags packages that
//! look abandoned based on release inactivity.

use chrono::{Duration, Utc};
use tracing::debug;

use crate::alias::resolve_alias;
use crate::cache::CacheLookup;
use crate::comparator::is_upgradable;
use crate::config::ResolverConfig;
use crate::engine::UpdateEngine;
use crate::types::{Deprecation, DeprecationKind, Replacement};

/// Package-name candidates in a deprecation reason, in original word order.
///
/// A whitespace token survives (after trailing `,`/`;`/`.` stripping) when it
/// is a scoped name with exactly one `/`, or an unscoped fully-lowercase name
/// containing a `-`. URLs, backtick or markdown leftovers and plain prose
/// fail the character whitelist.
fn replacement_candidates(reason: &str) -> Vec<String> {
    reason
        .split_whitespace()
        .map(|word| word.trim_end_matches([',', ';', '.']))
        .filter(|word| looks_like_package_name(word))
        .map(str::to_string)
        .collect()
}

fn looks_like_package_name(word: &str) -> bool {
    let valid = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.');

    if let Some(rest) = word.strip_prefix('@') {
        let Some((scope, name)) = rest.split_once('/') else {
            return false;
        };
        return !scope.is_empty()
            && !name.is_empty()
            && !name.contains('/')
            && scope.chars().all(valid)
            && name.chars().all(valid);
    }

    !word.is_empty() && !word.contains('/') && word.contains('-') && word.chars().all(valid)
}

impl UpdateEngine {
    /// Resolve whether `(name, comparator)` points at a deprecated or
    /// abandoned release.
    ///
    /// The "is the latest release deprecated too" probe re-queries the
    /// registry with the `latest` selector; registries whose version-scoped
    /// and unversioned deprecation answers collapse will simply never take
    /// the targeted-upgrade branch.
    pub async fn resolve_deprecation(&self, name: &str, comparator: &str) -> Option<Deprecation> {
        let (name, comparator) = resolve_alias(name, comparator);
        let config = self.config();

        if !is_upgradable(comparator, config.check_static_comparators) {
            return None;
        }

        // The lookup also drops any stale entry before recomputation.
        if let CacheLookup::Hit(cached) =
            self.cache
                .lookup_deprecation(name, comparator, config.cache_duration_minutes)
        {
            return cached;
        }

        let result = self.compute_deprecation(name, comparator, &config).await;
        self.cache.store_deprecation(name, comparator, result.clone());
        result
    }

    async fn compute_deprecation(
        &self,
        name: &str,
        comparator: &str,
        config: &ResolverConfig,
    ) -> Option<Deprecation> {
        let Some(reason) = self.registry.deprecation_reason(name, comparator).await else {
            return self.check_unmaintained(name, config).await;
        };

        // When only the release in use is deprecated, the fix is an upgrade
        // within the same package, not a replacement from the reason text.
        if self
            .registry
            .deprecation_reason(name, "latest")
            .await
            .is_none()
            && let Some(latest) = self.registry.latest_version(name).await
        {
            debug!(package = name, %latest, "only the resolved version is deprecated");
            return Some(Deprecation {
                kind: DeprecationKind::Deprecated,
                reason: format!("This version is deprecated, upgrade to {latest}"),
                replacement: Some(Replacement {
                    name: name.to_string(),
                    version: latest,
                }),
            });
        }

        let replacement = self.find_replacement(&reason).await;
        Some(Deprecation {
            kind: DeprecationKind::Deprecated,
            reason,
            replacement,
        })
    }

    /// Infer abandonment from release inactivity. A missing or malformed
    /// timestamp counts as maintained.
    async fn check_unmaintained(
        &self,
        name: &str,
        config: &ResolverConfig,
    ) -> Option<Deprecation> {
        if config.unmaintained_days == 0
            || config.excluded_unmaintained_packages.contains(name)
        {
            return None;
        }

        let modified = self.registry.last_modified(name).await?;
        let age = Utc::now() - modified;
        if age <= Duration::days(config.unmaintained_days as i64) {
            return None;
        }

        debug!(package = name, days = age.num_days(), "package looks unmaintained");
        Some(Deprecation {
            kind: DeprecationKind::Unmaintained,
            reason: format!(
                "Package looks unmaintained: last release was {} days ago",
                age.num_days()
            ),
            replacement: None,
        })
    }

    /// Confirm replacement candidates against the registry, concurrently,
    /// keeping the textually-first candidate that eventually succeeds, not
    /// the first lookup to return.
    async fn find_replacement(&self, reason: &str) -> Option<Replacement> {
        let candidates = replacement_candidates(reason);
        if candidates.is_empty() {
            return None;
        }

        let lookups = candidates.iter().map(|c| self.registry.latest_version(c));
        let resolved = futures::future::join_all(lookups).await;

        candidates
            .into_iter()
            .zip(resolved)
            .find_map(|(name, version)| version.map(|version| Replacement { name, version }))
    }
}
