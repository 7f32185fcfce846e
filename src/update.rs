//! Update resolution
//!
//! Given a package name and comparator, finds the newest acceptable release
//! across the registry's distribution tags, applying exclusion filters and
//! pre-release skipping, and falls back to a satisfying in-range version when
//! the newest release leaves the comparator behind.

use std::collections::BTreeSet;

use semver::Version;
use tracing::debug;

use crate::alias::resolve_alias;
use crate::cache::CacheLookup;
use crate::comparator::is_upgradable;
use crate::config::ResolverConfig;
use crate::engine::UpdateEngine;
use crate::range::{
    RangeSpec, coerce, exceeds_every_clause, is_plain_release, matching_exclusion, parse_loose,
};
use crate::types::{Deprecation, DeprecationKind, Update, UpdateChannel, Versions};

/// Check a version against the package's exclusion filters, recording the
/// matched pattern.
fn is_excluded(version: &Version, filters: &[String], affected: &mut BTreeSet<String>) -> bool {
    if let Some(pattern) = matching_exclusion(version, filters) {
        affected.insert(pattern.to_string());
        true
    } else {
        false
    }
}

/// Whether a cached update still structurally fits the comparator: the
/// cached `latest` must still be newer than every clause, and a cached
/// `satisfies` must still satisfy.
fn cached_update_applies(cached: Option<&Update>, comparator: &str) -> bool {
    let Some(update) = cached else {
        // A cached "nothing actionable" stays valid for its TTL.
        return true;
    };
    if !exceeds_every_clause(comparator, &update.versions.latest) {
        return false;
    }
    match (&update.versions.satisfies, RangeSpec::parse(comparator)) {
        (Some(satisfies), Some(spec)) => spec.satisfies(satisfies),
        (Some(_), None) => false,
        (None, _) => true,
    }
}

/// A digit-free comparator that could plausibly name a dist-tag. Anything
/// carrying a digit is a version shape, not a tag, even when it failed the
/// upgradability check.
fn is_tag_comparator(comparator: &str) -> bool {
    !comparator.is_empty()
        && comparator
            .chars()
            .all(|c| c.is_ascii_alphabetic() || matches!(c, '-' | '_' | '.'))
}

impl UpdateEngine {
    /// Resolve whether a newer version exists for `(name, comparator)`.
    ///
    /// Returns `None` for unsupported or non-upgradable comparators, for
    /// packages already known to be deprecated, and when nothing newer than
    /// the comparator is published. Results (including negative ones) are
    /// cached per package, scoped to the comparator and the configured TTL.
    pub async fn resolve_update(&self, name: &str, comparator: &str) -> Option<Update> {
        let (name, comparator) = resolve_alias(name, comparator);
        let config = self.config();

        if self.is_known_deprecated(name, comparator, &config) {
            debug!(package = name, "skipping update check for deprecated package");
            return None;
        }

        if !is_upgradable(comparator, config.check_static_comparators) {
            if config.suggest_replacing_tags && is_tag_comparator(comparator) {
                return self.resolve_tag_pin(name, comparator, &config).await;
            }
            return None;
        }

        match self
            .cache
            .lookup_update(name, comparator, config.cache_duration_minutes)
        {
            CacheLookup::Hit(cached) => {
                if cached_update_applies(cached.as_ref(), comparator) {
                    return cached;
                }
                self.cache.evict_update(name);
            }
            CacheLookup::Miss => {}
        }

        let result = self.compute_update(name, comparator, &config).await;
        self.cache.store_update(name, comparator, result.clone());
        result
    }

    fn is_known_deprecated(&self, name: &str, comparator: &str, config: &ResolverConfig) -> bool {
        matches!(
            self.cache
                .lookup_deprecation(name, comparator, config.cache_duration_minutes),
            CacheLookup::Hit(Some(Deprecation {
                kind: DeprecationKind::Deprecated,
                ..
            }))
        )
    }

    /// Resolve a tag comparator (`latest`, `next`, ...) to the tag's current
    /// version so the caller can suggest pinning it.
    async fn resolve_tag_pin(
        &self,
        name: &str,
        tag: &str,
        config: &ResolverConfig,
    ) -> Option<Update> {
        if let CacheLookup::Hit(cached) =
            self.cache
                .lookup_update(name, tag, config.cache_duration_minutes)
        {
            return cached;
        }

        let result = self
            .registry
            .version_for_tag(name, tag)
            .await
            .and_then(|raw| parse_loose(&raw))
            .map(|version| Update {
                versions: Versions::new(version, None),
                channel: UpdateChannel::from_tag(tag),
                affected_by_filters: BTreeSet::new(),
            });
        self.cache.store_update(name, tag, result.clone());
        result
    }

    async fn compute_update(
        &self,
        name: &str,
        comparator: &str,
        config: &ResolverConfig,
    ) -> Option<Update> {
        let tags = self.registry.all_tags(name).await?;
        let baseline = coerce(comparator)?;

        // Ascending scan over the distribution tags: the first tag strictly
        // past the coerced comparator wins the channel.
        let mut tagged: Vec<(String, Version)> = tags
            .into_iter()
            .filter_map(|(tag, raw)| parse_loose(&raw).map(|version| (tag, version)))
            .collect();
        tagged.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let (tag, matched) = tagged.into_iter().find(|(_, v)| *v > baseline)?;
        if !exceeds_every_clause(comparator, &matched) {
            debug!(package = name, version = %matched, "match is inside the comparator, no update");
            return None;
        }

        let spec = RangeSpec::parse(comparator);
        let satisfies_spec = |v: &Version| spec.as_ref().is_some_and(|s| s.satisfies(v));
        let filters = config.exclusions_for(name);
        let channel = UpdateChannel::from_tag(&tag);
        let mut affected = BTreeSet::new();

        let mut latest = matched;
        let mut all_versions = None;

        let excluded = is_excluded(&latest, filters, &mut affected);
        if excluded || !is_plain_release(&latest) || !satisfies_spec(&latest) {
            // The tag match is unusable as-is; downgrade to the newest clean
            // version still past the comparator.
            let versions = self.registry.all_versions(name).await?;
            let mut fallback = None;
            for version in versions.iter().rev() {
                if is_excluded(version, filters, &mut affected) || !is_plain_release(version) {
                    continue;
                }
                if exceeds_every_clause(comparator, version) {
                    fallback = Some(version.clone());
                    break;
                }
            }
            latest = fallback?;
            all_versions = Some(versions);
        }

        let satisfies = if satisfies_spec(&latest) {
            None
        } else {
            let versions = all_versions.as_ref()?;
            let mut found = None;
            for version in versions.iter().rev() {
                if *version >= latest {
                    continue;
                }
                if *version <= baseline {
                    // Descending order: nothing below here exceeds the
                    // comparator's lower bound.
                    break;
                }
                if is_excluded(version, filters, &mut affected) || !is_plain_release(version) {
                    continue;
                }
                if satisfies_spec(version) {
                    found = Some(version.clone());
                    break;
                }
            }
            found
        };

        debug!(
            package = name,
            latest = %latest,
            satisfies = satisfies.as_ref().map(|v| v.to_string()),
            "resolved update"
        );
        Some(Update {
            versions: Versions::new(latest, satisfies),
            channel,
            affected_by_filters: affected,
        })
    }
}
