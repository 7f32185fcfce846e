//! Engine façade and scan orchestration
//!
//! `UpdateEngine` owns the registry client, the result cache and the
//! configuration, and runs batches of resolutions under a bounded-parallelism
//! admission gate. One engine per logical project; independent engines share
//! nothing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tracing::info;

use crate::alias::resolve_alias;
use crate::cache::ScanCache;
use crate::config::{MAX_PARALLELISM, ResolverConfig};
use crate::registry::RegistryClient;
use crate::types::{Deprecation, Update};

/// Live progress counters for the current scan, safe to read from outside
/// the engine while a scan runs.
#[derive(Debug, Default)]
pub struct ScanProgress {
    total: AtomicUsize,
    scanned: AtomicUsize,
}

impl ScanProgress {
    fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.scanned.store(0, Ordering::SeqCst);
    }

    fn mark_scanned(&self) {
        self.scanned.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of packages in the current batch.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of packages resolved so far.
    pub fn scanned(&self) -> usize {
        self.scanned.load(Ordering::SeqCst)
    }
}

/// The update and deprecation resolution engine.
pub struct UpdateEngine {
    pub(crate) registry: Arc<dyn RegistryClient>,
    pub(crate) cache: ScanCache,
    config: RwLock<ResolverConfig>,
    progress: ScanProgress,
}

impl UpdateEngine {
    pub fn new(registry: Arc<dyn RegistryClient>, config: ResolverConfig) -> Self {
        Self {
            registry,
            cache: ScanCache::new(),
            config: RwLock::new(config),
            progress: ScanProgress::default(),
        }
    }

    /// A snapshot of the current configuration; resolution works on the
    /// snapshot so a mid-scan settings change cannot tear a single result.
    pub(crate) fn config(&self) -> ResolverConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the configuration. Cached results were computed under the old
    /// settings, so both caches are dropped.
    pub fn set_config(&self, config: ResolverConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        self.cache.clear();
    }

    /// Drop all cached results regardless of TTL.
    pub fn invalidate_cache(&self) {
        self.cache.clear();
    }

    /// Progress counters for the scan in flight (or the last one).
    pub fn progress(&self) -> &ScanProgress {
        &self.progress
    }

    /// The admission gate for a scan. A cap at `MAX_PARALLELISM` means
    /// unbounded dispatch, no gate at all.
    fn admission_gate(&self, config: &ResolverConfig) -> Option<Arc<Semaphore>> {
        let cap = config.effective_parallelism();
        (cap < MAX_PARALLELISM).then(|| Arc::new(Semaphore::new(cap)))
    }

    /// Resolve updates for a whole batch of `(name, comparator)` pairs.
    ///
    /// Returns only packages with an actionable update, keyed by the
    /// caller's original names; packages that are current, unsupported or
    /// unreachable are omitted. Cache entries for packages absent from the
    /// batch are evicted first.
    pub async fn scan_updates(&self, pairs: &[(String, String)]) -> IndexMap<String, Update> {
        let keep: HashSet<String> = pairs
            .iter()
            .map(|(name, comparator)| resolve_alias(name, comparator).0.to_string())
            .collect();
        self.cache.retain_updates(&keep);

        let config = self.config();
        let gate = self.admission_gate(&config);
        self.progress.begin(pairs.len());
        info!(packages = pairs.len(), "scanning for updates");

        let tasks = pairs.iter().map(|(name, comparator)| {
            let gate = gate.clone();
            async move {
                let _permit = match gate.as_ref() {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                let update = self.resolve_update(name, comparator).await;
                self.progress.mark_scanned();
                (name, update)
            }
        });

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter_map(|(name, update)| update.map(|u| (name.clone(), u)))
            .collect()
    }

    /// Deprecation counterpart of [`scan_updates`](Self::scan_updates):
    /// returns only packages with a non-null deprecation.
    pub async fn scan_deprecations(
        &self,
        pairs: &[(String, String)],
    ) -> IndexMap<String, Deprecation> {
        let keep: HashSet<String> = pairs
            .iter()
            .map(|(name, comparator)| resolve_alias(name, comparator).0.to_string())
            .collect();
        self.cache.retain_deprecations(&keep);

        let config = self.config();
        let gate = self.admission_gate(&config);
        self.progress.begin(pairs.len());
        info!(packages = pairs.len(), "scanning for deprecations");

        let tasks = pairs.iter().map(|(name, comparator)| {
            let gate = gate.clone();
            async move {
                let _permit = match gate.as_ref() {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                let deprecation = self.resolve_deprecation(name, comparator).await;
                self.progress.mark_scanned();
                (name, deprecation)
            }
        });

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter_map(|(name, deprecation)| deprecation.map(|d| (name.clone(), d)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MockRegistryClient;
    use std::collections::HashMap;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(n, c)| (n.to_string(), c.to_string()))
            .collect()
    }

    fn latest_tag(version: &str) -> HashMap<String, String> {
        HashMap::from([("latest".to_string(), version.to_string())])
    }

    #[tokio::test]
    async fn scan_returns_only_actionable_updates() {
        let mut mock = MockRegistryClient::new();
        mock.expect_all_tags()
            .withf(|name| name == "outdated")
            .returning(|_| Some(latest_tag("1.9.0")));
        mock.expect_all_tags()
            .withf(|name| name == "current")
            .returning(|_| Some(latest_tag("1.0.0")));

        let engine = UpdateEngine::new(Arc::new(mock), ResolverConfig::default());
        let results = engine
            .scan_updates(&pairs(&[
                ("outdated", "^1.0.0"),
                ("current", "^1.0.0"),
                ("tagged", "latest"), // unsupported, never queried
            ]))
            .await;

        assert_eq!(results.len(), 1);
        assert!(results.contains_key("outdated"));
    }

    #[tokio::test]
    async fn progress_counters_track_the_batch() {
        let mut mock = MockRegistryClient::new();
        mock.expect_all_tags()
            .returning(|_| Some(latest_tag("1.9.0")));

        let engine = UpdateEngine::new(Arc::new(mock), ResolverConfig::default());
        engine
            .scan_updates(&pairs(&[("a", "^1.0.0"), ("b", "^1.0.0")]))
            .await;

        assert_eq!(engine.progress().total(), 2);
        assert_eq!(engine.progress().scanned(), 2);
    }

    #[tokio::test]
    async fn rescan_drops_cache_entries_for_packages_no_longer_listed() {
        let mut mock = MockRegistryClient::new();
        // "gone" is resolved once in the first scan; after it leaves the
        // batch and returns, its entry must be recomputed.
        mock.expect_all_tags()
            .times(3)
            .returning(|_| Some(latest_tag("1.9.0")));

        let engine = UpdateEngine::new(Arc::new(mock), ResolverConfig::default());
        engine
            .scan_updates(&pairs(&[("kept", "^1.0.0"), ("gone", "^1.0.0")]))
            .await;
        engine.scan_updates(&pairs(&[("kept", "^1.0.0")])).await;
        engine
            .scan_updates(&pairs(&[("kept", "^1.0.0"), ("gone", "^1.0.0")]))
            .await;
    }

    #[tokio::test]
    async fn set_config_invalidates_cached_results() {
        let mut mock = MockRegistryClient::new();
        mock.expect_all_tags()
            .times(2)
            .returning(|_| Some(latest_tag("1.9.0")));

        let engine = UpdateEngine::new(Arc::new(mock), ResolverConfig::default());
        assert!(engine.resolve_update("pkg", "^1.0.0").await.is_some());

        engine.set_config(ResolverConfig::default());
        assert!(engine.resolve_update("pkg", "^1.0.0").await.is_some());
    }

    #[tokio::test]
    async fn scan_deprecations_reports_only_flagged_packages() {
        let mut mock = MockRegistryClient::new();
        mock.expect_deprecation_reason()
            .withf(|name, _| name == "dead")
            .returning(|_, _| Some("use alive-pkg instead".to_string()));
        mock.expect_deprecation_reason()
            .withf(|name, _| name == "fine")
            .returning(|_, _| None);
        mock.expect_latest_version()
            .withf(|name| name == "alive-pkg")
            .returning(|_| Some(semver::Version::new(3, 0, 0)));
        mock.expect_last_modified()
            .returning(|_| Some(chrono::Utc::now()));

        let engine = UpdateEngine::new(Arc::new(mock), ResolverConfig::default());
        let results = engine
            .scan_deprecations(&pairs(&[("dead", "^1.0.0"), ("fine", "^1.0.0")]))
            .await;

        assert_eq!(results.len(), 1);
        let deprecation = &results["dead"];
        assert_eq!(
            deprecation.replacement.as_ref().map(|r| r.name.as_str()),
            Some("alive-pkg")
        );
    }
}
