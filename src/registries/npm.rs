//! npm registry client
//!
//! Queries one or more npm-compatible registries over the standard endpoints:
//! the packument (`GET /{name}`) for versions, dist-tags and modification
//! times, and the version document (`GET /{name}/{selector}`) for per-release
//! data such as deprecation notices. Registries are tried in the order they
//! were supplied; the first one that answers wins.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use semver::Version;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::FETCH_TIMEOUT;
use crate::error::RegistryError;
use crate::range::parse_loose;
use crate::registry::RegistryClient;

/// Default base URL for the public npm registry.
const DEFAULT_BASE_URL: &str = "https://registry.npmjs.org";

/// Full package metadata, reduced to the fields resolution needs.
#[derive(Debug, Deserialize)]
struct Packument {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
    /// Publish timestamps per version, plus `created` and `modified`.
    #[serde(default)]
    time: HashMap<String, String>,
}

/// Metadata for a single release, addressed by version, range or dist-tag.
#[derive(Debug, Deserialize)]
struct VersionDocument {
    #[serde(default)]
    version: Option<String>,
    /// A string reason, or occasionally a bare boolean.
    #[serde(default)]
    deprecated: Option<serde_json::Value>,
}

/// [`RegistryClient`] implementation for npm-compatible registries.
pub struct NpmRegistryClient {
    client: reqwest::Client,
    base_urls: Vec<Url>,
}

impl NpmRegistryClient {
    /// Create a client over an ordered list of registry base URLs, as
    /// produced by an earlier registry-discovery step. An empty list falls
    /// back to the public npm registry; unparsable URLs are dropped.
    pub fn new(base_urls: Vec<String>) -> Self {
        let mut parsed: Vec<Url> = base_urls
            .iter()
            .filter_map(|raw| match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(url = raw, error = %e, "skipping unparsable registry URL");
                    None
                }
            })
            .collect();
        if parsed.is_empty() {
            parsed.push(Url::parse(DEFAULT_BASE_URL).expect("default registry URL is valid"));
        }

        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("npm-update-core/", env!("CARGO_PKG_VERSION")))
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("failed to create HTTP client"),
            base_urls: parsed,
        }
    }

    /// Append path segments to a base URL. Segments are percent-encoded, so
    /// scoped names (`@scope/name`) and range selectors come out right.
    fn with_segments(base: &Url, segments: &[&str]) -> Option<Url> {
        let mut url = base.clone();
        {
            let mut parts = url.path_segments_mut().ok()?;
            parts.pop_if_empty();
            for segment in segments {
                parts.push(segment);
            }
        }
        Some(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, RegistryError> {
        let mut last_error = RegistryError::InvalidResponse("no registry answered".to_string());
        for base in &self.base_urls {
            let Some(url) = Self::with_segments(base, segments) else {
                continue;
            };
            match self.fetch_one(url).await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    async fn fetch_one<T: DeserializeOwned>(&self, url: Url) -> Result<T, RegistryError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(RegistryError::InvalidResponse(format!(
                "unexpected status {status} from {url}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }

    async fn packument(&self, name: &str) -> Result<Packument, RegistryError> {
        self.get_json(&[name]).await
    }

    async fn version_document(
        &self,
        name: &str,
        selector: &str,
    ) -> Result<VersionDocument, RegistryError> {
        self.get_json(&[name, selector]).await
    }
}

/// Log a registry failure and absorb it into an absent result.
fn absorb<T>(result: Result<T, RegistryError>, name: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(package = name, error = %e, "registry query failed");
            None
        }
    }
}

#[async_trait::async_trait]
impl RegistryClient for NpmRegistryClient {
    async fn latest_version(&self, name: &str) -> Option<Version> {
        let document = absorb(self.version_document(name, "latest").await, name)?;
        parse_loose(&document.version?)
    }

    async fn all_versions(&self, name: &str) -> Option<Vec<Version>> {
        let packument = absorb(self.packument(name).await, name)?;
        let mut versions: Vec<Version> = packument
            .versions
            .into_keys()
            .filter_map(|v| Version::parse(&v).ok())
            .collect();
        versions.sort();
        Some(versions)
    }

    async fn all_tags(&self, name: &str) -> Option<HashMap<String, String>> {
        let packument = absorb(self.packument(name).await, name)?;
        Some(packument.dist_tags)
    }

    async fn version_for_tag(&self, name: &str, tag: &str) -> Option<String> {
        absorb(self.version_document(name, tag).await, name)?.version
    }

    async fn deprecation_reason(&self, name: &str, selector: &str) -> Option<String> {
        let document = absorb(self.version_document(name, selector).await, name)?;
        match document.deprecated? {
            serde_json::Value::String(reason) if !reason.trim().is_empty() => Some(reason),
            serde_json::Value::Bool(true) => Some("This version has been deprecated".to_string()),
            _ => None,
        }
    }

    async fn last_modified(&self, name: &str) -> Option<DateTime<Utc>> {
        let packument = absorb(self.packument(name).await, name)?;
        let raw = packument.time.get("modified")?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
            Err(e) => {
                // A malformed timestamp must not produce a false
                // unmaintained flag; treat the package as maintained.
                warn!(package = name, error = %e, "malformed modification timestamp");
                None
            }
        }
    }
}
