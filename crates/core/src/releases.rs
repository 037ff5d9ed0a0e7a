//! ComfyUI release/tag discovery and caching
//!
//! Fetched tag lists are cached for the lifetime of the composition root and
//! only replaced wholesale via an explicit `refresh`, never behind the
//! caller's back. The cache is an injected object, not a module singleton.

use crate::backend::ComfyBackend;
use crate::errors::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wire shape of the tag listing collaborator: release name to image tag,
/// newest release first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTags {
    /// Ordered map of release name to full image tag
    pub tags: IndexMap<String, String>,
}

/// Normalize a fetched tag map into the selector's release list: `latest`
/// synthesized as the first entry, duplicates dropped, fetched order kept.
pub fn normalize_releases(tags: &ImageTags) -> Vec<String> {
    let mut releases = vec!["latest".to_string()];
    for release in tags.tags.keys() {
        if release != "latest" {
            releases.push(release.clone());
        }
    }
    releases
}

/// Resolve a selected branch to a concrete release: `latest` means the
/// newest concrete release, falling back to the literal `latest` when the
/// list holds nothing else.
pub fn resolve_release(branch: &str, releases: &[String]) -> String {
    if branch == "latest" {
        releases
            .iter()
            .find(|r| r.as_str() != "latest")
            .cloned()
            .unwrap_or_else(|| "latest".to_string())
    } else {
        branch.to_string()
    }
}

/// Page-lifetime cache of the release list.
///
/// Owned by the composition root and passed to whichever dialog needs the
/// selector; read-mostly, overwritten wholesale on refresh.
#[derive(Debug, Default)]
pub struct ReleaseCache {
    releases: Option<Vec<String>>,
}

impl ReleaseCache {
    /// Empty cache; the first `get_or_fetch` populates it
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached releases, fetching through the backend on first use
    pub async fn get_or_fetch<B: ComfyBackend>(&mut self, backend: &B) -> Result<&[String]> {
        if self.releases.is_none() {
            let tags = backend.image_tags().await?;
            let releases = normalize_releases(&tags);
            debug!("Fetched {} ComfyUI releases", releases.len());
            self.releases = Some(releases);
        }
        Ok(self.releases.as_deref().unwrap_or_default())
    }

    /// Discard the cached list and fetch a fresh one
    pub async fn refresh<B: ComfyBackend>(&mut self, backend: &B) -> Result<&[String]> {
        self.releases = None;
        self.get_or_fetch(backend).await
    }

    /// Cached releases without fetching
    pub fn cached(&self) -> Option<&[String]> {
        self.releases.as_deref()
    }
}
