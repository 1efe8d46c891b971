//! Effective endpoint resolution.
//!
//! The base URL to query comes from an ordered chain of strategies: a
//! well-known per-user endpoint file first, then the stored preference.
//! The first strategy that yields a URL wins. Resolution is performed fresh
//! on every call — nothing is cached between calls.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

/// File name of the endpoint artifact inside the data directory.
pub const ENDPOINT_FILE: &str = "endpoint.json";

/// Preference key holding the fallback base URL.
pub const API_URL_KEY: &str = "api-url";

/// Where a resolved endpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    /// The endpoint file.
    Auto,
    /// The stored preference value.
    Preference,
}

impl fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointSource::Auto => write!(f, "auto"),
            EndpointSource::Preference => write!(f, "preference"),
        }
    }
}

/// A resolved endpoint. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointInfo {
    pub url: String,
    pub source: EndpointSource,
}

/// Shape of the endpoint file: a JSON object with at least a `url` field.
#[derive(Debug, Deserialize)]
struct EndpointArtifact {
    url: Option<String>,
}

pub struct EndpointResolver {
    artifact_path: PathBuf,
    store: Arc<dyn KeyValueStore>,
}

impl EndpointResolver {
    pub fn new(artifact_path: PathBuf, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            artifact_path,
            store,
        }
    }

    /// Produce the effective base URL, or [`Error::NotConfigured`] when no
    /// strategy yields one.
    pub async fn resolve(&self) -> Result<EndpointInfo> {
        for source in [EndpointSource::Auto, EndpointSource::Preference] {
            if let Some(info) = self.try_source(source).await {
                return Ok(info);
            }
        }
        Err(Error::NotConfigured)
    }

    /// Non-throwing variant for display-only contexts.
    pub async fn resolve_opt(&self) -> Option<EndpointInfo> {
        self.resolve().await.ok()
    }

    async fn try_source(&self, source: EndpointSource) -> Option<EndpointInfo> {
        let url = match source {
            EndpointSource::Auto => self.read_artifact().await,
            EndpointSource::Preference => self.read_preference().await,
        }?;
        Some(EndpointInfo { url, source })
    }

    /// Read the endpoint file. A missing file, unreadable content, or a
    /// malformed body all fall through to the next strategy — none of them
    /// is an error condition.
    async fn read_artifact(&self) -> Option<String> {
        let content = match tokio::fs::read_to_string(&self.artifact_path).await {
            Ok(content) => content,
            Err(err) => {
                debug!(
                    path = %self.artifact_path.display(),
                    "endpoint file unavailable: {}", err
                );
                return None;
            }
        };
        let artifact: EndpointArtifact = match serde_json::from_str(&content) {
            Ok(artifact) => artifact,
            Err(err) => {
                debug!("endpoint file malformed, falling through: {}", err);
                return None;
            }
        };
        artifact.url.filter(|url| !url.trim().is_empty())
    }

    async fn read_preference(&self) -> Option<String> {
        self.store
            .get(API_URL_KEY)
            .await
            .ok()
            .flatten()
            .filter(|url| !url.trim().is_empty())
    }
}
