//! HTTP client for the project index backends.
//!
//! One [`IndexClient`] speaks all three backend flavors. Each public
//! operation detects the flavor from the base URL, issues the flavor's wire
//! contract, and returns canonical types. Operations are idempotent,
//! side-effect-free on caller state, and cancellable by dropping the
//! returned future; retry policy belongs to the caller.
//!
//! Timeouts: 10 seconds for validation probes and write calls, 30 seconds
//! for full project fetches. A timeout surfaces as [`Error::Network`].

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::flavor::Flavor;
use crate::models::{
    normalize_custom, normalize_supabase, MetaInfo, MetaResponse, Project, ProjectsEnvelope,
};

/// Timeout for validation probes and touch writes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for full project fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Columns requested from the Supabase table. This pins the canonical
/// schema; rows carrying a stored `url` column are still normalized when a
/// backend returns one.
const SUPABASE_SELECT: &str = "id,title,created_at,last_confirmed_at";

pub struct IndexClient {
    http: Client,
    api_key: Option<String>,
}

impl IndexClient {
    /// Build a client. `api_key` is attached to write-style calls only.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let http = Client::builder().build().map_err(Error::Network)?;
        Ok(Self { http, api_key })
    }

    /// Probe the endpoint for compatibility.
    ///
    /// Custom API: `GET <base>/meta`, requiring a JSON body with a non-empty
    /// `version`. Supabase REST: `HEAD <base>/projects?select=count` with
    /// `Prefer: count=exact`, reading the total from `Content-Range`. Edge
    /// functions have no probe and are treated as always valid.
    pub async fn validate(&self, base_url: &str) -> Result<MetaInfo> {
        let base = parse_base(base_url)?;
        match Flavor::detect(base_url) {
            Flavor::CustomApi => self.validate_custom(&base).await,
            Flavor::SupabaseRest => self.validate_supabase(&base).await,
            Flavor::EdgeFunction => Ok(MetaInfo {
                version: "1.0.0".to_string(),
                name: Some("Supabase Edge Function".to_string()),
                project_count: None,
            }),
        }
    }

    /// Fetch and normalize the full project list.
    pub async fn fetch_projects(&self, base_url: &str) -> Result<Vec<Project>> {
        let base = parse_base(base_url)?;
        match Flavor::detect(base_url) {
            Flavor::CustomApi => self.fetch_custom(&base).await,
            Flavor::SupabaseRest => self.fetch_supabase(&base).await,
            Flavor::EdgeFunction => self.fetch_edge_function(&base).await,
        }
    }

    /// Queue a touch for a project so the backend can bump it server-side.
    ///
    /// Supabase-specific write: inserts into the `touch_queue` table next to
    /// `projects`, authenticated with the configured `apikey`.
    pub async fn touch_project(&self, base_url: &str, project_id: &str) -> Result<()> {
        let base = parse_base(base_url)?;
        let url = sibling_url(&base, "touch_queue");
        debug!(%url, "queueing project touch");

        let mut request = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .header("Prefer", "return=minimal")
            .timeout(PROBE_TIMEOUT)
            .json(&serde_json::json!({ "project_id": project_id }));

        if let Some(key) = &self.api_key {
            request = request
                .header("apikey", key)
                .header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(Error::from_request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.as_u16()));
        }
        Ok(())
    }

    async fn validate_custom(&self, base: &Url) -> Result<MetaInfo> {
        let url = append_segment(base, "meta");
        debug!(%url, "validating custom API");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(Error::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.as_u16()));
        }

        let meta: MetaResponse = response.json().await.map_err(Error::from_request)?;
        meta.into_meta()
    }

    async fn validate_supabase(&self, base: &Url) -> Result<MetaInfo> {
        let mut url = append_segment(base, "projects");
        url.query_pairs_mut().append_pair("select", "count");
        debug!(%url, "probing Supabase row count");

        let response = self
            .http
            .head(url)
            .header(ACCEPT, "application/json")
            .header("Prefer", "count=exact")
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(Error::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.as_u16()));
        }

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(Error::InvalidResponse)?;

        Ok(MetaInfo {
            version: "1.0.0".to_string(),
            name: Some("Supabase Project Index".to_string()),
            project_count: Some(total),
        })
    }

    async fn fetch_custom(&self, base: &Url) -> Result<Vec<Project>> {
        let url = append_segment(base, "projects");
        let envelope: ProjectsEnvelope = self.fetch_json(url).await?;
        Ok(normalize_custom(envelope.projects))
    }

    async fn fetch_supabase(&self, base: &Url) -> Result<Vec<Project>> {
        let mut url = append_segment(base, "projects");
        url.query_pairs_mut()
            .append_pair("select", SUPABASE_SELECT)
            .append_pair("order", "title.asc");
        let rows: Vec<serde_json::Value> = self.fetch_json(url).await?;
        Ok(normalize_supabase(rows))
    }

    async fn fetch_edge_function(&self, base: &Url) -> Result<Vec<Project>> {
        // Edge functions serve custom-API-shaped records as a bare array.
        let url = append_segment(base, "projects");
        let records: Vec<serde_json::Value> = self.fetch_json(url).await?;
        Ok(normalize_custom(records))
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "fetching projects");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(Error::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(status.as_u16()));
        }

        response.json().await.map_err(Error::from_request)
    }
}

/// Parse and structurally validate a base URL: absolute, http(s), with a
/// host. Anything else is [`Error::InvalidUrl`] before a request is issued.
pub fn parse_base(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url.trim()).map_err(|_| Error::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(Error::InvalidUrl),
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl);
    }
    Ok(url)
}

/// Append a path segment unless the base already ends with it, normalizing
/// any trailing slash first.
fn append_segment(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    let trimmed = url.path().trim_end_matches('/').to_string();
    if trimmed.ends_with(&format!("/{}", segment)) {
        url.set_path(&trimmed);
    } else {
        url.set_path(&format!("{}/{}", trimmed, segment));
    }
    url
}

/// Build a URL for a resource that sits beside `projects` under the same
/// root (e.g. the touch queue table).
fn sibling_url(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    let mut path = url.path().trim_end_matches('/').to_string();
    if let Some(root) = path.strip_suffix("/projects") {
        path = root.to_string();
    }
    url.set_path(&format!("{}/{}", path, segment));
    url
}

/// Extract the total from a `Content-Range` header value (`"<range>/<total>"`).
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_accepts_http_and_https() {
        assert!(parse_base("https://x.test/rest/v1").is_ok());
        assert!(parse_base("http://localhost:8080").is_ok());
    }

    #[test]
    fn parse_base_rejects_garbage() {
        assert!(matches!(parse_base("not a url"), Err(Error::InvalidUrl)));
        assert!(matches!(parse_base("ftp://x.test"), Err(Error::InvalidUrl)));
        assert!(matches!(parse_base("https://"), Err(Error::InvalidUrl)));
    }

    #[test]
    fn append_segment_respects_trailing_slash() {
        let base = Url::parse("https://x.test/api/").unwrap();
        assert_eq!(
            append_segment(&base, "meta").as_str(),
            "https://x.test/api/meta"
        );

        let bare = Url::parse("https://x.test/api").unwrap();
        assert_eq!(
            append_segment(&bare, "meta").as_str(),
            "https://x.test/api/meta"
        );
    }

    #[test]
    fn append_segment_skips_existing_suffix() {
        let base = Url::parse("https://x.test/rest/v1/projects").unwrap();
        assert_eq!(
            append_segment(&base, "projects").as_str(),
            "https://x.test/rest/v1/projects"
        );
    }

    #[test]
    fn append_segment_on_bare_host() {
        let base = Url::parse("https://x.test").unwrap();
        assert_eq!(
            append_segment(&base, "projects").as_str(),
            "https://x.test/projects"
        );
    }

    #[test]
    fn sibling_url_replaces_projects_suffix() {
        let base = Url::parse("https://x.test/rest/v1/projects").unwrap();
        assert_eq!(
            sibling_url(&base, "touch_queue").as_str(),
            "https://x.test/rest/v1/touch_queue"
        );

        let root = Url::parse("https://x.test/rest/v1").unwrap();
        assert_eq!(
            sibling_url(&root, "touch_queue").as_str(),
            "https://x.test/rest/v1/touch_queue"
        );
    }

    #[test]
    fn content_range_total_parses() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/7"), Some(7));
        assert_eq!(parse_content_range_total("0-9/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
