//! Canonical data types and per-flavor record normalization.
//!
//! Every backend flavor serves its own wire shape; this module maps each of
//! them onto the single [`Project`] entity the rest of the crate consumes.
//! Normalization is total and never raises: a record that cannot satisfy the
//! invariants (non-empty id and name, a valid absolute open URL) is dropped
//! whole, leaving its siblings untouched.

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// ChatGPT project URL prefix, used when a backend stores no URL column.
pub const CHATGPT_PROJECT_URL_BASE: &str = "https://chatgpt.com/g/p-";

/// Unified project representation across all backend flavors.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Stable unique key, backend-assigned.
    pub id: String,
    /// Display title.
    pub name: String,
    /// Absolute URL to the external resource.
    pub open_url: Url,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire record served by the custom API and by edge functions.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomApiProject {
    pub id: Option<String>,
    pub name: Option<String>,
    pub open_url: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Wire row served by the Supabase REST table.
///
/// One row type covers both historical schema variants: rows either carry a
/// stored `url` column, or no URL at all plus a `last_confirmed_at`
/// timestamp. When `url` is absent the open URL is constructed from the id.
#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseProjectRow {
    pub id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub last_confirmed_at: Option<String>,
}

/// Response envelope used by the custom API's `/projects` endpoint.
///
/// Records are decoded leniently as raw JSON values so that one malformed
/// record drops only itself, not the whole response.
#[derive(Debug, Deserialize)]
pub struct ProjectsEnvelope {
    pub projects: Vec<serde_json::Value>,
}

/// Normalize custom-API-shaped records (also the edge-function shape).
pub fn normalize_custom(records: Vec<serde_json::Value>) -> Vec<Project> {
    records
        .into_iter()
        .filter_map(|value| {
            let record: CustomApiProject = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(err) => {
                    debug!("dropping malformed project record: {}", err);
                    return None;
                }
            };
            from_custom(record)
        })
        .collect()
}

/// Normalize Supabase rows, constructing the open URL from the id when the
/// row carries no `url` column.
pub fn normalize_supabase(rows: Vec<serde_json::Value>) -> Vec<Project> {
    rows.into_iter()
        .filter_map(|value| {
            let row: SupabaseProjectRow = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(err) => {
                    debug!("dropping malformed project row: {}", err);
                    return None;
                }
            };
            from_supabase(row)
        })
        .collect()
}

fn from_custom(record: CustomApiProject) -> Option<Project> {
    let id = non_empty(record.id)?;
    let name = non_empty(record.name)?;
    let open_url = match record.open_url.as_deref().map(Url::parse) {
        Some(Ok(url)) => url,
        _ => {
            debug!(id = %id, "dropping project without a valid open_url");
            return None;
        }
    };

    Some(Project {
        id,
        name,
        open_url,
        description: record.description,
        created_at: record.created_at.as_deref().and_then(parse_timestamp),
        updated_at: record.updated_at.as_deref().and_then(parse_timestamp),
    })
}

fn from_supabase(row: SupabaseProjectRow) -> Option<Project> {
    let id = non_empty(row.id)?;
    let name = non_empty(row.title)?;

    let open_url = match row.url.as_deref() {
        Some(stored) => match Url::parse(stored) {
            Ok(url) => url,
            Err(_) => {
                debug!(id = %id, "dropping row with an unparseable stored url");
                return None;
            }
        },
        None => Url::parse(&format!("{}{}", CHATGPT_PROJECT_URL_BASE, id)).ok()?,
    };

    // updated_at from the url-bearing schema wins; last_confirmed_at is the
    // older variant's stand-in.
    let updated_at = row
        .updated_at
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| row.last_confirmed_at.as_deref().and_then(parse_timestamp));

    Some(Project {
        id,
        name,
        open_url,
        description: None,
        created_at: row.created_at.as_deref().and_then(parse_timestamp),
        updated_at,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse an ISO-8601 timestamp, tolerating a missing UTC offset (Supabase
/// emits `timestamp without time zone` columns bare). Unparseable input
/// degrades to `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Raw body of the custom API's `/meta` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaResponse {
    pub version: Option<String>,
    pub name: Option<String>,
    pub project_count: Option<u64>,
}

impl MetaResponse {
    /// Enforce the compatibility contract: `version` must be present and
    /// non-empty. Everything else is optional.
    pub fn into_meta(self) -> Result<MetaInfo> {
        match self.version {
            Some(version) if !version.is_empty() => Ok(MetaInfo {
                version,
                name: self.name,
                project_count: self.project_count,
            }),
            _ => Err(Error::MissingRequiredFields(vec!["version".to_string()])),
        }
    }
}

/// Validated endpoint metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaInfo {
    pub version: String,
    pub name: Option<String>,
    pub project_count: Option<u64>,
}

impl MetaInfo {
    /// One-line summary for display, e.g. `"Project Index • v1.2.0 • 42 projects"`.
    pub fn display_description(&self) -> String {
        let mut parts = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            parts.push(name.to_string());
        }
        parts.push(format!("v{}", self.version));
        if let Some(count) = self.project_count {
            parts.push(format!("{} projects", count));
        }
        parts.join(" \u{2022} ")
    }
}
