//! PaperMC build poller.
//!
//! Resolves "latest version → latest build → build details" with three
//! sequential GETs and normalizes the result into a [`BuildRecord`].
//!
//! The API lists versions and builds oldest-first, so the last element of
//! each list is taken as the latest. No sorting is applied.

use crate::error::{RelayError, Result};
use crate::http::UpstreamClient;
use crate::state::{BuildId, BuildRecord};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Project polled on the PaperMC API.
pub const PROJECT: &str = "paper";

/// Maximum number of change entries kept per build.
pub const MAX_CHANGELOG_ENTRIES: usize = 3;

/// Changelog used when a build lists no changes.
pub const NO_CHANGES_PLACEHOLDER: &str = "- No changes listed";

/// Display format for build timestamps (`1/5/2024, 3:04:05 PM`).
pub const TIME_DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Display value when a build has no timestamp.
pub const UNKNOWN_TIME: &str = "Unknown";

// Upstream fields may be missing or `null`; both read as empty.

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    versions: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(default)]
    builds: Option<Vec<BuildId>>,
}

#[derive(Debug, Default, Deserialize)]
struct BuildResponse {
    #[serde(default)]
    changes: Option<Vec<ChangeEntry>>,
    #[serde(default)]
    time: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChangeEntry {
    #[serde(default)]
    summary: Option<String>,
}

/// Canonical download URL for a build.
pub fn download_url(version: &str, build: &BuildId) -> String {
    format!(
        "https://api.papermc.io/v2/projects/{PROJECT}/versions/{version}/builds/{build}/downloads/{PROJECT}-{version}-{build}.jar"
    )
}

/// Turn an upstream change list into display lines.
///
/// Only the first three entries are considered; blank ones among them are
/// dropped rather than replaced by later entries.
pub fn format_changelog<'a>(summaries: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let lines: Vec<String> = summaries
        .into_iter()
        .take(MAX_CHANGELOG_ENTRIES)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("- {s}"))
        .collect();
    if lines.is_empty() {
        vec![NO_CHANGES_PLACEHOLDER.to_owned()]
    } else {
        lines
    }
}

/// Render an upstream time value for display.
///
/// Accepts RFC 3339 strings and epoch milliseconds. Anything else is shown
/// as-is.
pub fn format_build_time(raw: Option<&serde_json::Value>) -> String {
    let parsed: Option<DateTime<Utc>> = match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };

    match (parsed, raw) {
        (Some(dt), _) => dt.format(TIME_DISPLAY_FORMAT).to_string(),
        (None, Some(serde_json::Value::String(s))) if !s.trim().is_empty() => s.clone(),
        (None, Some(serde_json::Value::Number(n))) => n.to_string(),
        _ => UNKNOWN_TIME.to_owned(),
    }
}

/// Source of the latest published build.
#[async_trait::async_trait]
pub trait BuildSource: Send + Sync {
    /// Resolve the newest build.
    async fn fetch_latest_build(&self) -> Result<BuildRecord>;
}

/// Polls the PaperMC v2 API.
#[derive(Debug, Clone)]
pub struct BuildPoller {
    client: UpstreamClient,
    api_base: String,
}

impl BuildPoller {
    /// Create a poller against `api_base` (e.g. `https://api.papermc.io/v2`).
    pub fn new(client: UpstreamClient, api_base: impl Into<String>) -> Self {
        let mut api_base = api_base.into();
        while api_base.ends_with('/') {
            api_base.pop();
        }
        Self { client, api_base }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let value = self.client.get(url).await?;
        serde_json::from_value(value)
            .map_err(|e| RelayError::Poll(format!("unexpected response from {url}: {e}")))
    }
}

#[async_trait::async_trait]
impl BuildSource for BuildPoller {
    async fn fetch_latest_build(&self) -> Result<BuildRecord> {
        let project_url = format!("{}/projects/{PROJECT}", self.api_base);
        let project: ProjectResponse = self.get(&project_url).await?;
        let version = project
            .versions
            .unwrap_or_default()
            .pop()
            .ok_or_else(|| RelayError::Poll(format!("{project_url} listed no versions")))?;

        let version_url = format!("{project_url}/versions/{version}");
        let listing: VersionResponse = self.get(&version_url).await?;
        let build = listing
            .builds
            .unwrap_or_default()
            .pop()
            .ok_or_else(|| RelayError::Poll(format!("{version_url} listed no builds")))?;

        let build_url = format!("{version_url}/builds/{build}");
        let details: BuildResponse = self.get(&build_url).await?;

        tracing::debug!(%version, %build, "resolved latest upstream build");

        Ok(BuildRecord {
            changelog: format_changelog(
                details
                    .changes
                    .iter()
                    .flatten()
                    .map(|c| c.summary.as_deref().unwrap_or_default()),
            ),
            time: format_build_time(details.time.as_ref()),
            download_url: download_url(&version, &build),
            version,
            build,
        })
    }
}
