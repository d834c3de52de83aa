//! GitHub release polling
//!
//! Both tools share `Settings/update_status.json`: each records the version
//! it last ran as, and whichever checks first within the hour fetches the
//! latest release for both. Whether an update is available is decided at
//! read time by comparing versions, never by a stored flag (a stale flag
//! survives upgrades; a comparison does not).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::constants::update as cfg;
use crate::version::{Version, display_version, version_from_asset_name};

/// Timestamp format in the status file (local time, second precision).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_iso: Option<String>,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub release_url: String,
    /// Release asset name -> download URL for the zip bundles
    #[serde(default)]
    pub zip_assets: BTreeMap<String, String>,
    /// Per-tool record of the version last seen running
    #[serde(default)]
    pub tools: BTreeMap<String, ToolStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolStatus {
    #[serde(default)]
    pub current_version: String,
}

/// Subset of the GitHub releases/latest response we care about.
#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

pub fn load_status(path: &Path) -> UpdateStatus {
    match fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "Corrupt update status file, starting fresh");
            UpdateStatus::default()
        }),
        Err(_) => UpdateStatus::default(),
    }
}

pub fn save_status(path: &Path, status: &UpdateStatus) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(status).context("Failed to serialize update status")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write update status to {}", path.display()))
}

/// Whether the recorded check time is recent enough to skip the network.
fn is_fresh(last_checked_iso: Option<&str>, now: NaiveDateTime) -> bool {
    let Some(recorded) = last_checked_iso else {
        return false;
    };
    match NaiveDateTime::parse_from_str(recorded, TIMESTAMP_FORMAT) {
        Ok(last) => (now - last).num_seconds() < cfg::CHECK_INTERVAL_SECS,
        Err(_) => false,
    }
}

/// Refresh the status file for one tool. Records the running version, then
/// polls GitHub unless a check happened within the last hour (or `force`).
/// Network failures degrade to the cached status.
pub fn check_update(status_path: &Path, tool: &str, current_version: &str, force: bool) -> UpdateStatus {
    let mut status = load_status(status_path);
    let now = chrono::Local::now().naive_local();

    let entry = status.tools.entry(tool.to_string()).or_default();
    let mut needs_save = false;
    if entry.current_version != current_version {
        entry.current_version = current_version.to_string();
        needs_save = true;
    }

    if !force && is_fresh(status.last_checked_iso.as_deref(), now) {
        if needs_save
            && let Err(err) = save_status(status_path, &status)
        {
            error!(error = ?err, "Failed to save update status");
        }
        return status;
    }

    match fetch_latest_release() {
        Ok(release) => {
            let latest_version = release
                .assets
                .iter()
                .find(|asset| asset.name.to_ascii_lowercase().ends_with(".zip"))
                .map(|asset| version_from_asset_name(&asset.name))
                .unwrap_or_default();

            status.latest_version = latest_version;
            status.release_url = release.html_url;
            status.zip_assets = release
                .assets
                .into_iter()
                .filter(|asset| asset.name.to_ascii_lowercase().ends_with(".zip"))
                .map(|asset| (asset.name, asset.browser_download_url))
                .collect();
            status.last_checked_iso = Some(now.format(TIMESTAMP_FORMAT).to_string());

            if let Err(err) = save_status(status_path, &status) {
                error!(error = ?err, "Failed to save update status");
            } else {
                info!(latest = %status.latest_version, "Release check complete");
            }
            status
        }
        Err(err) => {
            warn!(error = ?err, "Update check failed, using cached status");
            if needs_save
                && let Err(err) = save_status(status_path, &status)
            {
                error!(error = ?err, "Failed to save update status");
            }
            status
        }
    }
}

fn fetch_latest_release() -> Result<Release> {
    let url = format!(
        "https://api.github.com/repos/{}/{}/releases/latest",
        cfg::REPO_OWNER,
        cfg::REPO_NAME
    );
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cfg::HTTP_TIMEOUT_SECS))
        .user_agent(cfg::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("Release request to {url} failed"))?;
    if !response.status().is_success() {
        anyhow::bail!("Release request returned status {}", response.status());
    }
    response.json().context("Failed to parse release response")
}

/// The newer version, for display, when the latest release beats what this
/// tool is running. Compared live so the answer tracks the binary version.
pub fn update_available(status: &UpdateStatus, tool: &str) -> Option<String> {
    if status.latest_version.is_empty() {
        return None;
    }
    let current = status
        .tools
        .get(tool)
        .map(|t| t.current_version.as_str())
        .unwrap_or("");
    if Version::parse(&status.latest_version) > Version::parse(current) {
        Some(display_version(&status.latest_version))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn status_with(latest: &str, tool: &str, current: &str) -> UpdateStatus {
        let mut status = UpdateStatus {
            latest_version: latest.to_string(),
            ..Default::default()
        };
        status.tools.insert(
            tool.to_string(),
            ToolStatus {
                current_version: current.to_string(),
            },
        );
        status
    }

    #[test]
    fn test_update_available_newer() {
        let status = status_with("1.1.0", "editor", "v1.0.0");
        assert_eq!(update_available(&status, "editor"), Some("v1.1.0".to_string()));
    }

    #[test]
    fn test_update_available_same_or_older() {
        let status = status_with("1.0.0", "editor", "v1.0.0");
        assert_eq!(update_available(&status, "editor"), None);

        let status = status_with("0.9.0", "editor", "v1.0.0");
        assert_eq!(update_available(&status, "editor"), None);
    }

    #[test]
    fn test_update_available_no_data() {
        let status = UpdateStatus::default();
        assert_eq!(update_available(&status, "editor"), None);

        // Known latest but tool never recorded: 0.0.0 current, so any
        // non-zero release counts as an update.
        let status = status_with("0.1.0", "other", "v1.0.0");
        assert_eq!(update_available(&status, "editor"), Some("v0.1.0".to_string()));
    }

    #[test]
    fn test_status_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update_status.json");

        let mut status = status_with("1.2.3", "generator", "v1.0.0");
        status.last_checked_iso = Some("2025-06-01T12:00:00".to_string());
        status
            .zip_assets
            .insert("Tool_v1.2.3.zip".to_string(), "https://example/dl".to_string());
        save_status(&path, &status).unwrap();

        assert_eq!(load_status(&path), status);
    }

    #[test]
    fn test_load_missing_or_corrupt_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update_status.json");
        assert_eq!(load_status(&path), UpdateStatus::default());

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_status(&path), UpdateStatus::default());
    }

    #[test]
    fn test_is_fresh_window() {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(is_fresh(Some("2025-06-01T11:30:00"), now));
        assert!(!is_fresh(Some("2025-06-01T10:59:00"), now));
        assert!(!is_fresh(Some("garbage"), now));
        assert!(!is_fresh(None, now));
    }
}
