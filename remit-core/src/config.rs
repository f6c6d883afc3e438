//! Configuration management
//!
//! Settings live in `<remit dir>/settings.json`:
//! ```json
//! {
//!   "api": { "baseUrl": "http://localhost:8080/api/v1", "timeoutSecs": 30,
//!            "transferRetries": 1, "probeAccountId": 1 }
//! }
//! ```
//! Keys this crate does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::adapters::http::DEFAULT_BASE_URL;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "REMIT_API_URL";

/// Environment variable overriding the request timeout in seconds
pub const TIMEOUT_ENV: &str = "REMIT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TRANSFER_RETRIES: u32 = 1;
/// Upper bound on resubmissions, whatever settings.json says
pub const MAX_TRANSFER_RETRIES: u32 = 5;
const DEFAULT_PROBE_ACCOUNT_ID: i64 = 1;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transfer_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    probe_account_id: Option<i64>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Remit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Resubmissions allowed after a transport failure during a transfer
    pub transfer_retries: u32,
    /// Account fetched to verify credentials at login
    pub probe_account_id: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            transfer_retries: DEFAULT_TRANSFER_RETRIES,
            probe_account_id: DEFAULT_PROBE_ACCOUNT_ID,
        }
    }
}

impl Config {
    /// Load config from the remit directory
    ///
    /// A missing or malformed settings file yields defaults. The base URL
    /// and timeout can be overridden with `REMIT_API_URL` and
    /// `REMIT_TIMEOUT_SECS`.
    pub fn load(remit_dir: &Path) -> Result<Self> {
        Self::load_with_env(remit_dir, |name| std::env::var(name).ok())
    }

    fn load_with_env(remit_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = read_settings(remit_dir)?;
        let defaults = Self::default();

        let base_url = env(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .or(raw.api.base_url)
            .unwrap_or(defaults.base_url);

        let timeout_secs = env(TIMEOUT_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .or(raw.api.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.timeout_secs);

        Ok(Self {
            base_url,
            timeout_secs,
            transfer_retries: raw
                .api
                .transfer_retries
                .unwrap_or(defaults.transfer_retries)
                .min(MAX_TRANSFER_RETRIES),
            probe_account_id: raw
                .api
                .probe_account_id
                .unwrap_or(defaults.probe_account_id),
        })
    }

    /// Save config to the remit directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, remit_dir: &Path) -> Result<()> {
        let mut settings = read_settings(remit_dir)?;

        settings.api.base_url = Some(self.base_url.clone());
        settings.api.timeout_secs = Some(self.timeout_secs);
        settings.api.transfer_retries = Some(self.transfer_retries);
        settings.api.probe_account_id = Some(self.probe_account_id);

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::create_dir_all(remit_dir)?;
        std::fs::write(remit_dir.join("settings.json"), content)?;
        Ok(())
    }
}

fn read_settings(remit_dir: &Path) -> Result<SettingsFile> {
    let settings_path = remit_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
