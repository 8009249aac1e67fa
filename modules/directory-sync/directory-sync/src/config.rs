use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the `directory_sync` module.
///
/// The two enable flags only govern unattended work (startup and scheduled
/// syncs, read-triggered refreshes). Forced syncs always run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct DirectorySyncConfig {
    pub department_sync_enabled: bool,
    pub employee_sync_enabled: bool,
    #[serde(with = "humantime_duration")]
    pub stale_after: Duration,
    #[serde(with = "humantime_duration")]
    pub sync_interval: Duration,
    pub max_hierarchy_depth: usize,
    pub use_hierarchy_feed: bool,
    pub include_terminated: bool,
    pub include_empty_departments: bool,
    pub directory: DirectoryClientConfig,
}

impl Default for DirectorySyncConfig {
    fn default() -> Self {
        Self {
            department_sync_enabled: false,
            employee_sync_enabled: false,
            stale_after: Duration::from_secs(24 * 60 * 60),
            sync_interval: Duration::from_secs(10 * 60),
            max_hierarchy_depth: 3,
            use_hierarchy_feed: false,
            include_terminated: true,
            include_empty_departments: true,
            directory: DirectoryClientConfig::default(),
        }
    }
}

impl From<&DirectorySyncConfig> for ServiceConfig {
    fn from(cfg: &DirectorySyncConfig) -> Self {
        Self {
            department_sync_enabled: cfg.department_sync_enabled,
            employee_sync_enabled: cfg.employee_sync_enabled,
            stale_after: cfg.stale_after,
            max_hierarchy_depth: cfg.max_hierarchy_depth,
            use_hierarchy_feed: cfg.use_hierarchy_feed,
            include_terminated: cfg.include_terminated,
            include_empty_departments: cfg.include_empty_departments,
        }
    }
}

/// Connection settings for the directory service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,
    #[serde(skip_serializing)]
    pub api_token: Option<SecretString>,
    /// Serve a JSON snapshot from disk instead of calling the service.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for DirectoryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_owned(),
            request_timeout: Duration::from_secs(30),
            api_token: None,
            snapshot_path: None,
        }
    }
}

/// Serde mapping for `Duration` fields written as humantime strings ("10m", "24h").
pub mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    /// # Errors
    /// Returns the serializer's error.
    pub fn serialize<S>(value: &Duration, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&humantime::format_duration(*value).to_string())
    }

    /// # Errors
    /// Returns an error when the string is not a humantime duration.
    pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
