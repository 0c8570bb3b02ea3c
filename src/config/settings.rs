use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domains::SchemePolicy;

pub const DEFAULT_CONFIG_FILE: &str = "cfzones.toml";
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    CLOUDFLARE_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_domains_file")]
    pub domains_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ip: Option<Ipv4Addr>,
    #[serde(default)]
    pub on_error: FailurePolicy,
    #[serde(default)]
    pub scheme_policy: SchemePolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("auth.json")
}

fn default_domains_file() -> PathBuf {
    PathBuf::from("domains.txt")
}

fn default_log_level() -> String {
    "info".to_string()
}

/// What the batch does when a remote call for one domain fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Report the domain as failed and move on to the next one.
    #[default]
    Continue,
    /// Report the domain as failed and stop the batch.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Continue => write!(f, "continue"),
            FailurePolicy::Abort => write!(f, "abort"),
        }
    }
}

impl Settings {
    /// Reads the TOML configuration at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            domains_file: default_domains_file(),
            default_ip: None,
            on_error: FailurePolicy::default(),
            scheme_policy: SchemePolicy::default(),
            log_level: default_log_level(),
        }
    }
}
