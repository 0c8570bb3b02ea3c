use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::DnsError;

#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
}

/// On/off value of a boolean zone setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    Off,
}

impl fmt::Display for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Toggle::On => write!(f, "on"),
            Toggle::Off => write!(f, "off"),
        }
    }
}

impl From<bool> for Toggle {
    fn from(enabled: bool) -> Self {
        if enabled {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

impl FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "on" | "true" => Ok(Toggle::On),
            "0" | "off" | "false" => Ok(Toggle::Off),
            other => Err(format!("expected 0/1 or on/off, got {:?}", other)),
        }
    }
}

/// Zone settings this tool knows how to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSetting {
    AutomaticHttpsRewrites,
    AlwaysUseHttps,
}

impl ZoneSetting {
    pub fn key(&self) -> &'static str {
        match self {
            ZoneSetting::AutomaticHttpsRewrites => "automatic_https_rewrites",
            ZoneSetting::AlwaysUseHttps => "always_use_https",
        }
    }
}

impl fmt::Display for ZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A zone setting as echoed back by the API after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingState {
    pub id: String,
    pub value: Toggle,
}

#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Create a zone for a registrable domain
    async fn create_zone(&self, name: &str) -> Result<Zone, DnsError>;

    /// Look up the identifier of an existing zone by exact name
    async fn lookup_zone_id(&self, name: &str) -> Result<String, DnsError>;

    /// Create a proxied A record; `name` is `@` for the apex
    async fn create_a_record(
        &self,
        zone_id: &str,
        ip: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord, DnsError>;

    /// List every record in a zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, DnsError>;

    /// Delete a record, returning the deleted record id
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<String, DnsError>;

    /// Switch a boolean zone setting on or off
    async fn set_setting(
        &self,
        zone_id: &str,
        setting: ZoneSetting,
        value: Toggle,
    ) -> Result<SettingState, DnsError>;

    /// Find the first A record whose fully qualified name is `domain`.
    ///
    /// Other record types at the same name (TXT, MX, ...) are never matched.
    /// `Ok(None)` means nothing matched; only failed API calls are errors.
    async fn find_record_id(
        &self,
        zone_id: &str,
        domain: &str,
    ) -> Result<Option<String>, DnsError> {
        let records = self.list_records(zone_id).await?;

        Ok(records
            .into_iter()
            .find(|record| {
                record.record_type.eq_ignore_ascii_case("A")
                    && record.name.eq_ignore_ascii_case(domain)
            })
            .map(|record| record.id))
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
