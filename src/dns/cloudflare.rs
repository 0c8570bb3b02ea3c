use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::DnsError;
use super::provider::{
    Credentials, DnsProvider, DnsRecord, SettingState, Toggle, Zone, ZoneSetting,
};
use crate::config::ApiConfig;

/// TTL, in seconds, of every A record this tool creates.
pub const A_RECORD_TTL: u32 = 120;

const RECORDS_PER_PAGE: u32 = 100;

pub struct CloudflareProvider {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Option<Vec<ApiMessage>>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> ApiEnvelope<T> {
    fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .flatten()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct NewZone<'a> {
    name: &'a str,
    jump_start: bool,
}

#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: String,
    ttl: u32,
    proxied: bool,
}

#[derive(Debug, Serialize)]
struct SettingUpdate {
    value: Toggle,
}

#[derive(Debug, Deserialize)]
struct DeletedRecord {
    id: String,
}

impl CloudflareProvider {
    pub fn new(credentials: Credentials, api: &ApiConfig) -> Result<Self, DnsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn with_base_url(
        credentials: Credentials,
        base_url: impl Into<String>,
    ) -> Result<Self, DnsError> {
        let api = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(credentials, &api)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.credentials.api_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends an authenticated request and decodes the Cloudflare envelope.
    ///
    /// Both a non-2xx status and `success: false` in the body are errors.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>, DnsError> {
        let response = request
            .header(AUTHORIZATION, self.auth_header())
            .send()
            .await?;

        let status = response.status();
        debug!("Cloudflare responded with {}", status);
        let body = response.text().await?;

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(DnsError::InvalidResponse(format!("{}: {}", e, body)));
            }
            Err(_) => return Err(DnsError::RemoteRequestFailed { status, body }),
        };

        if !status.is_success() || !envelope.success {
            return Err(DnsError::Rejected {
                status,
                messages: envelope.error_messages(),
            });
        }

        Ok(envelope)
    }

    async fn send_for_result<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, DnsError> {
        self.send(request)
            .await?
            .result
            .ok_or_else(|| DnsError::InvalidResponse("response has no result".to_string()))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn create_zone(&self, name: &str) -> Result<Zone, DnsError> {
        let url = self.url("/zones");
        debug!("POST {} (name={})", url, name);

        let payload = NewZone {
            name,
            jump_start: true,
        };

        self.send_for_result(self.client.post(&url).json(&payload))
            .await
    }

    async fn lookup_zone_id(&self, name: &str) -> Result<String, DnsError> {
        let url = self.url("/zones");
        debug!("GET {}?name={}", url, name);

        let zones: Vec<Zone> = self
            .send_for_result(self.client.get(&url).query(&[("name", name)]))
            .await?;

        zones
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| DnsError::ZoneNotFound(name.to_string()))
    }

    async fn create_a_record(
        &self,
        zone_id: &str,
        ip: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord, DnsError> {
        let url = self.url(&format!("/zones/{}/dns_records", zone_id));
        debug!("POST {} (A {} -> {})", url, name, ip);

        let payload = NewRecord {
            record_type: "A",
            name,
            content: ip.to_string(),
            ttl: A_RECORD_TTL,
            proxied: true,
        };

        self.send_for_result(self.client.post(&url).json(&payload))
            .await
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, DnsError> {
        let url = self.url(&format!("/zones/{}/dns_records", zone_id));
        let mut records = Vec::new();
        let mut page = 1u32;

        loop {
            debug!("GET {} (page {})", url, page);
            let request = self
                .client
                .get(&url)
                .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)]);

            let envelope: ApiEnvelope<Vec<DnsRecord>> = self.send(request).await?;
            records.extend(envelope.result.unwrap_or_default());

            match envelope.result_info {
                Some(info) if page < info.total_pages => page += 1,
                _ => break,
            }
        }

        Ok(records)
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<String, DnsError> {
        let url = self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id));
        debug!("DELETE {}", url);

        let deleted: DeletedRecord = self.send_for_result(self.client.delete(&url)).await?;
        Ok(deleted.id)
    }

    async fn set_setting(
        &self,
        zone_id: &str,
        setting: ZoneSetting,
        value: Toggle,
    ) -> Result<SettingState, DnsError> {
        let url = self.url(&format!("/zones/{}/settings/{}", zone_id, setting.key()));
        debug!("PATCH {} (value={})", url, value);

        self.send_for_result(self.client.patch(&url).json(&SettingUpdate { value }))
            .await
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
