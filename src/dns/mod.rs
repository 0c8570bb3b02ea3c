mod cloudflare;
mod error;
mod provider;

pub use cloudflare::{CloudflareProvider, A_RECORD_TTL};
pub use error::DnsError;
pub use provider::{
    Credentials, DnsProvider, DnsRecord, SettingState, Toggle, Zone, ZoneSetting,
};

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::config::ApiConfig;

pub fn create_provider(
    name: &str,
    credentials: Credentials,
    api: &ApiConfig,
) -> Result<Arc<dyn DnsProvider>> {
    match name.to_lowercase().as_str() {
        "cloudflare" => Ok(Arc::new(CloudflareProvider::new(credentials, api)?)),
        _ => Err(anyhow!("Unknown DNS provider: {}", name)),
    }
}
