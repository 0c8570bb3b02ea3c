use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::dns::{
    DnsError, DnsProvider, DnsRecord, SettingState, Toggle, Zone, ZoneSetting, A_RECORD_TTL,
};

/// In-memory provider that records every call it receives.
#[derive(Default)]
pub struct RecordingProvider {
    pub zones: Mutex<HashMap<String, String>>,
    pub records: Mutex<HashMap<String, Vec<DnsRecord>>>,
    pub rejected_zones: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingProvider {
    pub fn with_zone(self, name: &str, id: &str) -> Self {
        self.zones
            .lock()
            .unwrap()
            .insert(name.to_string(), id.to_string());
        self
    }

    pub fn with_record(
        self,
        zone_id: &str,
        id: &str,
        record_type: &str,
        name: &str,
        content: &str,
    ) -> Self {
        self.records
            .lock()
            .unwrap()
            .entry(zone_id.to_string())
            .or_default()
            .push(DnsRecord {
                id: id.to_string(),
                record_type: record_type.to_string(),
                name: name.to_string(),
                content: content.to_string(),
                ttl: A_RECORD_TTL,
                proxied: true,
            });
        self
    }

    pub fn rejecting_zone(mut self, name: &str) -> Self {
        self.rejected_zones.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DnsProvider for RecordingProvider {
    async fn create_zone(&self, name: &str) -> Result<Zone, DnsError> {
        self.log(format!("create_zone {}", name));

        if self.rejected_zones.contains(name) {
            return Err(DnsError::Rejected {
                status: StatusCode::BAD_REQUEST,
                messages: vec![format!("1061: {} already exists", name)],
            });
        }

        let id = format!("zone-{}", name);
        self.zones
            .lock()
            .unwrap()
            .insert(name.to_string(), id.clone());

        Ok(Zone {
            id,
            name: name.to_string(),
            name_servers: vec![
                "ada.ns.cloudflare.com".to_string(),
                "bob.ns.cloudflare.com".to_string(),
            ],
            status: "pending".to_string(),
        })
    }

    async fn lookup_zone_id(&self, name: &str) -> Result<String, DnsError> {
        self.log(format!("lookup_zone_id {}", name));

        self.zones
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DnsError::ZoneNotFound(name.to_string()))
    }

    async fn create_a_record(
        &self,
        zone_id: &str,
        ip: Ipv4Addr,
        name: &str,
    ) -> Result<DnsRecord, DnsError> {
        self.log(format!("create_a_record {} {} {}", zone_id, name, ip));

        let mut records = self.records.lock().unwrap();
        let zone_records = records.entry(zone_id.to_string()).or_default();
        let record = DnsRecord {
            id: format!("rec-{}", zone_records.len() + 1),
            record_type: "A".to_string(),
            name: name.to_string(),
            content: ip.to_string(),
            ttl: A_RECORD_TTL,
            proxied: true,
        };
        zone_records.push(record.clone());

        Ok(record)
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<DnsRecord>, DnsError> {
        self.log(format!("list_records {}", zone_id));

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(zone_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<String, DnsError> {
        self.log(format!("delete_record {} {}", zone_id, record_id));

        if let Some(records) = self.records.lock().unwrap().get_mut(zone_id) {
            records.retain(|record| record.id != record_id);
        }
        Ok(record_id.to_string())
    }

    async fn set_setting(
        &self,
        zone_id: &str,
        setting: ZoneSetting,
        value: Toggle,
    ) -> Result<SettingState, DnsError> {
        self.log(format!("set_setting {} {} {}", zone_id, setting, value));

        Ok(SettingState {
            id: setting.key().to_string(),
            value,
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}
