use std::net::Ipv4Addr;

use anyhow::Result;
use tracing::{debug, info};

use super::report::{DomainReport, Stage, StepFailure};
use super::settle;
use crate::config::FailurePolicy;
use crate::dns::{DnsProvider, Toggle, ZoneSetting};
use crate::domains::{resolve_target, Target};

/// Requested setting changes. `None` leaves the setting as it is on the zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingChanges {
    pub automatic_https_rewrites: Option<Toggle>,
    pub always_use_https: Option<Toggle>,
}

impl SettingChanges {
    pub fn requested(&self) -> impl Iterator<Item = (ZoneSetting, Toggle)> {
        [
            (
                ZoneSetting::AutomaticHttpsRewrites,
                self.automatic_https_rewrites,
            ),
            (ZoneSetting::AlwaysUseHttps, self.always_use_https),
        ]
        .into_iter()
        .filter_map(|(setting, value)| value.map(|v| (setting, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.requested().next().is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditRequest {
    pub settings: SettingChanges,
    /// Replace the domain's A record with a proxied one pointing here.
    pub replace_record: Option<Ipv4Addr>,
}

/// Applies `request` to the existing zone of every domain.
pub async fn edit_domains(
    provider: &dyn DnsProvider,
    domains: &[String],
    request: &EditRequest,
    policy: FailurePolicy,
    mut on_report: impl FnMut(&DomainReport),
) -> Result<Vec<DomainReport>> {
    let mut reports = Vec::with_capacity(domains.len());

    for domain in domains {
        let mut report = DomainReport::new(domain);
        let outcome = edit_domain(provider, domain, request, &mut report).await;
        settle(report, outcome, policy, &mut on_report, &mut reports)?;
    }

    Ok(reports)
}

async fn edit_domain(
    provider: &dyn DnsProvider,
    domain: &str,
    request: &EditRequest,
    report: &mut DomainReport,
) -> Result<(), StepFailure> {
    let target = resolve_target(domain).map_err(|e| StepFailure::new(Stage::ResolveDomain, e))?;
    report.set_target(&target);

    let zone_id = provider
        .lookup_zone_id(&target.zone)
        .await
        .map_err(|e| StepFailure::new(Stage::LookupZone, e))?;
    debug!("Zone {} has id {}", target.zone, zone_id);
    report.zone_id = Some(zone_id.clone());

    for (setting, value) in request.settings.requested() {
        let state = provider
            .set_setting(&zone_id, setting, value)
            .await
            .map_err(|e| StepFailure::new(Stage::UpdateSetting, e))?;
        info!("{}: {} = {}", target.zone, state.id, state.value);
        report.settings.push(state);
    }

    if let Some(ip) = request.replace_record {
        replace_record(provider, &target, &zone_id, ip, report).await?;
    }

    Ok(())
}

async fn replace_record(
    provider: &dyn DnsProvider,
    target: &Target,
    zone_id: &str,
    ip: Ipv4Addr,
    report: &mut DomainReport,
) -> Result<(), StepFailure> {
    let existing = provider
        .find_record_id(zone_id, &target.host)
        .await
        .map_err(|e| StepFailure::new(Stage::FindRecord, e))?;

    match existing {
        Some(record_id) => {
            let deleted = provider
                .delete_record(zone_id, &record_id)
                .await
                .map_err(|e| StepFailure::new(Stage::DeleteRecord, e))?;
            info!("{}: deleted record {}", target.host, deleted);
            report.deleted_record_id = Some(deleted);
        }
        None => debug!("{}: no existing record to delete", target.host),
    }

    let record = provider
        .create_a_record(zone_id, ip, &target.record_name)
        .await
        .map_err(|e| StepFailure::new(Stage::CreateRecord, e))?;
    info!(
        "{} -> A {} {} (proxied)",
        target.zone, record.name, record.content
    );
    report.record = Some(record);

    Ok(())
}
