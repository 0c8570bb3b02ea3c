use std::net::Ipv4Addr;

use anyhow::Result;
use tracing::info;

use super::report::{DomainReport, Stage, StepFailure};
use super::settle;
use crate::config::FailurePolicy;
use crate::dns::DnsProvider;
use crate::domains::resolve_target;

/// Creates a zone and a proxied A record for every domain.
///
/// A subdomain entry (`user.example.com`) creates the zone for its
/// registrable domain and an A record named after its leading label; an apex
/// entry gets an `@` record. Each report is handed to `on_report` as soon as
/// its domain is done.
pub async fn add_domains(
    provider: &dyn DnsProvider,
    domains: &[String],
    ip: Ipv4Addr,
    policy: FailurePolicy,
    mut on_report: impl FnMut(&DomainReport),
) -> Result<Vec<DomainReport>> {
    let mut reports = Vec::with_capacity(domains.len());

    for domain in domains {
        let mut report = DomainReport::new(domain);
        let outcome = add_domain(provider, domain, ip, &mut report).await;
        settle(report, outcome, policy, &mut on_report, &mut reports)?;
    }

    Ok(reports)
}

async fn add_domain(
    provider: &dyn DnsProvider,
    domain: &str,
    ip: Ipv4Addr,
    report: &mut DomainReport,
) -> Result<(), StepFailure> {
    let target = resolve_target(domain).map_err(|e| StepFailure::new(Stage::ResolveDomain, e))?;
    report.set_target(&target);

    info!(
        "Adding zone {} for {} (record {})",
        target.zone, target.host, target.record_name
    );

    let zone = provider
        .create_zone(&target.zone)
        .await
        .map_err(|e| StepFailure::new(Stage::CreateZone, e))?;
    info!("{} -> name servers {:?}", zone.name, zone.name_servers);
    report.zone_id = Some(zone.id.clone());
    report.name_servers = zone.name_servers;

    let record = provider
        .create_a_record(&zone.id, ip, &target.record_name)
        .await
        .map_err(|e| StepFailure::new(Stage::CreateRecord, e))?;
    info!(
        "{} -> A {} {} (proxied)",
        target.zone, record.name, record.content
    );
    report.record = Some(record);

    Ok(())
}
