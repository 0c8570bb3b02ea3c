use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::dns::{DnsRecord, SettingState};
use crate::domains::Target;

/// Step of the per-domain sequence a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResolveDomain,
    CreateZone,
    LookupZone,
    UpdateSetting,
    FindRecord,
    DeleteRecord,
    CreateRecord,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolveDomain => "resolve domain",
            Stage::CreateZone => "create zone",
            Stage::LookupZone => "look up zone",
            Stage::UpdateSetting => "update setting",
            Stage::FindRecord => "find record",
            Stage::DeleteRecord => "delete record",
            Stage::CreateRecord => "create record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{stage} failed: {message}")]
pub struct StepFailure {
    pub stage: Stage,
    pub message: String,
}

impl StepFailure {
    pub fn new(stage: Stage, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Ok,
    Failed,
}

/// Outcome of processing one domain entry, printed as JSON.
///
/// Fields filled in before a failure are kept, so a partially configured
/// domain shows exactly which steps went through.
#[derive(Debug, Clone, Serialize)]
pub struct DomainReport {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub name_servers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DnsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepFailure>,
}

impl DomainReport {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            zone: None,
            record_name: None,
            status: ReportStatus::Ok,
            zone_id: None,
            name_servers: Vec::new(),
            settings: Vec::new(),
            deleted_record_id: None,
            record: None,
            error: None,
        }
    }

    pub(crate) fn set_target(&mut self, target: &Target) {
        self.zone = Some(target.zone.clone());
        self.record_name = Some(target.record_name.clone());
    }

    pub(crate) fn fail(&mut self, failure: StepFailure) {
        self.status = ReportStatus::Failed;
        self.error = Some(failure);
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReportStatus::Ok
    }
}

/// Returned when [`FailurePolicy::Abort`](crate::config::FailurePolicy) stops a batch.
#[derive(Debug, Error)]
#[error("Batch aborted at {domain}: {failure}")]
pub struct BatchAborted {
    pub domain: String,
    pub failure: StepFailure,
}
