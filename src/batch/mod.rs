//! Sequential per-domain workflows behind the `add`, `edit` and `settings`
//! commands.
//!
//! Domains are processed one at a time. Every remote call returns a
//! `Result`; the [`FailurePolicy`] decides whether a failed domain stops the
//! batch or is reported and skipped.

mod edit;
mod onboard;
mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use edit::{edit_domains, EditRequest, SettingChanges};
pub use onboard::add_domains;
pub use report::{BatchAborted, DomainReport, ReportStatus, Stage, StepFailure};

use anyhow::Result;
use tracing::{error, warn};

use crate::config::FailurePolicy;

fn settle(
    mut report: DomainReport,
    outcome: Result<(), StepFailure>,
    policy: FailurePolicy,
    on_report: &mut impl FnMut(&DomainReport),
    reports: &mut Vec<DomainReport>,
) -> Result<()> {
    let Err(failure) = outcome else {
        on_report(&report);
        reports.push(report);
        return Ok(());
    };

    report.fail(failure.clone());
    on_report(&report);

    match policy {
        FailurePolicy::Continue => {
            warn!("{}: {}", report.domain, failure);
            reports.push(report);
            Ok(())
        }
        FailurePolicy::Abort => {
            error!("{}: {}, stopping batch", report.domain, failure);
            Err(BatchAborted {
                domain: report.domain,
                failure,
            }
            .into())
        }
    }
}
