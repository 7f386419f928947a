//! Edit-permission predicate for individual indicator entries
//!
//! A non-administrator may write a value only when the indicator is due in
//! the submission's period, the entry window is open and the submission is
//! still a draft. Administrators may write at any time, including
//! not-due indicators, so they can enter catch-up corrections; such writes
//! are flagged as [`EditAuthority::AdminOverride`].
//!
//! The predicate is evaluated for every write and every grid render. Its
//! inputs (wall clock, submission status) change between requests.

use crate::access::CapabilityPolicy;
use crate::clock::PeriodClock;
use crate::frequency::is_due;
use chrono::{DateTime, Utc};
use kpi_types::{
    Actor, Capability, GovernanceError, GovernanceResult, Indicator, Period, SubmissionStatus,
};

/// Which rule allowed a write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditAuthority {
    /// Due indicator, open window, draft submission
    Regular,
    /// Administrator writing outside the regular rule
    AdminOverride,
}

impl EditAuthority {
    pub fn is_override(self) -> bool {
        matches!(self, Self::AdminOverride)
    }
}

/// Inputs of the predicate that describe the target submission.
#[derive(Clone, Copy, Debug)]
pub struct EditTarget {
    pub period: Period,
    pub status: SubmissionStatus,
}

fn status_is_editable(status: SubmissionStatus) -> bool {
    matches!(status, SubmissionStatus::Draft | SubmissionStatus::Rejected)
}

/// Evaluate the predicate and explain a refusal.
pub fn check_edit(
    indicator: &Indicator,
    target: EditTarget,
    actor: &Actor,
    now: DateTime<Utc>,
    clock: &PeriodClock,
    policy: &dyn CapabilityPolicy,
) -> GovernanceResult<EditAuthority> {
    if !indicator.active {
        return Err(GovernanceError::edit_not_permitted(
            &indicator.id,
            "indicator is deactivated",
        ));
    }

    let due = is_due(indicator, target.period);
    let window_open = clock.is_within_entry_window(now);
    let regular = policy.grants(actor, Capability::RecordValues)
        && due
        && window_open
        && status_is_editable(target.status);

    if regular {
        return Ok(EditAuthority::Regular);
    }
    if policy.grants(actor, Capability::OverrideWindow) {
        return Ok(EditAuthority::AdminOverride);
    }

    let reason = if !policy.grants(actor, Capability::RecordValues) {
        format!("role {} cannot record values", actor.role)
    } else if !due {
        format!(
            "{} indicator is not due in {}",
            indicator.frequency, target.period
        )
    } else if !status_is_editable(target.status) {
        format!("submission is {}", target.status)
    } else {
        let window = clock.window();
        format!(
            "entry window closed (day {} outside {}..={})",
            clock.day_of_month(now),
            window.start_day(),
            window.end_day()
        )
    };
    Err(GovernanceError::edit_not_permitted(&indicator.id, reason))
}

/// Boolean form of [`check_edit`].
pub fn can_edit(
    indicator: &Indicator,
    target: EditTarget,
    actor: &Actor,
    now: DateTime<Utc>,
    clock: &PeriodClock,
    policy: &dyn CapabilityPolicy,
) -> bool {
    check_edit(indicator, target, actor, now, clock, policy).is_ok()
}
