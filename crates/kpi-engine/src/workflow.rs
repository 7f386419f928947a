//! Submission workflow: DRAFT → SUBMITTED → VALIDATED, with reject back to DRAFT
//!
//! Transitions are pure: they take the current aggregate by reference and
//! return a new one, or a typed failure with the input untouched. Guards are
//! checked in a fixed order: status, then capability, then entry window.

use crate::access::CapabilityPolicy;
use crate::clock::PeriodClock;
use chrono::{DateTime, Utc};
use kpi_types::{
    Actor, Capability, GovernanceError, GovernanceResult, RejectionNote, SubmissionAggregate,
    SubmissionStatus,
};
use serde::{Deserialize, Serialize};

/// A workflow step that can be requested on a submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Validate,
    Reject,
}

impl WorkflowAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Validate => "validate",
            Self::Reject => "reject",
        }
    }

    /// Stored status the submission must be in.
    pub fn required_status(self) -> SubmissionStatus {
        match self {
            Self::Submit => SubmissionStatus::Draft,
            Self::Validate | Self::Reject => SubmissionStatus::Submitted,
        }
    }

    /// Stored status after the step.
    pub fn target_status(self) -> SubmissionStatus {
        match self {
            Self::Submit => SubmissionStatus::Submitted,
            Self::Validate => SubmissionStatus::Validated,
            Self::Reject => SubmissionStatus::Draft,
        }
    }

    pub fn capability(self) -> Capability {
        match self {
            Self::Submit => Capability::Submit,
            Self::Validate | Self::Reject => Capability::Approve,
        }
    }
}

impl std::fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WorkflowAction {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submit" => Ok(Self::Submit),
            "validate" => Ok(Self::Validate),
            "reject" => Ok(Self::Reject),
            other => Err(GovernanceError::NotFound(format!(
                "workflow action '{}'",
                other
            ))),
        }
    }
}

/// Context shared by all transitions
pub struct TransitionContext<'a> {
    pub actor: &'a Actor,
    pub now: DateTime<Utc>,
    pub clock: &'a PeriodClock,
    pub policy: &'a dyn CapabilityPolicy,
}

/// Apply `action` to `current`, returning the next aggregate.
pub fn apply(
    action: WorkflowAction,
    current: &SubmissionAggregate,
    ctx: &TransitionContext<'_>,
    note: Option<String>,
) -> GovernanceResult<SubmissionAggregate> {
    if current.status != action.required_status() {
        return Err(GovernanceError::invalid_transition(
            current.surfaced_status(),
            action.name(),
        ));
    }
    ctx.policy.require(ctx.actor, action.capability())?;
    if action == WorkflowAction::Submit {
        ctx.clock.check_window(ctx.now)?;
    }

    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let mut next = current.clone();
    next.set_status(action.target_status(), &ctx.actor.id, ctx.now, note.clone());
    match action {
        WorkflowAction::Submit => next.last_rejection = None,
        WorkflowAction::Reject => {
            next.last_rejection = Some(RejectionNote {
                rejected_by: ctx.actor.id.clone(),
                rejected_at: ctx.now,
                note,
            });
        }
        WorkflowAction::Validate => {}
    }
    Ok(next)
}

pub fn submit(
    current: &SubmissionAggregate,
    ctx: &TransitionContext<'_>,
) -> GovernanceResult<SubmissionAggregate> {
    apply(WorkflowAction::Submit, current, ctx, None)
}

pub fn validate(
    current: &SubmissionAggregate,
    ctx: &TransitionContext<'_>,
    note: Option<String>,
) -> GovernanceResult<SubmissionAggregate> {
    apply(WorkflowAction::Validate, current, ctx, note)
}

pub fn reject(
    current: &SubmissionAggregate,
    ctx: &TransitionContext<'_>,
    note: Option<String>,
) -> GovernanceResult<SubmissionAggregate> {
    apply(WorkflowAction::Reject, current, ctx, note)
}
