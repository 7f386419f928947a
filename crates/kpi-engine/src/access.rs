//! Capability policy: what an actor may do
//!
//! Call sites ask for a [`Capability`] instead of comparing role names.

use kpi_types::{Actor, Capability, GovernanceError, GovernanceResult, Role};
use std::collections::BTreeSet;

/// Decides which capabilities an actor holds
pub trait CapabilityPolicy: Send + Sync + std::fmt::Debug {
    /// Administrators approve submissions and may write outside the window.
    fn is_administrator(&self, actor: &Actor) -> bool;

    fn grants(&self, actor: &Actor, capability: Capability) -> bool;

    /// `Ok` when granted, `NotAuthorized` otherwise.
    fn require(&self, actor: &Actor, capability: Capability) -> GovernanceResult<()> {
        if self.grants(actor, capability) {
            Ok(())
        } else {
            Err(GovernanceError::NotAuthorized {
                actor: actor.id.clone(),
                action: capability.name().to_string(),
            })
        }
    }
}

/// Role-based policy with an optional list of superuser identities that are
/// treated as administrators whatever their session role.
#[derive(Clone, Debug, Default)]
pub struct RolePolicy {
    superusers: BTreeSet<String>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_superusers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.superusers.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn is_superuser(&self, actor_id: &str) -> bool {
        self.superusers.contains(actor_id)
    }
}

impl CapabilityPolicy for RolePolicy {
    fn is_administrator(&self, actor: &Actor) -> bool {
        actor.role.is_administrative() || self.is_superuser(&actor.id)
    }

    fn grants(&self, actor: &Actor, capability: Capability) -> bool {
        if self.is_administrator(actor) {
            // Administrators review; they never submit their own periods.
            return !matches!(capability, Capability::Submit);
        }
        match actor.role {
            Role::ProcessPilot | Role::Contributor => {
                matches!(capability, Capability::RecordValues | Capability::Submit)
            }
            Role::Auditor => false,
            Role::SuperAdmin | Role::Admin | Role::QualityManager => false,
        }
    }
}
