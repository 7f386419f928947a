//! Actors, roles and capabilities

use crate::TenantId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role carried by the caller's session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    QualityManager,
    /// Process owner responsible for the monthly submission
    ProcessPilot,
    Contributor,
    /// Read-only access for internal/external auditors
    Auditor,
}

impl Role {
    /// Roles that carry administrator authority.
    pub fn is_administrative(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin | Self::QualityManager)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Admin => "ADMIN",
            Self::QualityManager => "QUALITY_MANAGER",
            Self::ProcessPilot => "PROCESS_PILOT",
            Self::Contributor => "CONTRIBUTOR",
            Self::Auditor => "AUDITOR",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "QUALITY_MANAGER" => Ok(Self::QualityManager),
            "PROCESS_PILOT" => Ok(Self::ProcessPilot),
            "CONTRIBUTOR" => Ok(Self::Contributor),
            "AUDITOR" => Ok(Self::Auditor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Something an actor may be allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Validate or reject a submitted period
    Approve,
    /// Write values regardless of entry window, status and due-ness
    OverrideWindow,
    /// Write values inside the normal window
    RecordValues,
    /// Submit a draft period for review
    Submit,
    /// Create, edit and deactivate catalog entries
    ManageCatalog,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::OverrideWindow => "override_window",
            Self::RecordValues => "record_values",
            Self::Submit => "submit",
            Self::ManageCatalog => "manage_catalog",
        }
    }
}

/// The caller of an operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identity (login, subject claim, ...)
    pub id: String,
    pub role: Role,
    pub tenant_id: TenantId,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, tenant_id: TenantId) -> Self {
        Self {
            id: id.into(),
            role,
            tenant_id,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
