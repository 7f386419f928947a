//! Indicator catalog: processes, indicators and their collection cadence

use crate::{GovernanceError, GovernanceResult, IndicatorId, ProcessId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ── Frequency ────────────────────────────────────────────────────────

/// How often an indicator expects a new value.
///
/// Parsing is strict: an unrecognized cadence is a catalog error, never a
/// silent fallback to monthly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Frequency {
    Monthly,
    Quarterly,
    Semesterly,
    Annual,
}

impl Frequency {
    pub fn name(self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Semesterly => "SEMESTERLY",
            Self::Annual => "ANNUAL",
        }
    }
}

impl FromStr for Frequency {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(Self::Monthly),
            "QUARTERLY" => Ok(Self::Quarterly),
            "SEMESTERLY" => Ok(Self::Semesterly),
            "ANNUAL" => Ok(Self::Annual),
            _ => Err(GovernanceError::UnknownFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = GovernanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Comparison direction ─────────────────────────────────────────────

/// Which side of the target counts as conforming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonDirection {
    /// `actual >= target`
    #[default]
    HigherIsBetter,
    /// `actual <= target`
    LowerIsBetter,
}

impl ComparisonDirection {
    pub fn conforms(self, actual: f64, target: f64) -> bool {
        match self {
            Self::HigherIsBetter => actual >= target,
            Self::LowerIsBetter => actual <= target,
        }
    }
}

// ── Process ──────────────────────────────────────────────────────────

/// An organizational process owning a set of indicators
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    /// Tenant (organization) the process belongs to
    pub tenant_id: TenantId,
    /// Human-readable unique code, e.g. `PR-ACH`
    pub code: String,
    pub label: String,
}

impl Process {
    pub fn new(
        tenant_id: TenantId,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: ProcessId::generate(),
            tenant_id,
            code: code.into(),
            label: label.into(),
        }
    }

    pub fn with_id(mut self, id: ProcessId) -> Self {
        self.id = id;
        self
    }
}

// ── Indicator ────────────────────────────────────────────────────────

/// A numeric performance indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    /// Human-readable unique code, e.g. `IND-01`
    pub code: String,
    pub label: String,
    /// Unit symbol (`%`, `h`, `€`, ...)
    pub unit: String,
    /// Target value; always finite
    pub target: f64,
    /// Owning process
    pub process_id: ProcessId,
    pub frequency: Frequency,
    #[serde(default)]
    pub direction: ComparisonDirection,
    /// Free-text description of how the value is computed
    #[serde(default)]
    pub calculation_mode: String,
    /// Deactivated indicators keep their history but accept no new entries
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deactivated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Indicator {
    pub fn new(
        code: impl Into<String>,
        label: impl Into<String>,
        process_id: ProcessId,
        frequency: Frequency,
        target: f64,
    ) -> Self {
        Self {
            id: IndicatorId::generate(),
            code: code.into(),
            label: label.into(),
            unit: String::new(),
            target,
            process_id,
            frequency,
            direction: ComparisonDirection::default(),
            calculation_mode: String::new(),
            active: true,
            deactivated_at: None,
        }
    }

    pub fn with_id(mut self, id: IndicatorId) -> Self {
        self.id = id;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_direction(mut self, direction: ComparisonDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_calculation_mode(mut self, mode: impl Into<String>) -> Self {
        self.calculation_mode = mode.into();
        self
    }

    /// Check the catalog invariants that do not depend on other entries.
    pub fn validate(&self) -> GovernanceResult<()> {
        if self.code.trim().is_empty() {
            return Err(GovernanceError::InvalidCatalog(
                "indicator code must not be empty".into(),
            ));
        }
        if !self.target.is_finite() {
            return Err(GovernanceError::InvalidCatalog(format!(
                "target of indicator {} must be a finite number",
                self.code
            )));
        }
        Ok(())
    }

    pub fn conforms(&self, actual: f64) -> bool {
        self.direction.conforms(actual, self.target)
    }

    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        if self.active {
            self.active = false;
            self.deactivated_at = Some(at);
        }
    }
}
