//! Catalog administration requests and JSON seed files

use kpi_types::{
    ComparisonDirection, Frequency, GovernanceError, GovernanceResult, Indicator, ProcessId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Request to register a process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewProcess {
    pub code: String,
    pub label: String,
}

/// Request to register an indicator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewIndicator {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub unit: String,
    pub target: f64,
    pub process_id: ProcessId,
    pub frequency: Frequency,
    #[serde(default)]
    pub direction: ComparisonDirection,
    #[serde(default)]
    pub calculation_mode: String,
}

impl NewIndicator {
    pub fn into_indicator(self) -> Indicator {
        Indicator::new(self.code.trim(), self.label, self.process_id, self.frequency, self.target)
            .with_unit(self.unit)
            .with_direction(self.direction)
            .with_calculation_mode(self.calculation_mode)
    }
}

/// Partial update of an indicator; absent fields are left unchanged.
///
/// The code and owning process are immutable once registered.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndicatorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ComparisonDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculation_mode: Option<String>,
}

impl IndicatorUpdate {
    /// Apply to a copy of `indicator`.
    pub fn apply_to(self, indicator: &Indicator) -> Indicator {
        let mut next = indicator.clone();
        if let Some(label) = self.label {
            next.label = label;
        }
        if let Some(unit) = self.unit {
            next.unit = unit;
        }
        if let Some(target) = self.target {
            next.target = target;
        }
        if let Some(frequency) = self.frequency {
            next.frequency = frequency;
        }
        if let Some(direction) = self.direction {
            next.direction = direction;
        }
        if let Some(mode) = self.calculation_mode {
            next.calculation_mode = mode;
        }
        next
    }
}

// ── Seed files ───────────────────────────────────────────────────────

/// A catalog seed file.
///
/// ```json
/// {
///   "processes": [{ "code": "PR-ACH", "label": "Purchasing" }],
///   "indicators": [{
///     "code": "IND-01", "label": "On-time deliveries", "unit": "%",
///     "target": 90, "process_code": "PR-ACH", "frequency": "MONTHLY"
///   }]
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub processes: Vec<ProcessSeed>,
    #[serde(default)]
    pub indicators: Vec<IndicatorSeed>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessSeed {
    pub code: String,
    pub label: String,
}

/// Indicator line of a seed file. The frequency stays textual until the
/// seed is applied so an unknown cadence is reported as such.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndicatorSeed {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub unit: String,
    pub target: f64,
    pub process_code: String,
    pub frequency: String,
    #[serde(default)]
    pub direction: ComparisonDirection,
    #[serde(default)]
    pub calculation_mode: String,
}

impl CatalogSeed {
    pub fn from_json(json: &str) -> GovernanceResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GovernanceError::InvalidCatalog(format!("malformed catalog seed: {}", e)))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> GovernanceResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            GovernanceError::InvalidCatalog(format!(
                "cannot read catalog seed {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

/// What a seed run inserted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSummary {
    pub processes_added: usize,
    pub indicators_added: usize,
    /// Entries whose code already existed for the tenant
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_parses_textual_frequency() {
        let seed = CatalogSeed::from_json(
            r#"{
                "processes": [{ "code": "PR-ACH", "label": "Purchasing" }],
                "indicators": [{
                    "code": "IND-01", "label": "On-time", "target": 90,
                    "process_code": "PR-ACH", "frequency": "fortnightly"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(seed.indicators[0].frequency, "fortnightly");
        assert_eq!(seed.indicators[0].direction, ComparisonDirection::HigherIsBetter);
    }

    #[test]
    fn test_malformed_seed_is_invalid_catalog() {
        assert!(matches!(
            CatalogSeed::from_json("[1, 2]"),
            Err(GovernanceError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_update_leaves_absent_fields() {
        let ind = Indicator::new("IND-01", "On-time", ProcessId::new("p"), Frequency::Monthly, 90.0)
            .with_unit("%");
        let update = IndicatorUpdate {
            target: Some(95.0),
            frequency: Some(Frequency::Quarterly),
            ..Default::default()
        };
        let next = update.apply_to(&ind);
        assert_eq!(next.target, 95.0);
        assert_eq!(next.frequency, Frequency::Quarterly);
        assert_eq!(next.unit, "%");
        assert_eq!(next.code, "IND-01");
    }
}
