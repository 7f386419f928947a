//! Value write path and completion metrics for a submission

use crate::access::CapabilityPolicy;
use crate::clock::PeriodClock;
use crate::frequency::is_due;
use crate::permission::{check_edit, EditAuthority, EditTarget};
use chrono::{DateTime, Utc};
use kpi_types::{
    Actor, Completion, GovernanceError, GovernanceResult, Indicator, IndicatorEntry, Period,
    SubmissionAggregate,
};
use serde::{Deserialize, Serialize};

/// A value as received from a caller: a JSON number or a numeric string.
///
/// Strings accept a decimal comma (`"87,5"`) as entered in the grid.
/// Any other JSON shape is kept as `Other` and refused when parsed, so a
/// bad item in a bulk save fails on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl EntryValue {
    /// Parse into a finite number.
    pub fn to_finite(&self) -> GovernanceResult<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let normalized = s.trim().replace(',', ".");
                if normalized.is_empty() {
                    return Err(GovernanceError::InvalidValue("empty value".into()));
                }
                normalized.parse::<f64>().map_err(|_| {
                    GovernanceError::InvalidValue(format!("'{}' is not a number", s))
                })?
            }
            Self::Other(other) => {
                return Err(GovernanceError::InvalidValue(format!(
                    "{} is not a number",
                    other
                )))
            }
        };
        ensure_finite(value)
    }
}

impl From<f64> for EntryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

pub fn ensure_finite(value: f64) -> GovernanceResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GovernanceError::InvalidValue(format!(
            "{} is not a finite number",
            value
        )))
    }
}

/// Result of a successful write
#[derive(Clone, Debug)]
pub struct RecordedValue {
    pub aggregate: SubmissionAggregate,
    pub value: f64,
    pub authority: EditAuthority,
}

/// Write `value` for `indicator` into `current`.
///
/// Permission is checked before the value is parsed, so a refused write
/// reports `EditNotPermitted` even when the value is malformed. The
/// aggregate's workflow status is never touched.
pub fn record_value(
    current: &SubmissionAggregate,
    indicator: &Indicator,
    value: &EntryValue,
    actor: &Actor,
    now: DateTime<Utc>,
    clock: &PeriodClock,
    policy: &dyn CapabilityPolicy,
) -> GovernanceResult<RecordedValue> {
    if &indicator.process_id != current.process_id() {
        return Err(GovernanceError::NotFound(format!(
            "indicator {} in process {}",
            indicator.code,
            current.process_id()
        )));
    }

    let target = EditTarget {
        period: current.period(),
        status: current.status,
    };
    let authority = check_edit(indicator, target, actor, now, clock, policy)?;
    let value = value.to_finite()?;

    let mut next = current.clone();
    next.upsert_entry(IndicatorEntry {
        indicator_id: indicator.id.clone(),
        value: Some(value),
        updated_at: now,
        updated_by: actor.id.clone(),
        admin_override: authority.is_override(),
    });
    Ok(RecordedValue {
        aggregate: next,
        value,
        authority,
    })
}

/// Completion of `aggregate` over the indicators due in its period.
///
/// Values held for indicators that are not due are informational and never
/// counted. Deactivated indicators are not expected to report.
pub fn completion<'a, I>(
    aggregate: Option<&SubmissionAggregate>,
    period: Period,
    indicators: I,
) -> Completion
where
    I: IntoIterator<Item = &'a Indicator>,
{
    let mut completion = Completion::default();
    for indicator in indicators {
        if !indicator.active || !is_due(indicator, period) {
            continue;
        }
        completion.due += 1;
        if aggregate
            .and_then(|agg| agg.value_of(&indicator.id))
            .is_some()
        {
            completion.filled += 1;
        }
    }
    completion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RolePolicy;
    use chrono::TimeZone;
    use kpi_types::{Frequency, ProcessId, Role, SubmissionKey, SubmissionStatus, TenantId};

    fn process() -> ProcessId {
        ProcessId::new("proc-a")
    }

    fn draft(month: u32) -> SubmissionAggregate {
        SubmissionAggregate::new(
            SubmissionKey::new(process(), Period::new(month, 2026).unwrap()),
            Utc.with_ymd_and_hms(2026, month, 1, 0, 0, 0).unwrap(),
        )
    }

    fn ind(code: &str, frequency: Frequency) -> Indicator {
        Indicator::new(code, code, process(), frequency, 90.0)
    }

    fn pilot() -> Actor {
        Actor::new("pilot", Role::ProcessPilot, TenantId::new("t"))
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, month, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_value_parsing() {
        assert_eq!(EntryValue::Number(4.5).to_finite().unwrap(), 4.5);
        assert_eq!(EntryValue::Text(" 87,5 ".into()).to_finite().unwrap(), 87.5);
        assert!(matches!(
            EntryValue::Text("abc".into()).to_finite(),
            Err(GovernanceError::InvalidValue(_))
        ));
        assert!(EntryValue::Text("".into()).to_finite().is_err());
        assert!(EntryValue::Number(f64::NAN).to_finite().is_err());
        assert!(EntryValue::Text("inf".into()).to_finite().is_err());
    }

    #[test]
    fn test_non_numeric_json_shapes_are_invalid_values() {
        for raw in ["null", "true", r#"{"x":1}"#, "[1]"] {
            let value: EntryValue = serde_json::from_str(raw).unwrap();
            assert!(matches!(value, EntryValue::Other(_)), "{}", raw);
            assert!(matches!(
                value.to_finite(),
                Err(GovernanceError::InvalidValue(_))
            ));
        }
        let value: EntryValue = serde_json::from_str("91").unwrap();
        assert_eq!(value, EntryValue::Number(91.0));
    }

    #[test]
    fn test_entry_value_deserializes_untagged() {
        let n: EntryValue = serde_json::from_str("12.5").unwrap();
        let s: EntryValue = serde_json::from_str("\"12,5\"").unwrap();
        assert_eq!(n.to_finite().unwrap(), s.to_finite().unwrap());
    }

    #[test]
    fn test_record_value_stamps_actor() {
        let clock = PeriodClock::default();
        let policy = RolePolicy::new();
        let agg = draft(3);
        let indicator = ind("IND-01", Frequency::Monthly);

        let written = record_value(
            &agg,
            &indicator,
            &EntryValue::Number(92.0),
            &pilot(),
            at(3, 4),
            &clock,
            &policy,
        )
        .unwrap();
        let entry = written.aggregate.entry(&indicator.id).unwrap();
        assert_eq!(entry.value, Some(92.0));
        assert_eq!(entry.updated_by, "pilot");
        assert!(!entry.admin_override);
        assert_eq!(written.aggregate.status, SubmissionStatus::Draft);
        assert!(agg.entries.is_empty());
    }

    #[test]
    fn test_refused_write_reports_permission_before_value() {
        let clock = PeriodClock::default();
        let policy = RolePolicy::new();
        let err = record_value(
            &draft(3),
            &ind("IND-01", Frequency::Monthly),
            &EntryValue::Text("oops".into()),
            &pilot(),
            at(3, 20),
            &clock,
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::EditNotPermitted { .. }));
    }

    #[test]
    fn test_foreign_indicator_is_not_found() {
        let clock = PeriodClock::default();
        let policy = RolePolicy::new();
        let foreign = Indicator::new("X", "X", ProcessId::new("other"), Frequency::Monthly, 1.0);
        let err = record_value(
            &draft(3),
            &foreign,
            &EntryValue::Number(1.0),
            &pilot(),
            at(3, 2),
            &clock,
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::NotFound(_)));
    }

    #[test]
    fn test_completion_counts_due_only() {
        let clock = PeriodClock::default();
        let policy = RolePolicy::new();
        let admin = Actor::new("admin", Role::Admin, TenantId::new("t"));
        let monthly = ind("IND-01", Frequency::Monthly);
        let quarterly = ind("IND-09", Frequency::Quarterly);

        // April: only the monthly indicator is due; the admin writes both.
        let mut agg = draft(4);
        for indicator in [&monthly, &quarterly] {
            let value = EntryValue::Number(1.0);
            agg = record_value(&agg, indicator, &value, &admin, at(4, 2), &clock, &policy)
                .unwrap()
                .aggregate;
        }
        let c = completion(Some(&agg), agg.period(), [&monthly, &quarterly]);
        assert_eq!(c, Completion { due: 1, filled: 1 });
        assert!(agg.entry(&quarterly.id).unwrap().admin_override);

        let empty = completion(None, Period::new(6, 2026).unwrap(), [&monthly, &quarterly]);
        assert_eq!(empty, Completion { due: 2, filled: 0 });
    }
}
