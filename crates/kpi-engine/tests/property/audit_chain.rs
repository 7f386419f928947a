//! Property tests: the audit chain detects any edit to a past record.

use chrono::Utc;
use kpi_engine::{AuditEvent, AuditLog};
use kpi_types::{IndicatorId, Period, ProcessId, SubmissionKey};
use proptest::prelude::*;

fn build_log(values: &[(u32, f64)]) -> AuditLog {
    let mut log = AuditLog::new();
    let now = Utc::now();
    for (month, value) in values {
        log.append(
            SubmissionKey::new(ProcessId::new("proc"), Period::new(*month, 2026).unwrap()),
            AuditEvent::ValueRecorded {
                indicator_id: IndicatorId::new("ind"),
                value: *value,
                admin_override: false,
            },
            "pilot",
            now,
        );
    }
    log
}

proptest! {
    /// Any sequence of appends yields a verifiable chain.
    #[test]
    fn appended_chain_verifies(
        values in prop::collection::vec((1u32..=12, -1.0e6f64..1.0e6), 1..20),
    ) {
        let log = build_log(&values);
        prop_assert_eq!(log.len(), values.len());
        prop_assert!(log.verify_chain());
    }

    /// Rewriting the actor of any single record breaks verification.
    #[test]
    fn rewritten_actor_is_detected(
        values in prop::collection::vec((1u32..=12, -1.0e6f64..1.0e6), 1..20),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut records = build_log(&values).records().to_vec();
        let i = pick.index(records.len());
        records[i].actor = "mallory".into();
        prop_assert!(AuditLog::from_records(records).is_err());
    }
}
