//! Annual rollup: twelve months of submissions projected per indicator
//!
//! The projection is read-only and tolerates any subset of the twelve
//! aggregates being absent. Every submission is read regardless of status.

use crate::frequency::frequency_is_due;
use kpi_types::{
    AnnualMatrixRow, Indicator, MatrixCell, Period, Process, ProcessMatrix, RowSummary,
    SubmissionAggregate,
};

/// Build the annual matrix of `process` for `year`.
///
/// `indicators` are the catalog entries owned by the process, in display
/// order. Active indicators always get a row; deactivated ones only when
/// they still hold a value in `year`. `aggregates` may contain submissions
/// of other years, which are ignored.
pub fn build_matrix(
    process: &Process,
    year: i32,
    indicators: &[Indicator],
    aggregates: &[SubmissionAggregate],
) -> ProcessMatrix {
    let mut by_month: [Option<&SubmissionAggregate>; 12] = [None; 12];
    for agg in aggregates {
        let period = agg.period();
        if agg.process_id() == &process.id && period.year() == year {
            by_month[(period.month() - 1) as usize] = Some(agg);
        }
    }

    let rows = indicators
        .iter()
        .filter(|ind| ind.process_id == process.id)
        .filter(|ind| {
            ind.active
                || by_month
                    .iter()
                    .flatten()
                    .any(|agg| agg.value_of(&ind.id).is_some())
        })
        .map(|ind| build_row(ind, year, &by_month))
        .collect();

    ProcessMatrix {
        process_id: process.id.clone(),
        process_code: process.code.clone(),
        process_label: process.label.clone(),
        year,
        rows,
    }
}

fn build_row(
    indicator: &Indicator,
    year: i32,
    by_month: &[Option<&SubmissionAggregate>; 12],
) -> AnnualMatrixRow {
    let cells: Vec<MatrixCell> = Period::months_of(year)
        .zip(by_month.iter().copied())
        .map(|(period, agg)| {
            let actual = agg.and_then(|a| a.value_of(&indicator.id));
            MatrixCell {
                month: period.month(),
                actual,
                due: frequency_is_due(indicator.frequency, period),
                conforms: actual.map(|v| indicator.conforms(v)),
                status: agg.map(|a| a.surfaced_status()),
            }
        })
        .collect();
    let summary = summarize(&cells);

    AnnualMatrixRow {
        indicator_id: indicator.id.clone(),
        code: indicator.code.clone(),
        label: indicator.label.clone(),
        unit: indicator.unit.clone(),
        target: indicator.target,
        direction: indicator.direction,
        frequency: indicator.frequency,
        active: indicator.active,
        cells,
        summary,
    }
}

/// Summary over due months only; catch-up values in other months are shown
/// but not counted.
fn summarize(cells: &[MatrixCell]) -> RowSummary {
    let due: Vec<&MatrixCell> = cells.iter().filter(|c| c.due).collect();
    let values: Vec<f64> = due.iter().filter_map(|c| c.actual).collect();
    let conforming = due.iter().filter(|c| c.conforms == Some(true)).count();

    let filled = values.len();
    let (conformity_rate, mean_actual) = if filled == 0 {
        (None, None)
    } else {
        (
            Some(conforming as f64 / filled as f64),
            Some(values.iter().sum::<f64>() / filled as f64),
        )
    };

    RowSummary {
        due_months: due.len(),
        filled,
        conforming,
        conformity_rate,
        mean_actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use kpi_types::{
        ComparisonDirection, Frequency, IndicatorEntry, SubmissionKey, SubmissionStatus, TenantId,
    };

    fn process() -> Process {
        Process::new(TenantId::new("t"), "PR-A", "Process A")
    }

    fn aggregate(
        process: &Process,
        month: u32,
        values: &[(&Indicator, f64)],
    ) -> SubmissionAggregate {
        let at = Utc.with_ymd_and_hms(2026, month, 2, 0, 0, 0).unwrap();
        let mut agg = SubmissionAggregate::new(
            SubmissionKey::new(process.id.clone(), Period::new(month, 2026).unwrap()),
            at,
        );
        for (ind, v) in values {
            agg.upsert_entry(IndicatorEntry {
                indicator_id: ind.id.clone(),
                value: Some(*v),
                updated_at: at,
                updated_by: "pilot".into(),
                admin_override: false,
            });
        }
        agg
    }

    #[test]
    fn test_empty_year_yields_empty_rows() {
        let p = process();
        let indicators = vec![
            Indicator::new("IND-01", "On time", p.id.clone(), Frequency::Monthly, 90.0),
            Indicator::new("IND-09", "Audits", p.id.clone(), Frequency::Quarterly, 100.0),
        ];
        let matrix = build_matrix(&p, 2026, &indicators, &[]);
        assert_eq!(matrix.rows.len(), 2);
        for row in &matrix.rows {
            assert_eq!(row.cells.len(), 12);
            assert!(row.cells.iter().all(|c| c.actual.is_none() && c.status.is_none()));
            assert_eq!(row.summary.filled, 0);
            assert_eq!(row.summary.conformity_rate, None);
        }
        assert_eq!(matrix.rows[1].summary.due_months, 4);
    }

    #[test]
    fn test_cells_and_conformity() {
        let p = process();
        let ind = Indicator::new("IND-01", "On time", p.id.clone(), Frequency::Monthly, 90.0);
        let lower = Indicator::new("IND-02", "Complaints", p.id.clone(), Frequency::Monthly, 5.0)
            .with_direction(ComparisonDirection::LowerIsBetter);

        let mut march = aggregate(&p, 3, &[(&ind, 95.0), (&lower, 7.0)]);
        march.status = SubmissionStatus::Validated;
        let may = aggregate(&p, 5, &[(&ind, 80.0), (&lower, 3.0)]);
        let last_year = {
            let mut a = aggregate(&p, 5, &[(&ind, 1.0)]);
            a.key.period = Period::new(5, 2025).unwrap();
            a
        };

        let matrix = build_matrix(&p, 2026, &[ind, lower], &[march, may, last_year]);
        let row = &matrix.rows[0];
        assert_eq!(row.cells[2].actual, Some(95.0));
        assert_eq!(row.cells[2].conforms, Some(true));
        assert_eq!(row.cells[2].status, Some(SubmissionStatus::Validated));
        assert_eq!(row.cells[4].actual, Some(80.0));
        assert_eq!(row.cells[4].conforms, Some(false));
        assert_eq!(row.cells[3].actual, None);
        assert_eq!(row.summary.filled, 2);
        assert_eq!(row.summary.conformity_rate, Some(0.5));
        assert_eq!(row.summary.mean_actual, Some(87.5));

        let lower_row = &matrix.rows[1];
        assert_eq!(lower_row.cells[2].conforms, Some(false));
        assert_eq!(lower_row.cells[4].conforms, Some(true));
    }

    #[test]
    fn test_deactivated_indicator_kept_only_with_history() {
        let p = process();
        let mut kept = Indicator::new("IND-03", "Old", p.id.clone(), Frequency::Monthly, 1.0);
        let mut dropped = Indicator::new("IND-04", "Older", p.id.clone(), Frequency::Monthly, 1.0);
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        kept.deactivate(at);
        dropped.deactivate(at);

        let jan = aggregate(&p, 1, &[(&kept, 2.0)]);
        let matrix = build_matrix(&p, 2026, &[kept, dropped], &[jan]);
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].code, "IND-03");
        assert!(!matrix.rows[0].active);
    }

    #[test]
    fn test_non_due_values_shown_but_not_counted() {
        let p = process();
        let ind = Indicator::new("IND-09", "Audits", p.id.clone(), Frequency::Quarterly, 10.0);
        let april = aggregate(&p, 4, &[(&ind, 12.0)]);
        let matrix = build_matrix(&p, 2026, std::slice::from_ref(&ind), &[april]);
        let row = &matrix.rows[0];
        assert_eq!(row.cells[3].actual, Some(12.0));
        assert!(!row.cells[3].due);
        assert_eq!(row.summary.filled, 0);
    }
}
