//! Frequency resolver: is an indicator due in a given period?
//!
//! Due-ness drives completion metrics and non-administrator write access.
//! Frequencies are a closed enum, so an unrecognized cadence can only enter
//! the system as text and is rejected at parse time with `UnknownFrequency`.

use kpi_types::{Frequency, GovernanceResult, Indicator, Period};

/// Whether `frequency` expects a value in `period`.
///
/// Monthly is always due, quarterly in March/June/September/December,
/// semesterly in June/December, annual in December.
pub fn frequency_is_due(frequency: Frequency, period: Period) -> bool {
    match frequency {
        Frequency::Monthly => true,
        Frequency::Quarterly => period.closes_quarter(),
        Frequency::Semesterly => period.closes_semester(),
        Frequency::Annual => period.closes_year(),
    }
}

/// Whether `indicator` is due in `period`.
pub fn is_due(indicator: &Indicator, period: Period) -> bool {
    frequency_is_due(indicator.frequency, period)
}

/// Resolve due-ness from a raw catalog value.
pub fn is_due_raw(frequency: &str, period: Period) -> GovernanceResult<bool> {
    Ok(frequency_is_due(frequency.parse()?, period))
}

/// Months of the year in which `frequency` is due.
pub fn due_months(frequency: Frequency, year: i32) -> Vec<u32> {
    Period::months_of(year)
        .filter(|p| frequency_is_due(frequency, *p))
        .map(|p| p.month())
        .collect()
}
