//! Property tests: due-ness follows the calendar rule of each frequency.

use kpi_engine::{due_months, frequency_is_due, is_due_raw};
use kpi_types::{Frequency, GovernanceError, Period};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_period() -> impl Strategy<Value = Period> {
    (1u32..=12, 1990i32..2100).prop_map(|(month, year)| Period::new(month, year).unwrap())
}

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::Semesterly),
        Just(Frequency::Annual),
    ]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Monthly indicators are due in every month.
    #[test]
    fn monthly_is_always_due(period in arb_period()) {
        prop_assert!(frequency_is_due(Frequency::Monthly, period));
    }

    /// Quarterly indicators are due exactly in quarter-closing months.
    #[test]
    fn quarterly_due_iff_quarter_close(period in arb_period()) {
        let expected = [3, 6, 9, 12].contains(&period.month());
        prop_assert_eq!(frequency_is_due(Frequency::Quarterly, period), expected);
    }

    /// Semesterly indicators are due in June and December only.
    #[test]
    fn semesterly_due_iff_semester_close(period in arb_period()) {
        let expected = period.month() == 6 || period.month() == 12;
        prop_assert_eq!(frequency_is_due(Frequency::Semesterly, period), expected);
    }

    /// Annual indicators are due in December only.
    #[test]
    fn annual_due_iff_december(period in arb_period()) {
        prop_assert_eq!(frequency_is_due(Frequency::Annual, period), period.month() == 12);
    }

    /// The due-month listing agrees with the per-period rule and never
    /// depends on the year.
    #[test]
    fn due_months_match_rule(frequency in arb_frequency(), year in 1990i32..2100) {
        let months = due_months(frequency, year);
        for month in 1..=12u32 {
            let period = Period::new(month, year).unwrap();
            prop_assert_eq!(months.contains(&month), frequency_is_due(frequency, period));
        }
        prop_assert_eq!(months, due_months(frequency, 2026));
    }

    /// Textual frequencies parse case-insensitively to the same answer.
    #[test]
    fn raw_frequency_matches_enum(frequency in arb_frequency(), period in arb_period()) {
        let lower = frequency.name().to_lowercase();
        prop_assert_eq!(is_due_raw(&lower, period), Ok(frequency_is_due(frequency, period)));
    }

    /// Anything that is not one of the four cadences fails loudly.
    #[test]
    fn unknown_frequency_never_defaults(raw in "[A-Z]{3,12}", period in arb_period()) {
        prop_assume!(!["MONTHLY", "QUARTERLY", "SEMESTERLY", "ANNUAL"].contains(&raw.as_str()));
        let is_unknown = matches!(
            is_due_raw(&raw, period),
            Err(GovernanceError::UnknownFrequency(_))
        );
        prop_assert!(is_unknown);
    }

    /// Months outside 1..=12 never form a period.
    #[test]
    fn out_of_range_months_are_rejected(month in 13u32..1000, year in 1990i32..2100) {
        prop_assert!(Period::new(month, year).is_err());
        prop_assert!(Period::new(0, year).is_err());
    }
}
