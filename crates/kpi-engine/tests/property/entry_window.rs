//! Property tests: the entry window is an inclusive day-of-month range.

use chrono::{TimeZone, Utc};
use kpi_engine::{is_within_entry_window, EntryWindow, PeriodClock};
use proptest::prelude::*;

/// Valid (start, end) bounds.
fn arb_bounds() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=31).prop_flat_map(|start| (Just(start), start..=31))
}

proptest! {
    /// The predicate is true exactly when start <= day <= end.
    #[test]
    fn window_is_inclusive_range(
        (start, end) in arb_bounds(),
        day in 1u32..=28,
        month in 1u32..=12,
        hour in 0u32..24,
    ) {
        let now = Utc.with_ymd_and_hms(2026, month, day, hour, 0, 0).unwrap();
        let inside = is_within_entry_window(now, start, end).unwrap();
        prop_assert_eq!(inside, start <= day && day <= end);

        let clock = PeriodClock::new(EntryWindow::new(start, end).unwrap());
        prop_assert_eq!(clock.is_within_entry_window(now), inside);
        prop_assert_eq!(clock.check_window(now).is_ok(), inside);
    }

    /// Zero or inverted bounds are refused rather than evaluated.
    #[test]
    fn invalid_bounds_are_rejected(start in 0u32..40, end in 0u32..40) {
        let valid = start >= 1 && end >= 1 && start <= end && end <= 31;
        prop_assert_eq!(EntryWindow::new(start, end).is_ok(), valid);
    }

    /// The current period is the calendar month of "now".
    #[test]
    fn current_period_is_calendar_month(month in 1u32..=12, day in 1u32..=28) {
        let now = Utc.with_ymd_and_hms(2026, month, day, 12, 0, 0).unwrap();
        let period = kpi_engine::current_period(now);
        prop_assert_eq!((period.month(), period.year()), (month, 2026));
    }
}
