//! Period clock: derives the reporting period and entry window from "now"
//!
//! Everything here is a pure function of the instant it is given. Nothing
//! reads the system time except [`SystemClock`], which callers inject.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};
use kpi_types::{GovernanceError, GovernanceResult, Period};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Inclusive day-of-month range during which non-administrators may enter
/// and submit values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryWindow {
    start_day: u32,
    end_day: u32,
}

impl EntryWindow {
    pub fn new(start_day: u32, end_day: u32) -> GovernanceResult<Self> {
        if start_day == 0 || end_day == 0 {
            return Err(GovernanceError::InvalidPeriod(format!(
                "window bounds must be positive, got {}..={}",
                start_day, end_day
            )));
        }
        if start_day > end_day || end_day > 31 {
            return Err(GovernanceError::InvalidPeriod(format!(
                "window {}..={} is not a valid day-of-month range",
                start_day, end_day
            )));
        }
        Ok(Self { start_day, end_day })
    }

    pub fn start_day(&self) -> u32 {
        self.start_day
    }

    pub fn end_day(&self) -> u32 {
        self.end_day
    }

    pub fn contains_day(&self, day: u32) -> bool {
        (self.start_day..=self.end_day).contains(&day)
    }
}

impl Default for EntryWindow {
    /// Days 1 to 10 of every month.
    fn default() -> Self {
        Self {
            start_day: 1,
            end_day: 10,
        }
    }
}

/// Current period of `now`, in UTC.
pub fn current_period(now: DateTime<Utc>) -> Period {
    Period::containing(&now)
}

/// Whether the day-of-month of `now` (UTC) lies in `[start_day, end_day]`.
pub fn is_within_entry_window(
    now: DateTime<Utc>,
    start_day: u32,
    end_day: u32,
) -> GovernanceResult<bool> {
    let window = EntryWindow::new(start_day, end_day)?;
    Ok(window.contains_day(now.day()))
}

/// Period clock bound to an entry window and the calendar it is read in.
#[derive(Clone, Copy, Debug)]
pub struct PeriodClock {
    window: EntryWindow,
    offset: FixedOffset,
}

impl PeriodClock {
    pub fn new(window: EntryWindow) -> Self {
        Self {
            window,
            offset: Utc.fix(),
        }
    }

    /// Read calendar days at a fixed offset from UTC.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> GovernanceResult<Self> {
        self.offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                GovernanceError::InvalidPeriod(format!(
                    "UTC offset of {} minutes is out of range",
                    minutes
                ))
            })?;
        Ok(self)
    }

    pub fn window(&self) -> EntryWindow {
        self.window
    }

    pub fn current_period(&self, now: DateTime<Utc>) -> Period {
        Period::containing(&now.with_timezone(&self.offset))
    }

    pub fn day_of_month(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.offset).day()
    }

    pub fn is_within_entry_window(&self, now: DateTime<Utc>) -> bool {
        self.window.contains_day(self.day_of_month(now))
    }

    /// `Ok` inside the window, `WindowClosed` outside it.
    pub fn check_window(&self, now: DateTime<Utc>) -> GovernanceResult<()> {
        let day = self.day_of_month(now);
        if self.window.contains_day(day) {
            Ok(())
        } else {
            Err(GovernanceError::WindowClosed {
                day,
                start_day: self.window.start_day,
                end_day: self.window.end_day,
            })
        }
    }
}

impl Default for PeriodClock {
    fn default() -> Self {
        Self::new(EntryWindow::default())
    }
}

// ── Time sources ─────────────────────────────────────────────────────

/// Source of "now" for request handlers
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        let mut guard = self.now.write().unwrap_or_else(|e| e.into_inner());
        *guard = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}
