//! Reporting periods

use crate::{GovernanceError, GovernanceResult};
use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

/// A calendar month used as the reporting period.
///
/// Construction validates the month, so every `Period` in circulation
/// satisfies `1 <= month <= 12`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    // Field order gives chronological ordering.
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct RawPeriod {
    month: u32,
    year: i32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = GovernanceError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    pub fn new(month: u32, year: i32) -> GovernanceResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(GovernanceError::InvalidPeriod(format!(
                "month {} is outside 1..=12",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing `at`, read in `at`'s own timezone.
    pub fn containing<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Quarter-closing months: March, June, September, December.
    pub fn closes_quarter(&self) -> bool {
        self.month % 3 == 0
    }

    /// Semester-closing months: June and December.
    pub fn closes_semester(&self) -> bool {
        self.month % 6 == 0
    }

    pub fn closes_year(&self) -> bool {
        self.month == 12
    }

    /// The twelve periods of a calendar year, January first.
    pub fn months_of(year: i32) -> impl Iterator<Item = Period> {
        (1..=12).map(move |month| Period { year, month })
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
