use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Time anchor of a data point or marker.
///
/// The serialized form accepts either a UNIX-seconds integer or an ISO
/// `YYYY-MM-DD` business-day string; a business day compares as UTC midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimePoint {
    UnixSeconds(i64),
    BusinessDay(NaiveDate),
}

impl TimePoint {
    /// Builds a business-day time point, rejecting impossible calendar dates.
    pub fn business_day(year: i32, month: u32, day: u32) -> ChartResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::BusinessDay)
            .ok_or_else(|| {
                ChartError::InvalidData(format!("invalid business day {year}-{month:02}-{day:02}"))
            })
    }

    /// Position of the time point on the UNIX-seconds axis.
    #[must_use]
    pub fn epoch_seconds(self) -> i64 {
        match self {
            Self::UnixSeconds(seconds) => seconds,
            Self::BusinessDay(day) => day
                .and_hms_opt(0, 0, 0)
                .map_or(0, |midnight| midnight.and_utc().timestamp()),
        }
    }
}

impl PartialEq for TimePoint {
    fn eq(&self, other: &Self) -> bool {
        self.epoch_seconds() == other.epoch_seconds()
    }
}

impl Eq for TimePoint {}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch_seconds().cmp(&other.epoch_seconds())
    }
}

impl Hash for TimePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.epoch_seconds().hash(state);
    }
}

impl From<i64> for TimePoint {
    fn from(seconds: i64) -> Self {
        Self::UnixSeconds(seconds)
    }
}
