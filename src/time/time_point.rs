use chrono::{Datelike, LocalResult, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

use super::tick_weight::TickMarkWeight;

/// Unix timestamp in whole seconds, UTC.
pub type UtcTimestamp = i64;

/// Dense position of a point on the shared time scale.
pub type TimePointIndex = i64;

/// Calendar day exactly as the user supplied it; `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BusinessDay {
    #[must_use]
    pub const fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Midnight UTC of this calendar day as a unix timestamp.
    pub fn to_timestamp(self) -> ChartResult<UtcTimestamp> {
        match Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0) {
            LocalResult::Single(moment) => Ok(moment.timestamp()),
            _ => Err(ChartError::InvalidTime(format!(
                "invalid calendar day {:04}-{:02}-{:02}",
                self.year, self.month, self.day
            ))),
        }
    }
}

/// Heterogeneous input time accepted at the data boundary.
///
/// The untagged representation lets JSON datasets carry `1577836800`,
/// `{"year":2020,"month":1,"day":1}`, or `"2020-01-01"` interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserTime {
    Timestamp(UtcTimestamp),
    BusinessDay(BusinessDay),
    DateString(String),
}

/// Canonical time shared by every row at a given instant.
///
/// Business-day inputs preserve their calendar components; timestamp
/// inputs do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: UtcTimestamp,
    pub business_day: Option<BusinessDay>,
}

/// One entry of the globally sorted, densely indexed time sequence, in the
/// snapshot form handed to time-scale consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeScalePoint {
    pub time_weight: TickMarkWeight,
    pub time: TimePoint,
    pub original_time: UserTime,
}

/// Parses the `YYYY-MM-DD` input form.
///
/// With the `strict-time-format` feature the exact shape is enforced before
/// calendar validation; without it surrounding whitespace and unpadded
/// components are tolerated. Calendar-invalid dates fail either way.
pub fn parse_date_string(raw: &str) -> ChartResult<BusinessDay> {
    #[cfg(feature = "strict-time-format")]
    let text = {
        if !is_strict_date_shape(raw) {
            return Err(ChartError::InvalidTime(format!(
                "date string must match YYYY-MM-DD, got {raw:?}"
            )));
        }
        raw
    };
    #[cfg(not(feature = "strict-time-format"))]
    let text = raw.trim();

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|err| {
        ChartError::InvalidTime(format!("cannot parse {raw:?} as YYYY-MM-DD: {err}"))
    })?;
    Ok(BusinessDay::new(date.year(), date.month(), date.day()))
}

#[cfg(feature = "strict-time-format")]
fn is_strict_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && [0usize, 1, 2, 3, 5, 6, 8, 9]
            .iter()
            .all(|&position| bytes[position].is_ascii_digit())
}

/// The string pre-pass: rewrites the `YYYY-MM-DD` form to a business day.
/// The other variants pass through untouched.
pub fn string_to_business_day(time: UserTime) -> ChartResult<UserTime> {
    match time {
        UserTime::DateString(raw) => Ok(UserTime::BusinessDay(parse_date_string(&raw)?)),
        other => Ok(other),
    }
}

/// Converts input time into the canonical form; one converter serves a
/// whole dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeConverter {
    /// Raw epoch-seconds input; no calendar components are kept.
    Timestamp,
    /// Business-day input; calendar components are preserved.
    BusinessDay,
}

impl TimeConverter {
    /// Picks the converter for a dataset from its first time value.
    ///
    /// Strings are rewritten to business days before selection runs, so a
    /// leftover string still selects the business-day converter.
    #[must_use]
    pub fn select(first: &UserTime) -> Self {
        match first {
            UserTime::Timestamp(_) => Self::Timestamp,
            UserTime::BusinessDay(_) | UserTime::DateString(_) => Self::BusinessDay,
        }
    }

    pub fn convert(self, time: &UserTime) -> ChartResult<TimePoint> {
        match (self, time) {
            (Self::Timestamp, UserTime::Timestamp(timestamp)) => Ok(TimePoint {
                timestamp: *timestamp,
                business_day: None,
            }),
            (Self::BusinessDay, UserTime::BusinessDay(day)) => Ok(TimePoint {
                timestamp: day.to_timestamp()?,
                business_day: Some(*day),
            }),
            (Self::Timestamp, _) => Err(ChartError::WrongTimeType {
                expected: "unix timestamp",
            }),
            (Self::BusinessDay, _) => Err(ChartError::WrongTimeType {
                expected: "business day",
            }),
        }
    }
}
