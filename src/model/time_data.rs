use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AxisError, AxisResult};

use super::range::TimePointIndex;

/// Unix timestamp in whole seconds.
pub type UtcTimestamp = i64;

/// A calendar day without an intraday component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl BusinessDay {
    /// Converts the calendar day to the timestamp of its UTC midnight.
    ///
    /// Rejects dates the calendar does not contain (month 13, Feb 30, ...).
    pub fn to_timestamp(self) -> AxisResult<UtcTimestamp> {
        match Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0) {
            chrono::LocalResult::Single(datetime) => Ok(datetime.timestamp()),
            _ => Err(AxisError::InvalidFormat(format!(
                "invalid business day: {:04}-{:02}-{:02}",
                self.year, self.month, self.day
            ))),
        }
    }
}

/// Row time as supplied by the caller, before conversion to the shared axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeriesTime {
    Timestamp(UtcTimestamp),
    BusinessDay(BusinessDay),
}

/// A point on the shared time axis. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: UtcTimestamp,
    pub business_day: Option<BusinessDay>,
}

impl TimePoint {
    #[must_use]
    pub fn from_timestamp(timestamp: UtcTimestamp) -> Self {
        Self {
            timestamp,
            business_day: None,
        }
    }

    pub fn from_business_day(day: BusinessDay) -> AxisResult<Self> {
        Ok(Self {
            timestamp: day.to_timestamp()?,
            business_day: Some(day),
        })
    }

    pub(crate) fn from_series_time(time: SeriesTime) -> AxisResult<Self> {
        match time {
            SeriesTime::Timestamp(timestamp) => Ok(Self::from_timestamp(timestamp)),
            SeriesTime::BusinessDay(day) => Self::from_business_day(day),
        }
    }

    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.timestamp, 0).unwrap_or_default()
    }
}

/// Calendar significance of an axis point relative to its predecessor.
///
/// The numeric ranks leave room between tiers so intermediate levels can be
/// compared without remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TickMarkWeight {
    LessThanSecond = 0,
    Second = 10,
    Minute1 = 20,
    Minute5 = 21,
    Minute30 = 22,
    Hour1 = 30,
    Hour3 = 31,
    Hour6 = 32,
    Hour12 = 33,
    Day = 50,
    Month = 60,
    Year = 70,
}

/// Ranks a point by comparing its UTC calendar fields to its predecessor's.
#[must_use]
pub fn weight_by_time(current: TimePoint, prev: TimePoint) -> TickMarkWeight {
    let current = current.to_datetime();
    let prev = prev.to_datetime();

    if current.year() != prev.year() {
        return TickMarkWeight::Year;
    }
    if current.month() != prev.month() {
        return TickMarkWeight::Month;
    }
    if current.day() != prev.day() {
        return TickMarkWeight::Day;
    }
    if current.hour() != prev.hour() {
        let hours = current.hour();
        if hours % 12 == 0 {
            return TickMarkWeight::Hour12;
        }
        if hours % 6 == 0 {
            return TickMarkWeight::Hour6;
        }
        if hours % 3 == 0 {
            return TickMarkWeight::Hour3;
        }
        return TickMarkWeight::Hour1;
    }
    if current.minute() != prev.minute() {
        let minutes = current.minute();
        if minutes % 30 == 0 {
            return TickMarkWeight::Minute30;
        }
        if minutes % 5 == 0 {
            return TickMarkWeight::Minute5;
        }
        return TickMarkWeight::Minute1;
    }
    if current.second() != prev.second() {
        return TickMarkWeight::Second;
    }
    TickMarkWeight::LessThanSecond
}

/// Denormalized shared-axis point handed to the time scale.
///
/// Carries copies of the fields the scale needs, never a reference into the
/// data layer's slot arena; the point's logical index is its position in the
/// containing sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScalePoint {
    pub time: TimePoint,
    pub weight: TickMarkWeight,
}

/// Packed RGBA color override attached to individual plot rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

/// Named accessors into a plot row's value quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotRowValueIndex {
    Open = 0,
    High = 1,
    Low = 2,
    Close = 3,
}

/// One series row bound to a shared-axis slot.
///
/// Single-value series repeat their value across all four slots so ranged
/// min/max queries need no per-series-kind branching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRow {
    pub index: TimePointIndex,
    pub time: TimePoint,
    pub value: [f64; 4],
    pub color: Option<Color>,
}

impl PlotRow {
    #[must_use]
    pub fn value(&self, plot: PlotRowValueIndex) -> f64 {
        self.value[plot as usize]
    }
}
