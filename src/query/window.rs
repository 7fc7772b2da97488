//! Same-day time windows around a reference time
//!
//! A window never crosses midnight: a lower bound that would wrap into the
//! previous day clamps to 00:00 and an upper bound that would wrap into the
//! next day clamps to 23:59.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::model::{EntityKey, Kind};
use crate::store::{Comparator, Direction, StoreQuery};

use super::ast::Scalar;
use super::errors::{QueryError, QueryResult};

/// Start of day lower clamp
pub const START_OF_DAY: NaiveTime = NaiveTime::MIN;

/// End of day upper clamp
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Inclusive `[before, after]` interval on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub date: NaiveDate,
    pub center: NaiveTime,
    pub before: NaiveTime,
    pub after: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.before <= time && time <= self.after
    }

    /// Sessions of `conference` on the window's date starting inside it,
    /// ordered by start time.
    pub fn session_query(&self, conference: &EntityKey) -> StoreQuery {
        StoreQuery::by_ancestor(Kind::Session, conference.clone())
            .filter("date", Comparator::Eq, Scalar::Date(self.date).to_value())
            .filter("startTime", Comparator::Gte, Scalar::Time(self.before).to_value())
            .filter("startTime", Comparator::Lte, Scalar::Time(self.after).to_value())
            .order_by("startTime", Direction::Asc)
            .order_by("name", Direction::Asc)
    }
}

/// Computes `center ± delta_minutes` clamped to `date`.
///
/// `delta_minutes` must be positive.
pub fn window_around(date: NaiveDate, center: NaiveTime, delta_minutes: i64) -> QueryResult<TimeWindow> {
    if delta_minutes <= 0 {
        return Err(QueryError::invalid_window(format!(
            "window must be a positive number of minutes, got {}",
            delta_minutes
        )));
    }
    let delta = Duration::try_minutes(delta_minutes)
        .ok_or_else(|| QueryError::invalid_window(format!("window of {} minutes is too large", delta_minutes)))?;

    // non-zero overflow seconds mean the result wrapped past midnight
    let (before, wrapped_back) = center.overflowing_sub_signed(delta);
    let (after, wrapped_forward) = center.overflowing_add_signed(delta);

    let before = if wrapped_back != 0 { START_OF_DAY } else { before };
    let after = if wrapped_forward != 0 { end_of_day() } else { after };

    if !(before <= center && center <= after) {
        return Err(QueryError::invalid_window(format!(
            "window {}..{} does not contain {}",
            before, after, center
        )));
    }

    Ok(TimeWindow {
        date,
        center,
        before,
        after,
    })
}

/// Parses a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> QueryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::invalid_window(format!("invalid date '{}' - must be in YYYY-MM-DD format", raw)))
}

/// Parses an `HHMM` start time
pub fn parse_start_time(raw: &str) -> QueryResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H%M")
        .map_err(|_| QueryError::invalid_window(format!("invalid startTime '{}' - must be in HHMM format", raw)))
}

/// Parses a window size in minutes
pub fn parse_window_minutes(raw: &str) -> QueryResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| QueryError::invalid_window(format!("invalid window value '{}'", raw)))
}
