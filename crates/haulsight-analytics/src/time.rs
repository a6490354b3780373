// ABOUTME: Time windows resolved from relative range expressions and trend period keys
// ABOUTME: Windows are half-open [start, end) in UTC and resolved against an explicit as-of instant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Range expressions understood by the tools:
//!
//! - `last_N_days`, `last_N_weeks`, `last_N_months`
//! - `previous_N_days|weeks|months`: the window just before the matching `last_` window
//! - `this_week|month|quarter|year`, `last_week|month|quarter|year`
//! - `ytd`, `today`, `yesterday`, `all_time`
//! - `YYYY-MM-DD..YYYY-MM-DD` (both dates inclusive)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use haulsight_core::constants::query::{
    DAILY_TREND_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS, MAX_LOOKBACK_MONTHS,
    MONTHLY_TREND_LOOKBACK_DAYS, WEEKLY_TREND_LOOKBACK_DAYS,
};
use serde::{Deserialize, Serialize};

/// Half-open time window; a missing bound is unbounded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// Expression or label the window came from
    pub label: String,
    /// Inclusive start
    pub start: Option<DateTime<Utc>>,
    /// Exclusive end
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Window with both bounds
    pub fn between(label: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Unbounded window
    #[must_use]
    pub fn all_time() -> Self {
        Self {
            label: "all_time".to_owned(),
            start: None,
            end: None,
        }
    }

    /// The `days` days ending at `as_of`
    #[must_use]
    pub fn trailing_days(days: i64, as_of: DateTime<Utc>) -> Self {
        Self::between(format!("last_{days}_days"), as_of - Duration::days(days), as_of)
    }

    /// Whether `ts` lies inside the window
    #[must_use]
    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| *ts >= start) && self.end.map_or(true, |end| *ts < end)
    }

    /// Whether two windows share any instant
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let starts_before_other_ends = match (self.start, other.end) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        };
        let other_starts_before_end = match (other.start, self.end) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        };
        starts_before_other_ends && other_starts_before_end
    }

    /// Clamp an open or overly long start to `max_days` before the end
    #[must_use]
    pub fn bounded(mut self, max_days: i64, as_of: DateTime<Utc>) -> Self {
        let end = self.end.unwrap_or(as_of);
        let floor = end - Duration::days(max_days);
        if self.start.map_or(true, |start| start < floor) {
            self.start = Some(floor);
        }
        self.end = Some(end);
        self
    }
}

/// Why a range expression was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError(pub String);

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s.trim_end_matches('s') {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "quarter" => Some(Self::Quarter),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Resolve a range expression against `as_of`
///
/// # Errors
///
/// Returns [`RangeError`] for unrecognized expressions, reversed explicit
/// ranges and relative lookbacks longer than the maximum.
pub fn resolve_range(expression: &str, as_of: DateTime<Utc>) -> Result<TimeWindow, RangeError> {
    let expr = expression.trim().to_lowercase().replace([' ', '-'], "_");
    let today = start_of_day(as_of.date_naive());

    if let Some((from, to)) = expression.trim().split_once("..") {
        return explicit_range(expression.trim(), from, to);
    }

    let window = match expr.as_str() {
        "all" | "all_time" => return Ok(TimeWindow::all_time()),
        "today" => TimeWindow::between(&expr, today, as_of),
        "yesterday" => TimeWindow::between(&expr, today - Duration::days(1), today),
        "ytd" | "year_to_date" => {
            TimeWindow::between(&expr, period_start(as_of, Unit::Year), as_of)
        }
        _ => relative_range(&expr, as_of)?,
    };

    if window.start.is_some_and(|start| start < lookback_floor(as_of)) {
        return Err(RangeError(format!(
            "'{expression}' reaches back more than {MAX_LOOKBACK_MONTHS} months"
        )));
    }
    Ok(window)
}

/// Earliest start a relative window may have
fn lookback_floor(as_of: DateTime<Utc>) -> DateTime<Utc> {
    let by_days = as_of - Duration::days(MAX_LOOKBACK_DAYS);
    as_of
        .checked_sub_months(Months::new(MAX_LOOKBACK_MONTHS))
        .map_or(by_days, |by_months| by_months.min(by_days))
}

fn relative_range(expr: &str, as_of: DateTime<Utc>) -> Result<TimeWindow, RangeError> {
    let unrecognized = || {
        RangeError(format!(
            "unrecognized time range '{expr}' (try last_30_days, previous_30_days, this_month, last_quarter, ytd, all_time or YYYY-MM-DD..YYYY-MM-DD)"
        ))
    };
    let parts: Vec<&str> = expr.split('_').collect();
    match parts.as_slice() {
        ["this", unit] => {
            let unit = Unit::parse(unit)
                .filter(|u| !matches!(u, Unit::Day))
                .ok_or_else(unrecognized)?;
            Ok(TimeWindow::between(expr, period_start(as_of, unit), as_of))
        }
        ["last", unit] => {
            let unit = Unit::parse(unit)
                .filter(|u| !matches!(u, Unit::Day))
                .ok_or_else(unrecognized)?;
            let current = period_start(as_of, unit);
            let previous = step_back(current, unit, 1).ok_or_else(unrecognized)?;
            Ok(TimeWindow::between(expr, previous, current))
        }
        [direction @ ("last" | "past" | "previous" | "prior"), count, unit] => {
            let count: u32 = count
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(unrecognized)?;
            let unit = Unit::parse(unit).ok_or_else(unrecognized)?;
            let end = if matches!(*direction, "previous" | "prior") {
                step_back(as_of, unit, count).ok_or_else(unrecognized)?
            } else {
                as_of
            };
            let start = step_back(end, unit, count).ok_or_else(unrecognized)?;
            Ok(TimeWindow::between(expr, start, end))
        }
        _ => Err(unrecognized()),
    }
}

fn explicit_range(expression: &str, from: &str, to: &str) -> Result<TimeWindow, RangeError> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| RangeError(format!("invalid date '{}' in '{expression}': {e}", s.trim())))
    };
    let from = parse(from)?;
    let to = parse(to)?;
    if to < from {
        return Err(RangeError(format!("'{expression}' ends before it starts")));
    }
    Ok(TimeWindow::between(
        expression,
        start_of_day(from),
        start_of_day(to) + Duration::days(1),
    ))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn period_start(as_of: DateTime<Utc>, unit: Unit) -> DateTime<Utc> {
    let date = as_of.date_naive();
    let start = match unit {
        Unit::Day => Some(date),
        Unit::Week => Some(week_start(date)),
        Unit::Month => date.with_day(1),
        Unit::Quarter => NaiveDate::from_ymd_opt(date.year(), ((date.month() - 1) / 3) * 3 + 1, 1),
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
    };
    start_of_day(start.unwrap_or(date))
}

fn step_back(from: DateTime<Utc>, unit: Unit, count: u32) -> Option<DateTime<Utc>> {
    match unit {
        Unit::Day => from.checked_sub_signed(Duration::days(i64::from(count))),
        Unit::Week => from.checked_sub_signed(Duration::weeks(i64::from(count))),
        Unit::Month => from.checked_sub_months(Months::new(count)),
        Unit::Quarter => from.checked_sub_months(Months::new(count.checked_mul(3)?)),
        Unit::Year => from.checked_sub_months(Months::new(count.checked_mul(12)?)),
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

// ============================================================================
// Trend Periods
// ============================================================================

/// Granularity of a time trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    /// Calendar day
    #[serde(alias = "daily")]
    Day,
    /// ISO week starting Monday
    #[serde(alias = "weekly")]
    Week,
    /// Calendar month
    #[serde(alias = "monthly")]
    Month,
}

impl TrendPeriod {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Lookback used when no range is given
    #[must_use]
    pub const fn default_lookback_days(self) -> i64 {
        match self {
            Self::Day => DAILY_TREND_LOOKBACK_DAYS,
            Self::Week => WEEKLY_TREND_LOOKBACK_DAYS,
            Self::Month => MONTHLY_TREND_LOOKBACK_DAYS,
        }
    }

    /// First day of the period containing `ts`; sorts chronologically
    #[must_use]
    pub fn period_start(self, ts: &DateTime<Utc>) -> NaiveDate {
        let date = ts.date_naive();
        match self {
            Self::Day => date,
            Self::Week => week_start(date),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Display key for a period start
    #[must_use]
    pub fn label(self, period_start: NaiveDate) -> String {
        match self {
            Self::Day | Self::Week => period_start.format("%Y-%m-%d").to_string(),
            Self::Month => period_start.format("%Y-%m").to_string(),
        }
    }
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendPeriod {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(RangeError(format!(
                "unknown period '{other}' (expected day, week or month)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2025, 5, 14, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_last_and_previous_windows_abut() {
        let last = resolve_range("last_7_days", as_of()).unwrap();
        let previous = resolve_range("previous_7_days", as_of()).unwrap();
        assert_eq!(previous.end, last.start);
        assert!(!last.overlaps(&previous));
    }

    #[test]
    fn test_calendar_windows() {
        let this_month = resolve_range("this_month", as_of()).unwrap();
        assert_eq!(this_month.start, Some(Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()));

        let last_quarter = resolve_range("last quarter", as_of()).unwrap();
        assert_eq!(last_quarter.start, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(last_quarter.end, Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()));

        let this_week = resolve_range("this_week", as_of()).unwrap();
        assert_eq!(this_week.start, Some(Utc.with_ymd_and_hms(2025, 5, 12, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_explicit_range_is_inclusive_of_end_date() {
        let window = resolve_range("2025-03-01..2025-03-31", as_of()).unwrap();
        let last_moment = Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap();
        assert!(window.contains(&last_moment));
        assert!(!window.contains(&Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()));
        assert!(resolve_range("2025-03-31..2025-03-01", as_of()).is_err());
    }

    #[test]
    fn test_rejects_unknown_and_excessive_ranges() {
        assert!(resolve_range("since forever", as_of()).is_err());
        assert!(resolve_range("last_0_days", as_of()).is_err());
        assert!(resolve_range("last_5_years", as_of()).is_err());
        assert!(resolve_range("all_time", as_of()).unwrap().start.is_none());
    }

    #[test]
    fn test_lookback_limit_counts_calendar_months() {
        // 2023-05-14..2025-05-14 spans 731 days because of 2024-02-29
        let previous_year = resolve_range("previous_12_months", as_of()).unwrap();
        assert_eq!(previous_year.start, as_of().checked_sub_months(Months::new(24)));
        assert_eq!(previous_year.end, as_of().checked_sub_months(Months::new(12)));
        assert!(resolve_range("last_24_months", as_of()).is_ok());
        assert!(resolve_range("last_2_years", as_of()).is_ok());

        assert!(resolve_range("last_25_months", as_of()).is_err());
        assert!(resolve_range("last_3_years", as_of()).is_err());
        assert!(resolve_range("last_50_year", as_of()).is_err());
        assert!(resolve_range("last_105_weeks", as_of()).is_err());
    }

    #[test]
    fn test_calendar_year_windows_stay_within_limit() {
        let new_years_eve = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();

        let last_year = resolve_range("last_year", new_years_eve).unwrap();
        assert_eq!(last_year.start, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert!(resolve_range("this_year", new_years_eve).is_ok());
        assert!(resolve_range("ytd", new_years_eve).is_ok());
    }

    #[test]
    fn test_trend_period_keys() {
        let ts = as_of();
        assert_eq!(TrendPeriod::Week.label(TrendPeriod::Week.period_start(&ts)), "2025-05-12");
        assert_eq!(TrendPeriod::Month.label(TrendPeriod::Month.period_start(&ts)), "2025-05");
        assert_eq!("weekly".parse::<TrendPeriod>().unwrap(), TrendPeriod::Week);
    }

    #[test]
    fn test_bounded_clamps_open_start() {
        let window = TimeWindow::all_time().bounded(30, as_of());
        assert_eq!(window.start, Some(as_of() - Duration::days(30)));
        assert_eq!(window.end, Some(as_of()));
    }
}
