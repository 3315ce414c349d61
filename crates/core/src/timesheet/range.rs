//! Report date ranges

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Predefined report periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFilter {
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    Custom,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self::ThisWeek
    }
}

impl ReportFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThisWeek => "this_week",
            Self::LastWeek => "last_week",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for ReportFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "this_week" => Ok(Self::ThisWeek),
            "last_week" => Ok(Self::LastWeek),
            "this_month" => Ok(Self::ThisMonth),
            "last_month" => Ok(Self::LastMonth),
            "custom" => Ok(Self::Custom),
            _ => Err(Error::InvalidInput(format!("Unknown filter '{}'", value))),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn week_of(day: NaiveDate) -> DateRange {
    let start = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    DateRange {
        start,
        end: start + Duration::days(6),
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

fn month_of(day: NaiveDate) -> DateRange {
    let start = first_of_month(day);
    let next_month = first_of_month(start + Duration::days(32));
    DateRange {
        start,
        end: next_month - Duration::days(1),
    }
}

/// Resolve the range a report covers
///
/// Weeks run Monday to Sunday. `Custom` needs both dates; without them the
/// report falls back to the current week. The returned filter is the one
/// actually applied.
pub fn resolve_range(
    filter: ReportFilter,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(ReportFilter, DateRange)> {
    let range = match filter {
        ReportFilter::Custom => match (custom_start, custom_end) {
            (Some(start), Some(end)) if start > end => {
                return Err(Error::InvalidInput(
                    "Start date must not be after end date".to_string(),
                ))
            }
            (Some(start), Some(end)) => DateRange { start, end },
            _ => return Ok((ReportFilter::ThisWeek, week_of(today))),
        },
        ReportFilter::ThisWeek => week_of(today),
        ReportFilter::LastWeek => week_of(today - Duration::days(7)),
        ReportFilter::ThisMonth => month_of(today),
        ReportFilter::LastMonth => month_of(first_of_month(today) - Duration::days(1)),
    };
    Ok((filter, range))
}
