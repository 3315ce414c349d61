//! Daily entry model definitions

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Work logged against a task for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub description: String,
    pub end_of_day_report: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Times are `HH:MM` or `HH:MM:SS`; an empty string means "no time"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDailyEntryRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub end_of_day_report: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Partial update; an empty time string clears that time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyEntryRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub end_of_day_report: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl UpdateDailyEntryRequest {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.end_of_day_report.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

/// Parse a time-of-day field
pub fn parse_time_of_day(value: &str) -> Result<Option<NaiveTime>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| Error::InvalidInput(format!("Invalid time '{}', expected HH:MM", value)))
}

pub(crate) fn ensure_time_order(start: Option<NaiveTime>, end: Option<NaiveTime>) -> Result<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(Error::InvalidInput(
            "End time cannot be before start time".to_string(),
        )),
        _ => Ok(()),
    }
}
