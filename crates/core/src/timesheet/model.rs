//! Timesheet model definitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::range::{DateRange, ReportFilter};
use crate::{Error, Result};

/// Most hours a single entry may carry
pub const MAX_HOURS_PER_ENTRY: f64 = 24.0;

/// Hours a user logged for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    /// Free-text project label, not linked to board projects
    pub project: String,
    pub tasks: String,
    pub notes: String,
    pub hours: f64,
    pub billable_rate: f64,
    pub billable_amount: f64,
    pub timer_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create an entry, or update it when `id` names one of the caller's entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEntryRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub tasks: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub hours: f64,
    #[serde(default)]
    pub billable_rate: Option<f64>,
    #[serde(default)]
    pub timer_seconds: Option<i64>,
}

impl SaveEntryRequest {
    pub(crate) fn validate(&self) -> Result<()> {
        if !self.hours.is_finite() || self.hours < 0.0 {
            return Err(Error::InvalidInput("Hours must be zero or more".to_string()));
        }
        if self.hours > MAX_HOURS_PER_ENTRY {
            return Err(Error::InvalidInput(format!(
                "Hours cannot exceed {} per entry",
                MAX_HOURS_PER_ENTRY
            )));
        }
        if self
            .billable_rate
            .is_some_and(|rate| !rate.is_finite() || rate < 0.0)
        {
            return Err(Error::InvalidInput(
                "Billable rate must be zero or more".to_string(),
            ));
        }
        if !billable_amount(self.hours, self.billable_rate.unwrap_or_default()).is_finite() {
            return Err(Error::InvalidInput("Billable amount is out of range".to_string()));
        }
        if self.timer_seconds.is_some_and(|seconds| seconds < 0) {
            return Err(Error::InvalidInput(
                "Timer seconds must be zero or more".to_string(),
            ));
        }
        Ok(())
    }
}

/// Amount billed for `hours` at `rate`, rounded to cents
pub fn billable_amount(hours: f64, rate: f64) -> f64 {
    (hours * rate * 100.0).round() / 100.0
}

/// Optional inclusive bounds on the caller's own entries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Entry as shown in the public report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicEntry {
    pub entry_date: NaiveDate,
    pub project: String,
    pub tasks: String,
    pub notes: String,
    pub hours: f64,
}

/// All-time activity of one user in the public report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub last_activity: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub total_entries: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicReport {
    pub entries: Vec<PublicEntry>,
    pub contributors: Vec<Contributor>,
    pub filter: ReportFilter,
    pub date_range: DateRange,
}
