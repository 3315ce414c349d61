//! Timesheet tracker
//!
//! Users log hours per day. A public report exposes entries within a date
//! range without any user or financial data, plus a roll-up per contributor.

mod model;
mod range;
mod store;

pub use model::*;
pub use range::{resolve_range, DateRange, ReportFilter};
pub use store::TimesheetStore;
