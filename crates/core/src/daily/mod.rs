//! Daily entries: per-day work notes logged against a task

mod model;
mod store;

pub use model::*;
pub use store::DailyEntryStore;
