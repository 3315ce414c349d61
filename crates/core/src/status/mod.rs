//! Board columns
//!
//! Statuses are the columns of a project's board. Their `order_index` is
//! dense within the project; exactly one of them is normally the default
//! column and any of them may be flagged as a done column.

mod model;
mod store;

pub use model::*;
pub use store::StatusStore;
pub(crate) use store::{insert_status, list_statuses, load_status, NewStatus};
