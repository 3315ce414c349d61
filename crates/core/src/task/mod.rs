//! Task module
//!
//! Tasks are the cards of a board. Each one sits in exactly one status of its
//! project at a dense position.

mod model;
mod store;

pub use model::*;
pub use store::TaskStore;
pub(crate) use store::{list_task_ids, list_task_views, load_task, sync_completion, write_task_order};
