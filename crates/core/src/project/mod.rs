//! Project module
//!
//! A Project is a kanban board owned by one user. Statuses (columns) and
//! tasks belong to Projects.

mod model;
mod store;

pub use model::*;
pub use store::*;
