//! Core library for the kanban board and timesheet service
//!
//! This crate contains the business logic, including:
//! - Projects, board columns (statuses) and tasks
//! - Dense `order_index` maintenance for drag-and-drop reordering
//! - Access control and public share tokens
//! - Daily task entries and the timesheet tracker

pub mod access;
pub mod daily;
pub mod db;
pub mod error;
pub mod ordering;
pub mod project;
pub mod share;
pub mod status;
pub mod task;
pub mod timesheet;
pub mod user;
mod validate;

pub use access::Actor;
pub use db::Database;
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
