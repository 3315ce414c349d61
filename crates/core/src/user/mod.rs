//! User accounts
//!
//! Users sign in with email and password. The first registered account is
//! the administrator; everyone else is a member.

mod model;
mod password;
mod store;

pub use model::*;
pub use store::UserStore;
