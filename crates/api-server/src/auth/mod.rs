//! Bearer-token authentication

mod identity;
mod jwt;

pub use identity::resolve_user_identity;
pub use jwt::issue_user_jwt;
