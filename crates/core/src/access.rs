//! Access control
//!
//! Permissions are plain predicates over the project and the acting user.
//! The acting user is always passed in explicitly; `None` means the request
//! carried no valid credentials.

use uuid::Uuid;

use crate::project::Project;
use crate::user::{User, UserRole};
use crate::{Error, Result};

/// The authenticated user performing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

/// Resolve an optional actor, failing when the request is anonymous
pub fn require_actor(actor: Option<&Actor>) -> Result<&Actor> {
    actor.ok_or(Error::Unauthenticated)
}

/// Every authenticated user can read every non-archived project.
/// Archived projects stay visible to the people who can manage them.
pub fn can_view(project: &Project, actor: Option<&Actor>) -> bool {
    match actor {
        Some(actor) => !project.archived || can_manage(project, Some(actor)),
        None => false,
    }
}

/// Owners and administrators manage a project
pub fn can_manage(project: &Project, actor: Option<&Actor>) -> bool {
    actor.is_some_and(|actor| actor.is_admin() || project.owner_id == actor.user_id)
}

pub fn can_create_project(actor: Option<&Actor>) -> bool {
    actor.is_some_and(Actor::is_admin)
}

pub(crate) fn ensure_view(project: &Project, actor: &Actor) -> Result<()> {
    if can_view(project, Some(actor)) {
        Ok(())
    } else {
        Err(Error::access_denied())
    }
}

pub(crate) fn ensure_manage(project: &Project, actor: &Actor, denied: &str) -> Result<()> {
    if can_manage(project, Some(actor)) {
        Ok(())
    } else {
        Err(Error::Forbidden(denied.to_string()))
    }
}
