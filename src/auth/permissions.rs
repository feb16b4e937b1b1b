//! Capability checks evaluated before mutating a resource.
//!
//! A check list is an ordered slice of predicates; evaluation stops at the
//! first denial.

use uuid::Uuid;

use super::middleware::AuthUser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    Unauthenticated,
    Forbidden(&'static str),
}

/// The resource a caller wants to act on
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub owner: Uuid,
}

impl Resource {
    pub fn owned_by(owner: Uuid) -> Self {
        Self { owner }
    }
}

pub type Check = fn(Option<&AuthUser>, &Resource) -> Result<(), Denied>;

pub fn is_authenticated(user: Option<&AuthUser>, _resource: &Resource) -> Result<(), Denied> {
    user.map(|_| ()).ok_or(Denied::Unauthenticated)
}

pub fn is_owner_or_admin(user: Option<&AuthUser>, resource: &Resource) -> Result<(), Denied> {
    match user {
        Some(user) if user.user_id == resource.owner || user.is_admin() => Ok(()),
        Some(_) => Err(Denied::Forbidden("Only the author can modify this resource")),
        None => Err(Denied::Unauthenticated),
    }
}

pub const AUTHOR_ONLY: &[Check] = &[is_authenticated, is_owner_or_admin];

pub fn authorize(
    user: Option<&AuthUser>,
    resource: &Resource,
    checks: &[Check],
) -> Result<(), Denied> {
    checks.iter().try_for_each(|check| check(user, resource))
}
