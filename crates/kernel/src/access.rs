//! Access checks for navigation destinations.

use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::menu::Destination;

/// Who may navigate to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "roles", rename_all = "snake_case")]
pub enum Access {
    /// Everyone, signed in or not.
    Anonymous,
    /// Any signed-in principal.
    Authenticated,
    /// Signed-in principals holding at least one of the listed roles.
    Roles(Vec<String>),
    /// Nobody.
    Denied,
}

impl Access {
    /// Rule requiring any of `roles`.
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Access::Roles(roles.into_iter().map(Into::into).collect())
    }

    /// Evaluate the rule for `principal`.
    pub fn permits(&self, principal: Option<&dyn Principal>) -> bool {
        match (self, principal) {
            (Access::Anonymous, _) => true,
            (Access::Authenticated, Some(_)) => true,
            (Access::Roles(roles), Some(p)) => roles.iter().any(|r| p.has_role(r)),
            _ => false,
        }
    }
}

/// Decides whether a principal may navigate to a destination.
///
/// Implementations must be total: a denial is `false`, never an error.
pub trait AccessChecker: Send + Sync {
    fn has_access(&self, principal: Option<&dyn Principal>, destination: &Destination) -> bool;
}

impl<F> AccessChecker for F
where
    F: Fn(Option<&dyn Principal>, &Destination) -> bool + Send + Sync,
{
    fn has_access(&self, principal: Option<&dyn Principal>, destination: &Destination) -> bool {
        self(principal, destination)
    }
}

/// Checker that evaluates each destination's declared [`Access`] rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAccessChecker;

impl AccessChecker for RoleAccessChecker {
    fn has_access(&self, principal: Option<&dyn Principal>, destination: &Destination) -> bool {
        destination.access.permits(principal)
    }
}
