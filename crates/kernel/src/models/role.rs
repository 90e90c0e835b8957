//! Well-known roles.
//!
//! Roles are stored on the user row as plain upper-case names so that
//! deployments can introduce extra roles without a schema change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles the standard destinations are declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular signed-in user.
    User,
    /// Administrator with access to patient records and statistics.
    Admin,
}

impl Role {
    /// Stored name of this role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(anyhow::anyhow!("unknown role '{other}'")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn stored_name() {
        assert_eq!(Role::Admin.to_string(), "ADMIN");
        assert_eq!(Role::User.as_str(), "USER");
    }
}
