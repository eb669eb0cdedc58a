use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Access level governing which categories and documents a caller can see.
///
/// The set is closed: values coming from the store that do not parse into
/// one of these variants are dropped at the boundary, never widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    Guest,
    Foreman,
    Engineer,
    Architect,
    Admin,
    Employee,
    Worker,
    Dispatcher,
    Hr,
}

impl Role {
    pub fn all() -> &'static [Role] {
        use Role::*;
        &[
            Guest, Foreman, Engineer, Architect, Admin, Employee, Worker,
            Dispatcher, Hr,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Foreman => "foreman",
            Role::Engineer => "engineer",
            Role::Architect => "architect",
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Worker => "worker",
            Role::Dispatcher => "dispatcher",
            Role::Hr => "hr",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownRole(s.to_string()))
    }
}
