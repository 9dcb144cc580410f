//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role (RBAC 角色)
///
/// The set is closed. Legacy front-end spellings (`directeur`, `employe`)
/// are accepted on input and normalized on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "directeur")]
    Director,
    #[serde(alias = "employe", alias = "employé")]
    Employee,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Director, Role::Employee];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::Employee => "employee",
        }
    }

    /// Parse a wire role name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "director" | "directeur" => Some(Role::Director),
            "employee" | "employe" | "employé" => Some(Role::Employee),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for role names outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}
