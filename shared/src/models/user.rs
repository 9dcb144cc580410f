//! User Model

use serde::{Deserialize, Deserializer, Serialize};

use super::role::Role;

/// Per-user exception to the role default matrix
///
/// `module` and `action` stay as wire strings: an override naming an
/// unknown module or action is ignored by the evaluator, never applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverride {
    pub module: String,
    pub action: String,
    /// `true` grants, `false` revokes
    pub granted: bool,
}

impl PermissionOverride {
    pub fn grant(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
            granted: true,
        }
    }

    pub fn revoke(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
            granted: false,
        }
    }
}

/// Authenticated staff member as returned by `/api/auth/login` and `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role name as sent by the server; see [`User::role`]
    pub role: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<PermissionOverride>,
}

impl User {
    /// Parsed role, `None` for unknown role names
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    /// Login identity (email when present, else username)
    pub fn identity(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.username)
    }
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
