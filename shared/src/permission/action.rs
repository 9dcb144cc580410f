use serde::{Deserialize, Serialize};
use std::fmt;

/// Action a user may perform on a module
///
/// Closed set; ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    View,
    Create,
    Edit,
    Delete,
    Respond,
    Use,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 6] = [
        PermissionAction::View,
        PermissionAction::Create,
        PermissionAction::Edit,
        PermissionAction::Delete,
        PermissionAction::Respond,
        PermissionAction::Use,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::View => "view",
            PermissionAction::Create => "create",
            PermissionAction::Edit => "edit",
            PermissionAction::Delete => "delete",
            PermissionAction::Respond => "respond",
            PermissionAction::Use => "use",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == key)
    }

    /// Anything but `view` changes server state
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, PermissionAction::View)
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
