use serde::{Deserialize, Serialize};
use std::fmt;

/// Functional area of the back-office subject to access control
///
/// Keys are stable snake_case strings shared with the server and the
/// permission matrix JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Reservations,
    Orders,
    Menu,
    Inventory,
    Employees,
    Customers,
    Analytics,
    Messages,
    Settings,
    Permissions,
    Reports,
    Backups,
    Accounting,
    Loyalty,
    Events,
    Promotions,
    Delivery,
    OnlineOrders,
    Tables,
    UserProfile,
    ImageManagement,
}

impl Module {
    pub const ALL: [Module; 21] = [
        Module::Reservations,
        Module::Orders,
        Module::Menu,
        Module::Inventory,
        Module::Employees,
        Module::Customers,
        Module::Analytics,
        Module::Messages,
        Module::Settings,
        Module::Permissions,
        Module::Reports,
        Module::Backups,
        Module::Accounting,
        Module::Loyalty,
        Module::Events,
        Module::Promotions,
        Module::Delivery,
        Module::OnlineOrders,
        Module::Tables,
        Module::UserProfile,
        Module::ImageManagement,
    ];

    /// Modules whose mutations must be re-verified by the server
    pub const CRITICAL: [Module; 4] = [
        Module::Permissions,
        Module::Backups,
        Module::Accounting,
        Module::Settings,
    ];

    pub const fn key(&self) -> &'static str {
        match self {
            Module::Reservations => "reservations",
            Module::Orders => "orders",
            Module::Menu => "menu",
            Module::Inventory => "inventory",
            Module::Employees => "employees",
            Module::Customers => "customers",
            Module::Analytics => "analytics",
            Module::Messages => "messages",
            Module::Settings => "settings",
            Module::Permissions => "permissions",
            Module::Reports => "reports",
            Module::Backups => "backups",
            Module::Accounting => "accounting",
            Module::Loyalty => "loyalty",
            Module::Events => "events",
            Module::Promotions => "promotions",
            Module::Delivery => "delivery",
            Module::OnlineOrders => "online_orders",
            Module::Tables => "tables",
            Module::UserProfile => "user_profile",
            Module::ImageManagement => "image_management",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }

    pub const fn is_critical(&self) -> bool {
        matches!(
            self,
            Module::Permissions | Module::Backups | Module::Accounting | Module::Settings
        )
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_roundtrip_through_parse() {
        for module in Module::ALL {
            assert_eq!(Module::parse(module.key()), Some(module));
        }
        assert_eq!(Module::parse("kitchen"), None);
    }

    #[test]
    fn test_serde_key_matches() {
        let json = serde_json::to_string(&Module::OnlineOrders).unwrap();
        assert_eq!(json, r#""online_orders""#);
    }

    #[test]
    fn test_critical_set() {
        for module in Module::CRITICAL {
            assert!(module.is_critical());
        }
        assert!(!Module::Orders.is_critical());
    }
}
