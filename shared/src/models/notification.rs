//! Notification counts served by `/api/admin/notifications/count`

use serde::{Deserialize, Deserializer, Serialize};

/// Pending work counters shown on the admin dashboard
///
/// Always replaced wholesale from a server recount, never patched.
/// Negative or fractional values from the wire are clamped to `0..=u32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationCounts {
    #[serde(default, alias = "pending_reservations", deserialize_with = "non_negative")]
    pub pending_reservations: u32,
    #[serde(default, alias = "pending_orders", deserialize_with = "non_negative")]
    pub pending_orders: u32,
    #[serde(default, alias = "new_messages", deserialize_with = "non_negative")]
    pub new_messages: u32,
    #[serde(default, alias = "low_stock_items", deserialize_with = "non_negative")]
    pub low_stock_items: u32,
    #[serde(default, alias = "maintenance_alerts", deserialize_with = "non_negative")]
    pub maintenance_alerts: u32,
    #[serde(default, alias = "system_alerts", deserialize_with = "non_negative")]
    pub system_alerts: u32,
}

impl NotificationCounts {
    pub fn total(&self) -> u64 {
        [
            self.pending_reservations,
            self.pending_orders,
            self.new_messages,
            self.low_stock_items,
            self.maintenance_alerts,
            self.system_alerts,
        ]
        .iter()
        .map(|&n| u64::from(n))
        .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

fn non_negative<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw <= 0.0 {
        return Ok(0);
    }
    Ok(raw.min(f64::from(u32::MAX)) as u32)
}
