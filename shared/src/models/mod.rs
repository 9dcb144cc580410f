//! Data models shared between the edge server and clients

pub mod notification;
pub mod role;
pub mod user;

pub use notification::NotificationCounts;
pub use role::{Role, UnknownRole};
pub use user::{PermissionOverride, User};
