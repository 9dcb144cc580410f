//! Shared types for Mesa
//!
//! Common types used by both the admin client and the edge server:
//! auth DTOs, the role/permission model, notification counts,
//! the realtime message envelope and the unified error codes.

pub mod client;
pub mod error;
pub mod message;
pub mod models;
pub mod permission;
pub mod response;

// Re-exports
pub use error::{ErrorCode, InvalidErrorCode};
pub use message::{EventKind, RealtimeEvent};
pub use models::{NotificationCounts, PermissionOverride, Role, User};
pub use permission::{
    CapabilitySet, MatrixError, Module, PermissionAction, PermissionEvaluator, PermissionMatrix,
};
pub use response::ApiResponse;
