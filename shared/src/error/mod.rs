//! Unified error codes for Mesa
//!
//! - [`ErrorCode`]: standardized error codes shared by the edge server and clients
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 9xxx: System errors

mod codes;
mod http;

pub use codes::{ErrorCode, InvalidErrorCode};
