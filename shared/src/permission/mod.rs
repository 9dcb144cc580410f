//! Permission model
//!
//! Fixed module × action matrix per role, with per-user overrides:
//! - [`PermissionMatrix`] - role default table (static config, loadable from JSON)
//! - [`PermissionEvaluator`] - user-level checks, fail closed
//! - [`CapabilitySet`] - materialized view of what one user may do

mod action;
mod capability;
pub mod defaults;
mod evaluator;
mod matrix;
mod module;

pub use action::PermissionAction;
pub use capability::CapabilitySet;
pub use evaluator::PermissionEvaluator;
pub use matrix::{MatrixError, PermissionMatrix, PermissionsMap};
pub use module::Module;
