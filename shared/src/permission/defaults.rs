//! Default Permissions
//!
//! Role default matrix. Every role lists every [`Module`], possibly with
//! an empty action set, so that lookups never depend on a missing entry.
//!
//! ## 设计原则
//! - 关键模块 (permissions/backups/accounting/settings) 仅 director 可用
//! - employee 负责日常运营：预订、订单、桌台、外卖、消息回复
//! - 删除操作仅 director

use super::action::PermissionAction::{self, Create, Delete, Edit, Respond, Use, View};
use super::module::Module;

type RoleTable = &'static [(Module, &'static [PermissionAction])];

const CRUD: &[PermissionAction] = &[View, Create, Edit, Delete];

/// Director: full back-office
pub const DIRECTOR_PERMISSIONS: RoleTable = &[
    (Module::Reservations, &[View, Create, Edit, Delete, Respond]),
    (Module::Orders, CRUD),
    (Module::Menu, CRUD),
    (Module::Inventory, CRUD),
    (Module::Employees, CRUD),
    (Module::Customers, CRUD),
    (Module::Analytics, &[View]),
    (Module::Messages, &[View, Respond, Delete]),
    (Module::Settings, &[View, Edit]),
    (Module::Permissions, &[View, Edit]),
    (Module::Reports, &[View, Create]),
    (Module::Backups, &[View, Create, Delete]),
    (Module::Accounting, CRUD),
    (Module::Loyalty, &[View, Create, Edit, Delete, Use]),
    (Module::Events, CRUD),
    (Module::Promotions, &[View, Create, Edit, Delete, Use]),
    (Module::Delivery, CRUD),
    (Module::OnlineOrders, CRUD),
    (Module::Tables, CRUD),
    (Module::UserProfile, &[View, Edit]),
    (Module::ImageManagement, CRUD),
];

/// Employee: floor and front-desk operations
pub const EMPLOYEE_PERMISSIONS: RoleTable = &[
    (Module::Reservations, &[View, Create, Edit, Respond]),
    (Module::Orders, &[View, Create, Edit]),
    (Module::Menu, &[View]),
    (Module::Inventory, &[View, Edit]),
    (Module::Employees, &[]),
    (Module::Customers, &[View, Create, Edit]),
    (Module::Analytics, &[]),
    (Module::Messages, &[View, Respond]),
    (Module::Settings, &[]),
    (Module::Permissions, &[]),
    (Module::Reports, &[]),
    (Module::Backups, &[]),
    (Module::Accounting, &[]),
    (Module::Loyalty, &[View, Use]),
    (Module::Events, &[View]),
    (Module::Promotions, &[View, Use]),
    (Module::Delivery, &[View, Edit]),
    (Module::OnlineOrders, &[View, Edit]),
    (Module::Tables, &[View, Edit]),
    (Module::UserProfile, &[View, Edit]),
    (Module::ImageManagement, &[View]),
];
