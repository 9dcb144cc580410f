use std::sync::Arc;

use super::action::PermissionAction;
use super::capability::CapabilitySet;
use super::matrix::PermissionMatrix;
use super::module::Module;
use crate::models::{Role, User};

/// Answers "can this user do X on module Y"
///
/// Resolution order for a user:
/// 1. unknown role → deny (overrides are not consulted)
/// 2. the last per-user override matching (module, action)
/// 3. the role default from the matrix (missing entry → deny)
///
/// Checks never fail; they return `false` on any doubt. On the client this is
/// advisory only, the edge server runs the same evaluator on every request.
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    matrix: Arc<PermissionMatrix>,
}

impl PermissionEvaluator {
    pub fn new(matrix: PermissionMatrix) -> Self {
        Self {
            matrix: Arc::new(matrix),
        }
    }

    pub fn from_shared(matrix: Arc<PermissionMatrix>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    /// Role default only, no overrides
    pub fn has_permission(&self, role: Role, module: Module, action: PermissionAction) -> bool {
        self.matrix.allows(role, module, action)
    }

    /// Full check for a user, overrides first
    pub fn user_has_permission(&self, user: &User, module: Module, action: PermissionAction) -> bool {
        let Some(role) = user.role() else {
            tracing::debug!(
                target: "permission",
                user_id = %user.id,
                role = %user.role,
                "Unknown role, denying"
            );
            return false;
        };

        if let Some(granted) = Self::override_for(user, module, action) {
            return granted;
        }

        self.matrix.allows(role, module, action)
    }

    /// Check with wire keys; unknown module or action keys deny
    pub fn check(&self, user: &User, module_key: &str, action_key: &str) -> bool {
        match (Module::parse(module_key), PermissionAction::parse(action_key)) {
            (Some(module), Some(action)) => self.user_has_permission(user, module, action),
            _ => {
                tracing::warn!(
                    target: "permission",
                    module = module_key,
                    action = action_key,
                    "Unknown module or action key, denying"
                );
                false
            }
        }
    }

    /// Everything the user may do, for menus and bulk checks
    pub fn capabilities(&self, user: &User) -> CapabilitySet {
        let mut set = CapabilitySet::default();
        if user.role().is_none() {
            return set;
        }
        for module in Module::ALL {
            for action in PermissionAction::ALL {
                if self.user_has_permission(user, module, action) {
                    set.insert(module, action);
                }
            }
        }
        set
    }

    fn override_for(user: &User, module: Module, action: PermissionAction) -> Option<bool> {
        user.overrides
            .iter()
            .rev()
            .find(|o| o.module == module.key() && o.action == action.as_str())
            .map(|o| o.granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PermissionOverride;

    fn user(role: &str, overrides: Vec<PermissionOverride>) -> User {
        User {
            id: "u-1".into(),
            username: "tester".into(),
            email: None,
            role: role.into(),
            overrides,
        }
    }

    #[test]
    fn test_matches_matrix_for_every_pair() {
        let evaluator = PermissionEvaluator::default();
        for role in Role::ALL {
            let u = user(role.as_str(), vec![]);
            for module in Module::ALL {
                for action in PermissionAction::ALL {
                    let expected = evaluator
                        .matrix()
                        .actions(role, module)
                        .is_some_and(|set| set.contains(&action));
                    assert_eq!(evaluator.user_has_permission(&u, module, action), expected);
                    // 无副作用：重复调用结果一致
                    assert_eq!(evaluator.user_has_permission(&u, module, action), expected);
                }
            }
        }
    }

    #[test]
    fn test_employee_delete_employees_scenario() {
        let evaluator = PermissionEvaluator::default();
        assert!(!evaluator.check(&user("employee", vec![]), "employees", "delete"));
        assert!(evaluator.check(&user("director", vec![]), "employees", "delete"));
    }

    #[test]
    fn test_override_elevates() {
        let evaluator = PermissionEvaluator::default();
        let u = user("employee", vec![PermissionOverride::grant("reports", "view")]);
        assert!(evaluator.user_has_permission(&u, Module::Reports, PermissionAction::View));
        assert!(!evaluator.has_permission(Role::Employee, Module::Reports, PermissionAction::View));
    }

    #[test]
    fn test_override_restricts() {
        let evaluator = PermissionEvaluator::default();
        let u = user("director", vec![PermissionOverride::revoke("accounting", "delete")]);
        assert!(!evaluator.user_has_permission(&u, Module::Accounting, PermissionAction::Delete));
        assert!(evaluator.user_has_permission(&u, Module::Accounting, PermissionAction::Edit));
    }

    #[test]
    fn test_last_override_wins() {
        let evaluator = PermissionEvaluator::default();
        let u = user(
            "employee",
            vec![
                PermissionOverride::grant("menu", "edit"),
                PermissionOverride::revoke("menu", "edit"),
            ],
        );
        assert!(!evaluator.user_has_permission(&u, Module::Menu, PermissionAction::Edit));
    }

    #[test]
    fn test_override_applies_to_unconfigured_module() {
        let evaluator = PermissionEvaluator::new(PermissionMatrix::empty());
        let u = user("employee", vec![PermissionOverride::grant("tables", "view")]);
        assert!(evaluator.user_has_permission(&u, Module::Tables, PermissionAction::View));
        assert!(!evaluator.user_has_permission(&u, Module::Tables, PermissionAction::Edit));
    }

    #[test]
    fn test_unknown_role_denies_everything() {
        let evaluator = PermissionEvaluator::default();
        let u = user("owner", vec![PermissionOverride::grant("orders", "view")]);
        for module in Module::ALL {
            for action in PermissionAction::ALL {
                assert!(!evaluator.user_has_permission(&u, module, action));
            }
        }
        assert!(evaluator.capabilities(&u).is_empty());
    }

    #[test]
    fn test_unknown_keys_deny() {
        let evaluator = PermissionEvaluator::default();
        let director = user("director", vec![]);
        assert!(!evaluator.check(&director, "kitchen", "view"));
        assert!(!evaluator.check(&director, "orders", "approve"));
        assert!(!evaluator.check(&director, "Orders", "view"));
    }

    #[test]
    fn test_absent_module_denies_for_all_roles() {
        let mut matrix = PermissionMatrix::default();
        for role in Role::ALL {
            let mut map = matrix.role_map(role).cloned().unwrap();
            map.remove(&Module::Loyalty);
            matrix = matrix.with_role(role, map);
        }
        let evaluator = PermissionEvaluator::new(matrix);
        for role in Role::ALL {
            for action in PermissionAction::ALL {
                assert!(!evaluator.check(&user(role.as_str(), vec![]), "loyalty", action.as_str()));
            }
        }
    }

    #[test]
    fn test_capabilities_reflect_overrides() {
        let evaluator = PermissionEvaluator::default();
        let u = user(
            "employee",
            vec![
                PermissionOverride::grant("analytics", "view"),
                PermissionOverride::revoke("orders", "create"),
                PermissionOverride::grant("nonexistent", "view"),
            ],
        );
        let caps = evaluator.capabilities(&u);
        assert!(caps.allows(Module::Analytics, PermissionAction::View));
        assert!(!caps.allows(Module::Orders, PermissionAction::Create));
        assert!(caps.allows(Module::Orders, PermissionAction::View));
        assert!(!caps.modules().any(|m| m == Module::Settings));
        assert!(caps.has_any_permission(&[
            (Module::Settings, PermissionAction::Edit),
            (Module::Menu, PermissionAction::View),
        ]));
        assert!(!caps.has_all_permissions(&[
            (Module::Settings, PermissionAction::Edit),
            (Module::Menu, PermissionAction::View),
        ]));
    }
}
