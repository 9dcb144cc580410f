use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::action::PermissionAction;
use super::defaults::{DIRECTOR_PERMISSIONS, EMPLOYEE_PERMISSIONS};
use super::module::Module;
use crate::models::Role;

/// Module → granted actions for one role
pub type PermissionsMap = BTreeMap<Module, BTreeSet<PermissionAction>>;

/// Permission matrix configuration errors
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("invalid permission matrix: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("role {0} is missing from the permission matrix")]
    MissingRole(Role),

    #[error("role {role} has no entry for module {module}")]
    MissingModule { role: Role, module: Module },
}

/// Role default matrix: role → module → actions
///
/// Serialized as `{"director": {"orders": ["view", ...]}, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix {
    roles: BTreeMap<Role, PermissionsMap>,
}

impl Default for PermissionMatrix {
    fn default() -> Self {
        Self::empty()
            .with_role(Role::Director, table(DIRECTOR_PERMISSIONS))
            .with_role(Role::Employee, table(EMPLOYEE_PERMISSIONS))
    }
}

fn table(rows: &[(Module, &[PermissionAction])]) -> PermissionsMap {
    rows.iter()
        .map(|(module, actions)| (*module, actions.iter().copied().collect()))
        .collect()
}

impl PermissionMatrix {
    /// A matrix with no roles: denies everything
    pub fn empty() -> Self {
        Self {
            roles: BTreeMap::new(),
        }
    }

    /// Parse a matrix from JSON and check it is total over role × module
    pub fn from_json(json: &str) -> Result<Self, MatrixError> {
        let matrix: Self = serde_json::from_str(json)?;
        matrix.validate()?;
        Ok(matrix)
    }

    pub fn with_role(mut self, role: Role, map: PermissionsMap) -> Self {
        self.roles.insert(role, map);
        self
    }

    /// Replace the actions a role holds on a module
    pub fn set(
        &mut self,
        role: Role,
        module: Module,
        actions: impl IntoIterator<Item = PermissionAction>,
    ) {
        self.roles
            .entry(role)
            .or_default()
            .insert(module, actions.into_iter().collect());
    }

    pub fn role_map(&self, role: Role) -> Option<&PermissionsMap> {
        self.roles.get(&role)
    }

    /// Actions granted by default, `None` when the pair is not configured
    pub fn actions(&self, role: Role, module: Module) -> Option<&BTreeSet<PermissionAction>> {
        self.roles.get(&role).and_then(|map| map.get(&module))
    }

    /// Role default lookup. A missing (role, module) pair is a configuration
    /// defect and denies.
    pub fn allows(&self, role: Role, module: Module, action: PermissionAction) -> bool {
        match self.actions(role, module) {
            Some(actions) => actions.contains(&action),
            None => {
                tracing::warn!(
                    target: "permission",
                    role = %role,
                    module = %module,
                    "Module missing from permission matrix, denying"
                );
                false
            }
        }
    }

    /// Every (role, module) pair without an entry
    pub fn missing_entries(&self) -> Vec<(Role, Module)> {
        Role::ALL
            .into_iter()
            .flat_map(|role| Module::ALL.into_iter().map(move |module| (role, module)))
            .filter(|(role, module)| self.actions(*role, *module).is_none())
            .collect()
    }

    /// Check the matrix is total over the known roles and modules
    pub fn validate(&self) -> Result<(), MatrixError> {
        for role in Role::ALL {
            let Some(map) = self.roles.get(&role) else {
                return Err(MatrixError::MissingRole(role));
            };
            if let Some(module) = Module::ALL.into_iter().find(|m| !map.contains_key(m)) {
                return Err(MatrixError::MissingModule { role, module });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_is_total() {
        let matrix = PermissionMatrix::default();
        assert!(matrix.validate().is_ok());
        assert!(matrix.missing_entries().is_empty());
    }

    #[test]
    fn test_employee_cannot_delete_employees() {
        let matrix = PermissionMatrix::default();
        assert!(!matrix.allows(Role::Employee, Module::Employees, PermissionAction::Delete));
        assert!(matrix.allows(Role::Director, Module::Employees, PermissionAction::Delete));
    }

    #[test]
    fn test_employee_has_no_critical_module_access() {
        let matrix = PermissionMatrix::default();
        for module in Module::CRITICAL {
            for action in PermissionAction::ALL {
                assert!(!matrix.allows(Role::Employee, module, action));
            }
        }
    }

    #[test]
    fn test_missing_module_denies() {
        let mut map = PermissionsMap::new();
        map.insert(Module::Orders, PermissionAction::ALL.into_iter().collect());
        let matrix = PermissionMatrix::empty().with_role(Role::Director, map);

        assert!(matrix.allows(Role::Director, Module::Orders, PermissionAction::Delete));
        for action in PermissionAction::ALL {
            assert!(!matrix.allows(Role::Director, Module::Menu, action));
            assert!(!matrix.allows(Role::Employee, Module::Orders, action));
        }
    }

    #[test]
    fn test_validate_reports_gap() {
        let mut matrix = PermissionMatrix::default();
        matrix
            .roles
            .get_mut(&Role::Employee)
            .unwrap()
            .remove(&Module::Backups);

        match matrix.validate() {
            Err(MatrixError::MissingModule { role, module }) => {
                assert_eq!(role, Role::Employee);
                assert_eq!(module, Module::Backups);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(matrix.missing_entries(), vec![(Role::Employee, Module::Backups)]);
    }

    #[test]
    fn test_from_json_rejects_partial_matrix() {
        let json = r#"{"director": {"orders": ["view"]}, "employee": {}}"#;
        assert!(matches!(
            PermissionMatrix::from_json(json),
            Err(MatrixError::MissingModule { .. })
        ));
    }

    #[test]
    fn test_json_roundtrip_of_default() {
        let matrix = PermissionMatrix::default();
        let json = serde_json::to_string(&matrix).unwrap();
        let parsed = PermissionMatrix::from_json(&json).unwrap();
        assert_eq!(parsed, matrix);
    }

    #[test]
    fn test_unknown_module_key_is_parse_error() {
        let json = r#"{"director": {"kitchen": ["view"]}}"#;
        assert!(matches!(
            PermissionMatrix::from_json(json),
            Err(MatrixError::Parse(_))
        ));
    }
}
