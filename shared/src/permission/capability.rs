use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::action::PermissionAction;
use super::module::Module;

/// Materialized permissions of one user after applying overrides
///
/// Modules with no granted action are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    grants: BTreeMap<Module, BTreeSet<PermissionAction>>,
}

impl CapabilitySet {
    pub(crate) fn insert(&mut self, module: Module, action: PermissionAction) {
        self.grants.entry(module).or_default().insert(action);
    }

    pub fn allows(&self, module: Module, action: PermissionAction) -> bool {
        self.grants
            .get(&module)
            .is_some_and(|actions| actions.contains(&action))
    }

    pub fn has_any_permission(&self, required: &[(Module, PermissionAction)]) -> bool {
        required.iter().any(|(m, a)| self.allows(*m, *a))
    }

    /// Empty `required` is vacuously true
    pub fn has_all_permissions(&self, required: &[(Module, PermissionAction)]) -> bool {
        required.iter().all(|(m, a)| self.allows(*m, *a))
    }

    pub fn actions(&self, module: Module) -> impl Iterator<Item = PermissionAction> + '_ {
        self.grants.get(&module).into_iter().flatten().copied()
    }

    /// Modules with at least one granted action (navigation menus)
    pub fn modules(&self) -> impl Iterator<Item = Module> + '_ {
        self.grants.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
