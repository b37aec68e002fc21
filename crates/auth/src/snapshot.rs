//! Server-resolved permission set of the current user.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Permission, PermissionCheck, PermissionCode};

/// Result of `GET /auth/permissions`.
///
/// Effective permissions are the union over the user's roles, computed by
/// the server. `is_super_admin` is absolute: it grants every code whether or
/// not `permissions` mentions it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSnapshot {
    #[serde(default)]
    pub is_super_admin: bool,

    #[serde(default)]
    pub permissions: HashMap<PermissionCode, bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions_by_module: Option<BTreeMap<String, Vec<Permission>>>,
}

impl PermissionSnapshot {
    pub fn super_admin() -> Self {
        Self {
            is_super_admin: true,
            ..Self::default()
        }
    }

    /// A snapshot granting exactly `codes`.
    pub fn from_codes(codes: impl IntoIterator<Item = PermissionCode>) -> Self {
        Self {
            is_super_admin: false,
            permissions: codes.into_iter().map(|code| (code, true)).collect(),
            permissions_by_module: None,
        }
    }

    pub fn with_grant(mut self, code: PermissionCode, granted: bool) -> Self {
        self.permissions.insert(code, granted);
        self
    }

    /// Codes explicitly granted, sorted. Does not expand the super-admin bypass.
    pub fn granted_codes(&self) -> Vec<&PermissionCode> {
        let mut codes: Vec<_> = self
            .permissions
            .iter()
            .filter(|(_, granted)| **granted)
            .map(|(code, _)| code)
            .collect();
        codes.sort();
        codes
    }

    pub fn module_permissions(&self, module: &str) -> &[Permission] {
        self.permissions_by_module
            .as_ref()
            .and_then(|by_module| by_module.get(module))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl PermissionCheck for PermissionSnapshot {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        if self.is_super_admin {
            return true;
        }
        self.permissions.get(code.as_str()).copied().unwrap_or(false)
    }
}
