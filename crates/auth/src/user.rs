//! Identity record of the signed-in user.

use serde::{Deserialize, Serialize};

use erpdash_core::UserId;

use crate::{Role, RoleLevel};

/// The current user as returned by `GET /auth/me`.
///
/// Server-owned; the client treats it as immutable until the next fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl User {
    /// Display name, falling back to the email when both name parts are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    pub fn highest_role_level(&self) -> Option<RoleLevel> {
        self.roles.iter().filter_map(|r| r.level).max()
    }

    pub fn has_role_level(&self, level: RoleLevel) -> bool {
        self.roles.iter().any(|r| r.level == Some(level))
    }
}
