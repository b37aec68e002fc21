use core::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize};

use erpdash_core::RoleId;

use crate::Permission;

/// Position of a role in the organisational hierarchy.
///
/// Ordered by rank: `SuperAdmin` outranks everything, `Executive` nothing.
/// The client uses this for display only; granted permissions always come
/// from the server-resolved [`PermissionSnapshot`](crate::PermissionSnapshot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleLevel {
    SuperAdmin,
    Director,
    Head,
    Manager,
    Executive,
}

impl RoleLevel {
    pub const fn rank(self) -> u8 {
        match self {
            RoleLevel::SuperAdmin => 5,
            RoleLevel::Director => 4,
            RoleLevel::Head => 3,
            RoleLevel::Manager => 2,
            RoleLevel::Executive => 1,
        }
    }

    pub fn outranks(self, other: RoleLevel) -> bool {
        self.rank() > other.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleLevel::SuperAdmin => "SUPER_ADMIN",
            RoleLevel::Director => "DIRECTOR",
            RoleLevel::Head => "HEAD",
            RoleLevel::Manager => "MANAGER",
            RoleLevel::Executive => "EXECUTIVE",
        }
    }
}

impl PartialOrd for RoleLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoleLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl core::str::FromStr for RoleLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(RoleLevel::SuperAdmin),
            "DIRECTOR" => Ok(RoleLevel::Director),
            "HEAD" => Ok(RoleLevel::Head),
            "MANAGER" => Ok(RoleLevel::Manager),
            "EXECUTIVE" => Ok(RoleLevel::Executive),
            other => Err(format!("unknown role level '{other}'")),
        }
    }
}

impl core::fmt::Display for RoleLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named bundle of permissions assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// `None` when the server sends a level this client does not know.
    #[serde(default, deserialize_with = "known_level")]
    pub level: Option<RoleLevel>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

fn known_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RoleLevel>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|raw| raw.parse().ok()))
}
