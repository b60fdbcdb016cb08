use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ASSETS_CREATE: &str = "assets:create";
pub const GROUPS_CREATE: &str = "groups:create";
pub const GROUPS_READ: &str = "groups:read";
pub const REVIEWS_CREATE: &str = "reviews:create";
pub const REVIEWS_READ: &str = "reviews:read";
pub const REVIEWS_EDIT: &str = "reviews:edit";
pub const REVIEWS_DELETE: &str = "reviews:delete";
pub const VIDEO_FINALIZE: &str = "video:finalize";

/// Every action known to the permission table.
pub const ALL_ACTIONS: &[&str] = &[
    ASSETS_CREATE,
    GROUPS_CREATE,
    GROUPS_READ,
    REVIEWS_CREATE,
    REVIEWS_READ,
    REVIEWS_EDIT,
    REVIEWS_DELETE,
    VIDEO_FINALIZE,
];

/// Role attached to an authenticated user by the identity provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Expert,
    Student,
}

impl Role {
    pub const ALL: &'static [Role] = &[Self::Admin, Self::Expert, Self::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Expert => "expert",
            Self::Student => "student",
        }
    }

    /// Actions granted to this role.
    pub fn permissions(&self) -> &'static [&'static str] {
        ROLE_PERMISSIONS
            .iter()
            .find(|(role, _)| role == self)
            .map(|(_, actions)| *actions)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Role -> granted actions.
pub const ROLE_PERMISSIONS: &[(Role, &[&str])] = &[
    (
        Role::Admin,
        &[
            ASSETS_CREATE,
            GROUPS_CREATE,
            GROUPS_READ,
            REVIEWS_CREATE,
            REVIEWS_READ,
            REVIEWS_EDIT,
            REVIEWS_DELETE,
            VIDEO_FINALIZE,
        ],
    ),
    (
        Role::Expert,
        &[
            GROUPS_CREATE,
            GROUPS_READ,
            REVIEWS_CREATE,
            REVIEWS_READ,
            REVIEWS_EDIT,
            REVIEWS_DELETE,
            VIDEO_FINALIZE,
        ],
    ),
    (Role::Student, &[ASSETS_CREATE, GROUPS_READ, REVIEWS_READ]),
];

/// Returns true if `role` is granted `action`. Unknown roles are denied.
pub fn has_permission(role: &str, action: &str) -> bool {
    role.parse::<Role>()
        .map(|role| role.permissions().contains(&action))
        .unwrap_or(false)
}
