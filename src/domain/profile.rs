/// Which staff surface a profile authorizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Admin,
    Kitchen,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Admin => "admin",
            ProfileKind::Kitchen => "kitchen",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(ProfileKind::Admin),
            "kitchen" => Some(ProfileKind::Kitchen),
            _ => None,
        }
    }
}

/// Profile aggregate: the authorization-bearing record attached to a user.
///
/// One profile per user per kind. Direct permission grants and role
/// memberships are independent sets; revoking one never touches the other.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub kind: ProfileKind,
    pub direct_permissions: Vec<String>, // permission IDs
    pub roles: Vec<String>,              // role IDs
}

impl Profile {
    /// Creates a new Profile with empty grant sets.
    pub fn new(id: String, user_id: String, kind: ProfileKind) -> Self {
        Self {
            id,
            user_id,
            kind,
            direct_permissions: vec![],
            roles: vec![],
        }
    }

    /// Grants a permission directly to the profile (if not already granted).
    pub fn grant_permission(&mut self, permission_id: String) {
        if !self.direct_permissions.contains(&permission_id) {
            self.direct_permissions.push(permission_id);
        }
    }

    /// Revokes a direct permission grant. Role-sourced grants are untouched.
    pub fn revoke_permission(&mut self, permission_id: &str) {
        self.direct_permissions.retain(|p| p != permission_id);
    }

    /// Assigns a role to the profile (if not already held).
    pub fn assign_role(&mut self, role_id: String) {
        if !self.roles.contains(&role_id) {
            self.roles.push(role_id);
        }
    }

    /// Removes a role from the profile. Direct grants are untouched.
    pub fn unassign_role(&mut self, role_id: &str) {
        self.roles.retain(|r| r != role_id);
    }

    pub fn has_direct_permission(&self, permission_id: &str) -> bool {
        self.direct_permissions.iter().any(|p| p == permission_id)
    }

    pub fn holds_role(&self, role_id: &str) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }
}
