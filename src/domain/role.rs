use chrono::{DateTime, Utc};

/// Role entity: a named, flat bundle of permissions.
///
/// Roles do not nest. `permissions` holds permission IDs; membership is a
/// set (no duplicates).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub is_active: bool,
    pub permissions: Vec<String>, // permission IDs
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new active Role with no permissions.
    pub fn new(id: String, name: String, description: String, priority: i32) -> Self {
        Self {
            id,
            name,
            description,
            priority,
            is_active: true,
            permissions: vec![],
            created_at: Utc::now(),
        }
    }

    /// Adds a permission to the role (if not already present).
    pub fn add_permission(&mut self, permission_id: String) {
        if !self.permissions.contains(&permission_id) {
            self.permissions.push(permission_id);
        }
    }

    /// Removes a permission from the role.
    pub fn remove_permission(&mut self, permission_id: &str) {
        self.permissions.retain(|p| p != permission_id);
    }

    /// Checks whether the role bundles the given permission.
    pub fn has_permission(&self, permission_id: &str) -> bool {
        self.permissions.iter().any(|p| p == permission_id)
    }

    /// Soft-disables the role. Membership rows are kept.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}
