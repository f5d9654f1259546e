use chrono::{DateTime, Utc};

/// Permission value object: a named capability flag in the catalog.
///
/// Identity is `name` (globally unique, case-sensitive); `id` is a storage
/// surrogate. Inactive permissions stay in the catalog but are excluded from
/// resolution.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a new active Permission.
    pub fn new(id: String, name: String, description: String, category: String, priority: i32) -> Self {
        Self {
            id,
            name,
            description,
            category,
            priority,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Soft-disables the permission. Grant rows referencing it are kept.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Re-enables a soft-disabled permission.
    pub fn activate(&mut self) {
        self.is_active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_new() {
        let perm = Permission::new(
            "perm1".to_string(),
            "view_dashboard".to_string(),
            "View the staff dashboard".to_string(),
            "dashboard".to_string(),
            10,
        );
        assert_eq!(perm.id, "perm1");
        assert_eq!(perm.name, "view_dashboard");
        assert_eq!(perm.category, "dashboard");
        assert_eq!(perm.priority, 10);
        assert!(perm.is_active);
    }

    #[test]
    fn test_deactivate_and_activate() {
        let mut perm = Permission::new(
            "perm1".to_string(),
            "manage_kitchen".to_string(),
            "Manage kitchen operations".to_string(),
            "kitchen".to_string(),
            5,
        );
        perm.deactivate();
        assert!(!perm.is_active);
        perm.deactivate(); // idempotent
        assert!(!perm.is_active);
        perm.activate();
        assert!(perm.is_active);
    }
}
