use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::permission::Permission;
use crate::domain::role::Role;

/// Catalog column ordering: category ascending, then priority descending,
/// then name ascending. Matrix columns and category listings both use this,
/// which keeps the visual grouping stable across rebuilds.
pub fn catalog_order(a: &Permission, b: &Permission) -> Ordering {
    a.category
        .cmp(&b.category)
        .then_with(|| b.priority.cmp(&a.priority))
        .then_with(|| a.name.cmp(&b.name))
}

/// Immutable, indexed view over the permission and role catalogs.
///
/// Built once per request from the repositories; all lookups are O(1).
/// Resolution goes through the `active_*` accessors so soft-disabled
/// entries never leak into an effective set.
#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    permissions_by_id: HashMap<String, usize>,
    permissions_by_name: HashMap<String, usize>,
    roles_by_id: HashMap<String, usize>,
}

impl CatalogSnapshot {
    pub fn new(permissions: Vec<Permission>, roles: Vec<Role>) -> Self {
        let permissions_by_id = permissions
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let permissions_by_name = permissions
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        let roles_by_id = roles
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self {
            permissions,
            roles,
            permissions_by_id,
            permissions_by_name,
            roles_by_id,
        }
    }

    pub fn permission(&self, id: &str) -> Option<&Permission> {
        self.permissions_by_id.get(id).map(|&i| &self.permissions[i])
    }

    pub fn permission_named(&self, name: &str) -> Option<&Permission> {
        self.permissions_by_name.get(name).map(|&i| &self.permissions[i])
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles_by_id.get(id).map(|&i| &self.roles[i])
    }

    pub fn active_permission(&self, id: &str) -> Option<&Permission> {
        self.permission(id).filter(|p| p.is_active)
    }

    pub fn active_permission_named(&self, name: &str) -> Option<&Permission> {
        self.permission_named(name).filter(|p| p.is_active)
    }

    pub fn active_role(&self, id: &str) -> Option<&Role> {
        self.role(id).filter(|r| r.is_active)
    }

    /// Active permissions in catalog order, optionally narrowed to one
    /// category.
    pub fn ordered_permissions(&self, category: Option<&str>) -> Vec<&Permission> {
        let mut perms: Vec<&Permission> = self
            .permissions
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| category.is_none_or(|c| p.category == c))
            .collect();
        perms.sort_by(|a, b| catalog_order(a, b));
        perms
    }

    /// Active roles by descending priority, then name.
    pub fn ordered_roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.roles.iter().filter(|r| r.is_active).collect();
        roles.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: &str, name: &str, category: &str, priority: i32) -> Permission {
        Permission::new(
            id.to_string(),
            name.to_string(),
            format!("{name} description"),
            category.to_string(),
            priority,
        )
    }

    #[test]
    fn test_lookups_by_id_and_name() {
        let snapshot = CatalogSnapshot::new(
            vec![perm("p1", "view_orders", "orders", 1)],
            vec![Role::new(
                "r1".to_string(),
                "shift_lead_role".to_string(),
                "Shift lead".to_string(),
                1,
            )],
        );
        assert_eq!(snapshot.permission("p1").unwrap().name, "view_orders");
        assert_eq!(snapshot.permission_named("view_orders").unwrap().id, "p1");
        assert_eq!(snapshot.role("r1").unwrap().name, "shift_lead_role");
        assert!(snapshot.permission("missing").is_none());
    }

    #[test]
    fn test_inactive_entries_hidden_from_active_accessors() {
        let mut p = perm("p1", "view_orders", "orders", 1);
        p.deactivate();
        let mut r = Role::new(
            "r1".to_string(),
            "shift_lead_role".to_string(),
            "Shift lead".to_string(),
            1,
        );
        r.deactivate();
        let snapshot = CatalogSnapshot::new(vec![p], vec![r]);

        assert!(snapshot.permission("p1").is_some());
        assert!(snapshot.active_permission("p1").is_none());
        assert!(snapshot.active_permission_named("view_orders").is_none());
        assert!(snapshot.active_role("r1").is_none());
    }

    #[test]
    fn test_ordered_permissions_category_then_priority_then_name() {
        let snapshot = CatalogSnapshot::new(
            vec![
                perm("p1", "view_orders", "orders", 5),
                perm("p2", "manage_orders", "orders", 10),
                perm("p3", "edit_menu", "menu", 1),
                perm("p4", "archive_menu", "menu", 1),
            ],
            vec![],
        );
        let names: Vec<&str> = snapshot
            .ordered_permissions(None)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        // menu before orders; equal priority falls back to name
        assert_eq!(names, ["archive_menu", "edit_menu", "manage_orders", "view_orders"]);

        let orders_only: Vec<&str> = snapshot
            .ordered_permissions(Some("orders"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(orders_only, ["manage_orders", "view_orders"]);
    }
}
