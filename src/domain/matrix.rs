use std::collections::BTreeSet;

use crate::domain::catalog::CatalogSnapshot;
use crate::domain::legacy::LegacyRoleMap;
use crate::domain::permission::Permission;
use crate::domain::profile::Profile;
use crate::domain::resolution::{EffectiveSet, PermissionSource, ResolutionEngine};
use crate::domain::role::Role;

/// One cell of the permission matrix: whether the row's profile holds the
/// column's permission, and through which sources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridCell {
    pub has: bool,
    pub sources: BTreeSet<PermissionSource>,
}

/// One profile row. `cells` is parallel to the grid's `columns`; the full
/// resolution result rides along for row summaries.
#[derive(Clone, Debug)]
pub struct GridRow {
    pub profile_id: String,
    pub user_id: String,
    pub effective: EffectiveSet,
    pub cells: Vec<GridCell>,
}

/// The all-profiles × all-permissions grid.
#[derive(Clone, Debug)]
pub struct PermissionGrid {
    pub columns: Vec<Permission>,
    pub rows: Vec<GridRow>,
}

/// Builds the permission matrix. Each profile is resolved exactly once;
/// cells are filled with O(1) probes of the precomputed effective set.
/// Columns follow catalog ordering and may be narrowed to one category.
pub fn build_permission_grid(
    entries: &[(Profile, Vec<String>)],
    catalog: &CatalogSnapshot,
    legacy_map: &LegacyRoleMap,
    category: Option<&str>,
) -> PermissionGrid {
    let engine = ResolutionEngine::new(catalog, legacy_map);
    let columns: Vec<Permission> = catalog
        .ordered_permissions(category)
        .into_iter()
        .cloned()
        .collect();

    let rows = entries
        .iter()
        .map(|(profile, legacy_tags)| {
            let effective = engine.resolve(profile, legacy_tags);
            let cells = columns
                .iter()
                .map(|permission| match effective.sources(&permission.name) {
                    Some(sources) => GridCell {
                        has: true,
                        sources: sources.clone(),
                    },
                    None => GridCell::default(),
                })
                .collect();
            GridRow {
                profile_id: profile.id.clone(),
                user_id: profile.user_id.clone(),
                effective,
                cells,
            }
        })
        .collect();

    PermissionGrid { columns, rows }
}

/// One profile row of the role matrix; cells are direct membership flags.
#[derive(Clone, Debug)]
pub struct RoleGridRow {
    pub profile_id: String,
    pub user_id: String,
    pub cells: Vec<bool>,
}

/// The all-profiles × all-roles grid. Membership is a direct set check on
/// the profile; no resolution involved.
#[derive(Clone, Debug)]
pub struct RoleGrid {
    pub columns: Vec<Role>,
    pub rows: Vec<RoleGridRow>,
}

pub fn build_role_grid(profiles: &[Profile], catalog: &CatalogSnapshot) -> RoleGrid {
    let columns: Vec<Role> = catalog.ordered_roles().into_iter().cloned().collect();
    let rows = profiles
        .iter()
        .map(|profile| RoleGridRow {
            profile_id: profile.id.clone(),
            user_id: profile.user_id.clone(),
            cells: columns.iter().map(|role| profile.holds_role(&role.id)).collect(),
        })
        .collect();
    RoleGrid { columns, rows }
}
