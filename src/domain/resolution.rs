use std::collections::{BTreeSet, HashMap};

use crate::domain::catalog::CatalogSnapshot;
use crate::domain::legacy::LegacyRoleMap;
use crate::domain::profile::Profile;

/// Why a permission appears in a profile's effective set.
///
/// Provenance is informational, never exclusionary: several sources can
/// co-grant the same permission.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionSource {
    /// Granted straight to the profile.
    Direct,
    /// Granted through membership in the named role.
    Role(String),
    /// Implied by a coarse account-level legacy role tag.
    Legacy,
}

impl PermissionSource {
    /// Stable textual tag: `direct`, `role:<name>`, `legacy`.
    pub fn tag(&self) -> String {
        match self {
            PermissionSource::Direct => "direct".to_string(),
            PermissionSource::Role(name) => format!("role:{name}"),
            PermissionSource::Legacy => "legacy".to_string(),
        }
    }
}

/// Per-source permission counts for a resolved profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceTotals {
    pub direct: usize,
    pub from_roles: usize,
    pub legacy: usize,
}

/// The resolved permission set for one profile: permission name mapped to a
/// non-empty set of provenance tags.
///
/// Membership checks are O(1), which is what the matrix builder leans on:
/// resolve once, then probe per column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectiveSet {
    entries: HashMap<String, BTreeSet<PermissionSource>>,
}

impl EffectiveSet {
    fn add(&mut self, name: &str, source: PermissionSource) {
        self.entries.entry(name.to_string()).or_default().insert(source);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn sources(&self, name: &str) -> Option<&BTreeSet<PermissionSource>> {
        self.entries.get(name)
    }

    /// Effective permission names, sorted for stable output.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<PermissionSource>)> {
        self.entries.iter()
    }

    /// Counts how many effective permissions carry each provenance kind.
    pub fn totals(&self) -> SourceTotals {
        let mut totals = SourceTotals::default();
        for sources in self.entries.values() {
            if sources.contains(&PermissionSource::Direct) {
                totals.direct += 1;
            }
            if sources.iter().any(|s| matches!(s, PermissionSource::Role(_))) {
                totals.from_roles += 1;
            }
            if sources.contains(&PermissionSource::Legacy) {
                totals.legacy += 1;
            }
        }
        totals
    }
}

/// Resolution engine: computes a profile's effective permission set from the
/// three independent grant sources (direct grants, role membership, legacy
/// account tags).
///
/// Stale grant rows are tolerated: an id or name that no longer resolves to
/// an active catalog entry contributes nothing.
pub struct ResolutionEngine<'a> {
    catalog: &'a CatalogSnapshot,
    legacy_map: &'a LegacyRoleMap,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(catalog: &'a CatalogSnapshot, legacy_map: &'a LegacyRoleMap) -> Self {
        Self { catalog, legacy_map }
    }

    /// Resolves the effective permission set with provenance.
    pub fn resolve(&self, profile: &Profile, legacy_tags: &[String]) -> EffectiveSet {
        let mut effective = EffectiveSet::default();

        for permission_id in &profile.direct_permissions {
            if let Some(permission) = self.catalog.active_permission(permission_id) {
                effective.add(&permission.name, PermissionSource::Direct);
            }
        }

        for role_id in &profile.roles {
            let Some(role) = self.catalog.active_role(role_id) else {
                continue;
            };
            for permission_id in &role.permissions {
                if let Some(permission) = self.catalog.active_permission(permission_id) {
                    effective.add(&permission.name, PermissionSource::Role(role.name.clone()));
                }
            }
        }

        for tag in legacy_tags {
            for name in self.legacy_map.implied(tag) {
                if let Some(permission) = self.catalog.active_permission_named(name) {
                    effective.add(&permission.name, PermissionSource::Legacy);
                }
            }
        }

        effective
    }

    /// One-off membership check. When checking many permissions for the same
    /// profile, call `resolve` once and probe the returned set instead.
    pub fn has_permission(&self, profile: &Profile, legacy_tags: &[String], name: &str) -> bool {
        self.resolve(profile, legacy_tags).contains(name)
    }
}
