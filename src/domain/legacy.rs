use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// Versioned mapping from coarse account-level role tags to implied
/// permission names.
///
/// The table is configuration data owned outside this service; it is parsed
/// from JSON and validated once at load. Unknown tags resolve to no implied
/// permissions. Implied names that are missing from the active catalog are
/// ignored at resolution time, so the table may run ahead of (or behind) the
/// catalog without breaking reads.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LegacyRoleMap {
    pub version: u32,
    pub entries: HashMap<String, Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum LegacyMapError {
    #[error("failed to read legacy role map: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse legacy role map: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid legacy role map: {0}")]
    Invalid(String),
}

impl LegacyRoleMap {
    /// Parses and validates a legacy role map from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, LegacyMapError> {
        let map: LegacyRoleMap = serde_json::from_str(raw)?;
        map.validate()?;
        Ok(map)
    }

    /// Loads and validates a legacy role map from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LegacyMapError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), LegacyMapError> {
        if self.version == 0 {
            return Err(LegacyMapError::Invalid("version must be >= 1".to_string()));
        }
        for (tag, names) in &self.entries {
            if tag.trim().is_empty() {
                return Err(LegacyMapError::Invalid("empty legacy role tag".to_string()));
            }
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(LegacyMapError::Invalid(format!(
                    "tag '{tag}' maps to an empty permission name"
                )));
            }
        }
        Ok(())
    }

    /// Permission names implied by a legacy tag; empty for unknown tags.
    pub fn implied(&self, tag: &str) -> &[String] {
        self.entries.get(tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The table shipped with the binary, used when no external file is
    /// configured.
    pub fn builtin() -> &'static LegacyRoleMap {
        &BUILTIN
    }
}

static BUILTIN: Lazy<LegacyRoleMap> = Lazy::new(|| {
    let mut entries = HashMap::new();
    entries.insert(
        "administrator".to_string(),
        vec![
            "view_dashboard".to_string(),
            "view_orders".to_string(),
            "manage_orders".to_string(),
            "edit_menu".to_string(),
            "view_reports".to_string(),
        ],
    );
    entries.insert(
        "super_administrator".to_string(),
        vec![
            "view_dashboard".to_string(),
            "view_orders".to_string(),
            "manage_orders".to_string(),
            "edit_menu".to_string(),
            "view_reports".to_string(),
            "manage_kitchen".to_string(),
            "manage_subscriptions".to_string(),
            "manage_loyalty".to_string(),
            "manage_staff".to_string(),
        ],
    );
    entries.insert(
        "kitchen_lead".to_string(),
        vec!["view_dashboard".to_string(), "manage_kitchen".to_string()],
    );
    LegacyRoleMap { version: 1, entries }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_valid() {
        let raw = r#"{"version": 2, "entries": {"administrator": ["view_orders"], "greeter": []}}"#;
        let map = LegacyRoleMap::from_json(raw).unwrap();
        assert_eq!(map.version, 2);
        assert_eq!(map.implied("administrator"), ["view_orders".to_string()]);
        assert!(map.implied("greeter").is_empty());
        assert!(map.implied("unknown_tag").is_empty());
    }

    #[test]
    fn test_from_json_rejects_version_zero() {
        let raw = r#"{"version": 0, "entries": {}}"#;
        let err = LegacyRoleMap::from_json(raw).unwrap_err();
        assert!(matches!(err, LegacyMapError::Invalid(_)));
    }

    #[test]
    fn test_from_json_rejects_empty_names() {
        let raw = r#"{"version": 1, "entries": {"administrator": [""]}}"#;
        assert!(matches!(
            LegacyRoleMap::from_json(raw),
            Err(LegacyMapError::Invalid(_))
        ));

        let raw = r#"{"version": 1, "entries": {" ": ["view_orders"]}}"#;
        assert!(matches!(
            LegacyRoleMap::from_json(raw),
            Err(LegacyMapError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        assert!(matches!(
            LegacyRoleMap::from_json("{not json"),
            Err(LegacyMapError::Parse(_))
        ));
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let map = LegacyRoleMap::builtin();
        assert!(map.version >= 1);
        assert!(!map.implied("administrator").is_empty());
        assert!(map.validate().is_ok());
    }
}
