/// Platform account that owns staff profiles.
///
/// `legacy_roles` are the coarse account-level role tags kept for backward
/// compatibility; they map to implied permissions via the legacy role map.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub legacy_roles: Vec<String>,
}

impl UserAccount {
    pub fn new(id: String, display_name: String, email: String) -> Self {
        Self {
            id,
            display_name,
            email,
            legacy_roles: vec![],
        }
    }

    pub fn has_legacy_role(&self, tag: &str) -> bool {
        self.legacy_roles.iter().any(|t| t == tag)
    }
}
