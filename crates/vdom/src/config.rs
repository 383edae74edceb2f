/// Property handling rules used by the props diff.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Names that always go through `set_attribute` even when the backend
    /// reports a reflected property (read-only on most backends).
    pub attribute_only: Vec<String>,
    /// Names reapplied on every pass even when the declared value is unchanged,
    /// since the live backend state can drift from the last value set.
    pub always_reapply: Vec<String>,
    /// Names cleared with `remove_attribute` instead of an empty value.
    pub remove_as_attribute: Vec<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            attribute_only: vec!["list".to_string(), "form".to_string()],
            always_reapply: vec!["checked".to_string(), "value".to_string()],
            remove_as_attribute: vec!["disabled".to_string()],
        }
    }
}

impl ReconcileConfig {
    pub fn is_attribute_only(&self, name: &str) -> bool {
        self.attribute_only.iter().any(|n| n == name)
    }

    pub fn always_reapplies(&self, name: &str) -> bool {
        self.always_reapply.iter().any(|n| n == name)
    }

    pub fn removes_as_attribute(&self, name: &str) -> bool {
        self.remove_as_attribute.iter().any(|n| n == name)
    }
}
