use envstash_core_types::Sensitive;

/// One key of an export diff; the value is redacted in Debug output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub name: String,
    pub value: Sensitive<String>,
}

impl KeyValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Sensitive::new(value.into()),
        }
    }
}

/// Result of comparing the old and new environment with the live shell
///
/// Each bucket is sorted by name ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportChanges {
    /// New keys not present in the live shell
    pub to_add: Vec<KeyValue>,
    /// New keys present in the live shell with a different value
    pub to_change: Vec<KeyValue>,
    /// Old keys present in the live shell
    pub to_remove: Vec<KeyValue>,
    /// New keys whose live value already matches
    pub unchanged: Vec<KeyValue>,
}

impl ExportChanges {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty()
            && self.to_change.is_empty()
            && self.to_remove.is_empty()
            && self.unchanged.is_empty()
    }

    /// Total number of keys across all buckets
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_change.len() + self.to_remove.len() + self.unchanged.len()
    }
}
