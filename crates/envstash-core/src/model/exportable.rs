use envstash_core_types::Sensitive;

/// One entry of an environment's flattened export view
///
/// Produced from a local variable or from a reference (named after the
/// reference, carrying the target variable's value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exportable {
    pub name: String,
    pub value: Sensitive<String>,
    pub enabled: bool,
}
