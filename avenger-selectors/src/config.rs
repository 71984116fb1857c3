/// Construction-time options for a selector view
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Name given to the selector's rendering anchor
    pub name: String,

    /// If true, declared marks that have no live view in the figure are
    /// reported with a warning each time the mark list is resolved
    pub report_unmatched_marks: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            name: "selector".to_string(),
            report_unmatched_marks: true,
        }
    }
}

impl SelectorConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
