use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i64,
    pub project_id: i64,
    pub content: String,
    pub searches: i64,
    pub processed: bool,
    pub visible: bool,
}

impl Keyword {
    /// Case-folded, trimmed form that uniqueness is checked against.
    pub fn normalize(content: &str) -> String {
        content.trim().to_lowercase()
    }
}

/// Result of marking a keyword processed.
#[derive(Debug, Clone, Serialize)]
pub struct MarkProcessedOutcome {
    pub keyword: Keyword,
    /// True when this call completed the project's cycle and every visible
    /// keyword was reset.
    pub cycle_reset: bool,
}
