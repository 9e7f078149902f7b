use serde::{Deserialize, Serialize};
use std::fmt;

pub type DocumentId = i32;

/// Upper bound on the number of documents returned by a single query.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;

/// Relevances closer than this are ranked by rating instead.
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Shard count of the per-query relevance accumulator.
pub const DEFAULT_BUCKET_COUNT: usize = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// A ranked search hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocumentId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}

/// How an operation distributes its work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_log_format() {
        let doc = Document::new(1, 0.5, 3);
        assert_eq!(doc.to_string(), "{ document_id = 1, relevance = 0.5, rating = 3 }");
    }

    #[test]
    fn status_uses_snake_case() {
        let s: DocumentStatus = serde_json::from_str("\"irrelevant\"").unwrap();
        assert_eq!(s, DocumentStatus::Irrelevant);
        assert_eq!(serde_json::to_string(&DocumentStatus::Actual).unwrap(), "\"actual\"");
    }
}
