use crate::document::DocumentId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("invalid document id {0}")]
    InvalidDocumentId(DocumentId),
    #[error("word {0:?} contains a control character")]
    InvalidWord(String),
    #[error("query word {0:?} is malformed")]
    InvalidQuerySyntax(String),
    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),
}

pub type Result<T> = std::result::Result<T, SearchError>;
