//! In-memory full-text search with TF-IDF ranking.
//!
//! [`SearchServer`] owns the inverted index; [`process_queries`] fans query
//! batches out over the rayon pool; [`RequestQueue`] tracks empty results
//! over a trailing window of requests.

pub mod concurrent_map;
pub mod document;
pub mod error;
pub mod process_queries;
pub mod query;
pub mod request_queue;
pub mod server;
pub mod tokenizer;

pub use concurrent_map::ConcurrentMap;
pub use document::{
    Document, DocumentId, DocumentStatus, ExecutionMode, DEFAULT_BUCKET_COUNT,
    MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON,
};
pub use error::{Result, SearchError};
pub use process_queries::{process_queries, process_queries_joined};
pub use request_queue::RequestQueue;
pub use server::{SearchServer, WordFrequencies};
