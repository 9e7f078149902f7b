//! Counts find requests that came back empty over a trailing window.

use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::Result;
use crate::server::SearchServer;
use std::collections::VecDeque;

/// Window length, one request per minute of a day.
pub const MIN_IN_DAY: usize = 1440;

pub struct RequestQueue<'a> {
    server: &'a SearchServer,
    requests: VecDeque<bool>,
    no_result_requests: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(server: &'a SearchServer) -> Self {
        Self {
            server,
            requests: VecDeque::with_capacity(MIN_IN_DAY),
            no_result_requests: 0,
        }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let documents = self.server.find_top_documents(raw_query)?;
        self.record(&documents);
        Ok(documents)
    }

    pub fn add_find_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        let documents = self.server.find_top_documents_by_status(raw_query, status)?;
        self.record(&documents);
        Ok(documents)
    }

    pub fn add_find_request_with<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let documents = self.server.find_top_documents_with(raw_query, predicate)?;
        self.record(&documents);
        Ok(documents)
    }

    /// Empty results among the last [`MIN_IN_DAY`] requests.
    pub fn no_result_requests(&self) -> usize {
        self.no_result_requests
    }

    fn record(&mut self, documents: &[Document]) {
        if self.requests.len() == MIN_IN_DAY {
            if let Some(true) = self.requests.pop_front() {
                self.no_result_requests -= 1;
            }
        }
        let empty = documents.is_empty();
        if empty {
            self.no_result_requests += 1;
        }
        self.requests.push_back(empty);
    }
}
