//! Run many queries against one server on the rayon pool.

use crate::document::Document;
use crate::error::Result;
use crate::server::SearchServer;
use rayon::prelude::*;

/// Top documents for every query, in query order.
///
/// The first malformed query aborts the batch with its error.
pub fn process_queries<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    tracing::debug!(queries = queries.len(), "processing query batch");
    queries
        .par_iter()
        .map(|query| server.find_top_documents(query.as_ref()))
        .collect()
}

/// [`process_queries`] flattened into a single list. Each query's block
/// keeps its rank order and blocks follow query order.
pub fn process_queries_joined<S>(server: &SearchServer, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    let per_query = process_queries(server, queries)?;
    let total = per_query.iter().map(Vec::len).sum();
    let mut joined = vec![Document::default(); total];

    // Carve the output into one disjoint block per query up front.
    let mut blocks = Vec::with_capacity(per_query.len());
    let mut rest = joined.as_mut_slice();
    for documents in &per_query {
        let (block, tail) = std::mem::take(&mut rest).split_at_mut(documents.len());
        blocks.push(block);
        rest = tail;
    }
    blocks
        .into_par_iter()
        .zip(per_query.par_iter())
        .for_each(|(block, documents)| block.copy_from_slice(documents));

    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStatus;
    use crate::error::SearchError;

    fn server() -> SearchServer {
        let mut server = SearchServer::from_stop_words_text("and with").unwrap();
        let texts = [
            "funny pet and nasty rat",
            "funny pet with curly hair",
            "funny pet and not very nasty rat",
            "pet with rat and rat and rat",
            "nasty rat with curly hair",
        ];
        for (id, text) in texts.iter().enumerate() {
            server
                .add_document(id as i32 + 1, text, DocumentStatus::Actual, &[1, 2])
                .unwrap();
        }
        server
    }

    #[test]
    fn results_follow_query_order() {
        let server = server();
        let queries = ["nasty rat -not", "not very funny nasty pet", "curly hair"];
        let batch = process_queries(&server, &queries).unwrap();
        let counts: Vec<usize> = batch.iter().map(Vec::len).collect();
        assert_eq!(counts, [3, 5, 2]);
        for (query, result) in queries.iter().zip(&batch) {
            assert_eq!(&server.find_top_documents(query).unwrap(), result);
        }
    }

    #[test]
    fn joined_is_concatenation() {
        let server = server();
        let queries = vec!["nasty rat -not".to_string(), "curly hair".to_string(), "absent".to_string()];
        let batch = process_queries(&server, &queries).unwrap();
        let joined = process_queries_joined(&server, &queries).unwrap();
        let expected: Vec<Document> = batch.into_iter().flatten().collect();
        assert_eq!(joined, expected);
        assert_eq!(joined.len(), 5);
    }

    #[test]
    fn empty_batch() {
        let server = server();
        let queries: [&str; 0] = [];
        assert!(process_queries(&server, &queries).unwrap().is_empty());
        assert!(process_queries_joined(&server, &queries).unwrap().is_empty());
    }

    #[test]
    fn invalid_query_fails_batch() {
        let server = server();
        let err = process_queries(&server, &["rat", "--rat"]).unwrap_err();
        assert_eq!(err, SearchError::InvalidQuerySyntax("--rat".into()));
    }
}
