//! The inverted index and TF-IDF ranking.

use crate::concurrent_map::ConcurrentMap;
use crate::document::{
    Document, DocumentId, DocumentStatus, ExecutionMode, DEFAULT_BUCKET_COUNT,
    MAX_RESULT_DOCUMENT_COUNT, RELEVANCE_EPSILON,
};
use crate::error::{Result, SearchError};
use crate::query::Query;
use crate::tokenizer::{is_valid_word, split_into_words};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

/// Per-word map of document id to term frequency. Each list carries its own
/// lock so removal can touch many words from many threads at once.
type PostingList = RwLock<BTreeMap<DocumentId, f64>>;

/// Term frequencies of one document, keyed by the words interned in the index.
pub type WordFrequencies = BTreeMap<Arc<str>, f64>;

static EMPTY_WORD_FREQUENCIES: WordFrequencies = BTreeMap::new();

#[derive(Debug)]
struct DocumentData {
    rating: i32,
    status: DocumentStatus,
    word_frequencies: WordFrequencies,
}

#[derive(Debug, Default)]
pub struct SearchServer {
    stop_words: BTreeSet<String>,
    word_to_document_freqs: HashMap<Arc<str>, PostingList>,
    documents: BTreeMap<DocumentId, DocumentData>,
    document_ids: Vec<DocumentId>,
}

impl SearchServer {
    /// Build a server that ignores `stop_words`. Empty strings are dropped and
    /// duplicates merged; a stop word with a control character is an error.
    pub fn new<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words: BTreeSet<String> = stop_words
            .into_iter()
            .map(|word| word.as_ref().to_string())
            .filter(|word| !word.is_empty())
            .collect();
        if let Some(invalid) = stop_words.iter().find(|word| !is_valid_word(word)) {
            return Err(SearchError::InvalidWord(invalid.clone()));
        }
        Ok(Self {
            stop_words,
            ..Self::default()
        })
    }

    /// Same as [`new`](Self::new) with the stop words given as space-separated text.
    pub fn from_stop_words_text(text: &str) -> Result<Self> {
        Self::new(split_into_words(text))
    }

    pub fn stop_words(&self) -> &BTreeSet<String> {
        &self.stop_words
    }

    pub fn add_document(
        &mut self,
        document_id: DocumentId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<()> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidDocumentId(document_id));
        }
        let words = self.split_into_words_no_stop(document)?;

        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for &word in &words {
                *counts.entry(word).or_default() += inv_word_count;
            }
        }

        let mut word_frequencies = WordFrequencies::new();
        for (word, freq) in counts {
            let key = match self.word_to_document_freqs.get_key_value(word) {
                Some((key, _)) => Arc::clone(key),
                None => Arc::from(word),
            };
            self.word_to_document_freqs
                .entry(Arc::clone(&key))
                .or_default()
                .get_mut()
                .insert(document_id, freq);
            word_frequencies.insert(key, freq);
        }

        tracing::debug!(
            document_id,
            words = words.len(),
            unique_words = word_frequencies.len(),
            "added document"
        );
        self.documents.insert(
            document_id,
            DocumentData {
                rating: compute_average_rating(ratings),
                status,
                word_frequencies,
            },
        );
        let pos = self.document_ids.partition_point(|&id| id < document_id);
        self.document_ids.insert(pos, document_id);
        Ok(())
    }

    /// Top documents with status [`DocumentStatus::Actual`].
    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_with(raw_query, move |_, document_status, _| {
            document_status == status
        })
    }

    pub fn find_top_documents_with<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with_mode(ExecutionMode::Sequential, raw_query, predicate)
    }

    /// Rank the documents accepted by `predicate` against `raw_query` and keep
    /// the best [`MAX_RESULT_DOCUMENT_COUNT`].
    ///
    /// Results are ordered by descending relevance; relevances within
    /// [`RELEVANCE_EPSILON`] of each other are ordered by descending rating.
    pub fn find_top_documents_with_mode<P>(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = Query::parse(raw_query, &self.stop_words)?;
        let mut matched = match mode {
            ExecutionMode::Sequential => self.find_all_documents(&query, &predicate),
            ExecutionMode::Parallel => self.find_all_documents_par(&query, &predicate),
        };
        rank_documents(&mut matched, mode);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);
        Ok(matched)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Document ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.document_ids.iter().copied()
    }

    /// Term frequencies of a document; empty when the id is unknown.
    pub fn word_frequencies(&self, document_id: DocumentId) -> &WordFrequencies {
        self.documents
            .get(&document_id)
            .map(|data| &data.word_frequencies)
            .unwrap_or(&EMPTY_WORD_FREQUENCIES)
    }

    pub fn remove_document(&mut self, document_id: DocumentId) -> Result<()> {
        self.remove_document_with_mode(ExecutionMode::Sequential, document_id)
    }

    /// Drop a document from the metadata store, the id list and every
    /// posting list it appears in.
    pub fn remove_document_with_mode(
        &mut self,
        mode: ExecutionMode,
        document_id: DocumentId,
    ) -> Result<()> {
        let data = self
            .documents
            .remove(&document_id)
            .ok_or(SearchError::DocumentNotFound(document_id))?;

        match mode {
            ExecutionMode::Sequential => {
                for word in data.word_frequencies.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(word) {
                        postings.get_mut().remove(&document_id);
                    }
                }
            }
            ExecutionMode::Parallel => {
                let index = &self.word_to_document_freqs;
                data.word_frequencies.par_iter().for_each(|(word, _)| {
                    if let Some(postings) = index.get(word) {
                        postings.write().remove(&document_id);
                    }
                });
            }
        }
        for word in data.word_frequencies.keys() {
            if self
                .word_to_document_freqs
                .get_mut(word)
                .is_some_and(|postings| postings.get_mut().is_empty())
            {
                self.word_to_document_freqs.remove(word);
            }
        }

        if let Ok(pos) = self.document_ids.binary_search(&document_id) {
            self.document_ids.remove(pos);
        }
        tracing::debug!(document_id, words = data.word_frequencies.len(), ?mode, "removed document");
        Ok(())
    }

    pub fn match_document<'q>(
        &self,
        raw_query: &'q str,
        document_id: DocumentId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        self.match_document_with_mode(ExecutionMode::Sequential, raw_query, document_id)
    }

    /// Plus words of `raw_query` found in the document, sorted and deduplicated,
    /// together with the document's status. The word list is empty when the
    /// document contains any minus word.
    pub fn match_document_with_mode<'q>(
        &self,
        mode: ExecutionMode,
        raw_query: &'q str,
        document_id: DocumentId,
    ) -> Result<(Vec<&'q str>, DocumentStatus)> {
        let data = self
            .documents
            .get(&document_id)
            .ok_or(SearchError::DocumentNotFound(document_id))?;
        let contains = |word: &str| data.word_frequencies.contains_key(word);

        let mut matched = match mode {
            ExecutionMode::Sequential => {
                let query = Query::parse(raw_query, &self.stop_words)?;
                if query.plus_words.is_empty() || query.minus_words.iter().any(|w| contains(*w)) {
                    return Ok((Vec::new(), data.status));
                }
                query
                    .plus_words
                    .into_iter()
                    .filter(|w| contains(*w))
                    .collect::<Vec<_>>()
            }
            ExecutionMode::Parallel => {
                let query = Query::parse_unordered(raw_query, &self.stop_words)?;
                if query.plus_words.is_empty()
                    || query.minus_words.par_iter().any(|w| contains(*w))
                {
                    return Ok((Vec::new(), data.status));
                }
                query
                    .plus_words
                    .into_par_iter()
                    .filter(|w| contains(*w))
                    .collect::<Vec<_>>()
            }
        };
        matched.sort_unstable();
        matched.dedup();
        Ok((matched, data.status))
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    fn inverse_document_freq(&self, documents_with_word: usize) -> f64 {
        (self.document_count() as f64 / documents_with_word as f64).ln()
    }

    fn find_all_documents<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocumentId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                continue;
            };
            let postings = postings.read();
            let idf = self.inverse_document_freq(postings.len());
            for (&document_id, &term_freq) in postings.iter() {
                if self.accepts(document_id, predicate) {
                    *document_to_relevance.entry(document_id).or_default() += term_freq * idf;
                }
            }
        }
        for word in &query.minus_words {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for document_id in postings.read().keys() {
                    document_to_relevance.remove(document_id);
                }
            }
        }
        self.collect_documents(document_to_relevance)
    }

    fn find_all_documents_par<P>(&self, query: &Query<'_>, predicate: &P) -> Vec<Document>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let document_to_relevance: ConcurrentMap<DocumentId, f64> =
            ConcurrentMap::new(DEFAULT_BUCKET_COUNT);
        query.plus_words.par_iter().for_each(|word| {
            let Some(postings) = self.word_to_document_freqs.get(*word) else {
                return;
            };
            let postings = postings.read();
            let idf = self.inverse_document_freq(postings.len());
            for (&document_id, &term_freq) in postings.iter() {
                if self.accepts(document_id, predicate) {
                    *document_to_relevance.access(document_id) += term_freq * idf;
                }
            }
        });
        query.minus_words.par_iter().for_each(|word| {
            if let Some(postings) = self.word_to_document_freqs.get(*word) {
                for &document_id in postings.read().keys() {
                    document_to_relevance.erase(document_id);
                }
            }
        });
        self.collect_documents(document_to_relevance.into_ordinary_map())
    }

    fn accepts<P>(&self, document_id: DocumentId, predicate: &P) -> bool
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool,
    {
        self.documents
            .get(&document_id)
            .is_some_and(|data| predicate(document_id, data.status, data.rating))
    }

    fn collect_documents(&self, document_to_relevance: BTreeMap<DocumentId, f64>) -> Vec<Document> {
        document_to_relevance
            .into_iter()
            .filter_map(|(id, relevance)| {
                self.documents
                    .get(&id)
                    .map(|data| Document::new(id, relevance, data.rating))
            })
            .collect()
    }
}

impl FromStr for SearchServer {
    type Err = SearchError;

    fn from_str(stop_words_text: &str) -> Result<Self> {
        Self::from_stop_words_text(stop_words_text)
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocumentId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, DocumentId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.document_ids.iter().copied()
    }
}

fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

/// Whether `a` may be ranked directly ahead of `b`: clearly more relevant,
/// or within `RELEVANCE_EPSILON` and rated at least as high.
fn in_rank_order(a: &Document, b: &Document) -> bool {
    a.relevance > b.relevance + RELEVANCE_EPSILON
        || ((a.relevance - b.relevance).abs() <= RELEVANCE_EPSILON && a.rating >= b.rating)
}

/// Sort by descending relevance, then reorder each run of near-equal
/// relevances by descending rating. A run is anchored at its most relevant
/// document, so every member lies within `RELEVANCE_EPSILON` of every other.
///
/// Runs can still meet at a boundary where relevances chain across more
/// than epsilon, so a final pass swaps neighbours until every adjacent pair
/// is in rank order. Each swap fixes one out-of-order pair without touching
/// the relative order of any other pair, so the pass terminates.
fn rank_documents(documents: &mut [Document], mode: ExecutionMode) {
    let by_relevance = |lhs: &Document, rhs: &Document| rhs.relevance.total_cmp(&lhs.relevance);
    match mode {
        ExecutionMode::Sequential => documents.sort_by(by_relevance),
        ExecutionMode::Parallel => documents.par_sort_by(by_relevance),
    }

    let mut start = 0;
    while start < documents.len() {
        let head = documents[start].relevance;
        let len = documents[start..]
            .iter()
            .take_while(|doc| (head - doc.relevance).abs() < RELEVANCE_EPSILON)
            .count()
            .max(1);
        documents[start..start + len].sort_by(|lhs, rhs| match rhs.rating.cmp(&lhs.rating) {
            Ordering::Equal => rhs.relevance.total_cmp(&lhs.relevance),
            other => other,
        });
        start += len;
    }

    let mut swapped = true;
    while swapped {
        swapped = false;
        for i in 1..documents.len() {
            if !in_rank_order(&documents[i - 1], &documents[i]) {
                documents.swap(i - 1, i);
                swapped = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_with_docs() -> SearchServer {
        let mut server = SearchServer::from_stop_words_text("and in on").unwrap();
        server
            .add_document(1, "white cat and fashionable collar", DocumentStatus::Actual, &[8, -3])
            .unwrap();
        server
            .add_document(2, "fluffy cat fluffy tail", DocumentStatus::Actual, &[7, 2, 7])
            .unwrap();
        server
            .add_document(3, "groomed dog expressive eyes", DocumentStatus::Actual, &[5, -12, 2, 1])
            .unwrap();
        server
    }

    #[test]
    fn average_rating_truncates_toward_zero() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[8, -3]), 2);
        assert_eq!(compute_average_rating(&[5, -12, 2, 1]), -1);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }

    #[test]
    fn rank_breaks_ties_by_rating() {
        let mut docs = vec![
            Document::new(1, 0.5, 1),
            Document::new(2, 0.9, 0),
            Document::new(3, 0.5 + 1e-7, 4),
            Document::new(4, 0.5 - 1e-7, 9),
        ];
        rank_documents(&mut docs, ExecutionMode::Sequential);
        let ids: Vec<DocumentId> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, [2, 4, 3, 1]);
    }

    fn assert_in_rank_order(documents: &[Document]) {
        for pair in documents.windows(2) {
            assert!(in_rank_order(&pair[0], &pair[1]), "{} ranked before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn rank_repairs_chained_runs() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            let mut docs = vec![
                Document::new(1, 1.0, 10),
                Document::new(2, 1.0 - 0.9e-6, 0),
                Document::new(3, 1.0 - 1.5e-6, 5),
            ];
            rank_documents(&mut docs, mode);
            assert_in_rank_order(&docs);
            let ids: Vec<DocumentId> = docs.iter().map(|d| d.id).collect();
            assert_eq!(ids, [1, 3, 2]);
        }
    }

    #[test]
    fn rank_long_chain_keeps_adjacent_order() {
        // relevances step by 0.6 epsilon, so every neighbour is a near tie
        // while the chain as a whole spans many epsilons
        let mut docs: Vec<Document> = (0..40)
            .map(|i| Document::new(i, 2.0 - f64::from(i) * 0.6e-6, (i * 7919) % 13))
            .collect();
        docs.reverse();
        rank_documents(&mut docs, ExecutionMode::Sequential);
        assert_eq!(docs.len(), 40);
        assert_in_rank_order(&docs);
    }

    #[test]
    fn interned_words_are_shared() {
        let server = server_with_docs();
        let freqs = server.word_frequencies(2);
        let (key, _) = freqs.get_key_value("fluffy").unwrap();
        let (index_key, _) = server.word_to_document_freqs.get_key_value("fluffy").unwrap();
        assert!(Arc::ptr_eq(key, index_key));
        assert_eq!(freqs["fluffy"], 0.5);
    }

    #[test]
    fn removal_drops_empty_posting_lists() {
        let mut server = server_with_docs();
        server.remove_document(3).unwrap();
        assert!(!server.word_to_document_freqs.contains_key("dog"));
        assert!(server.word_to_document_freqs.contains_key("cat"));
        server.remove_document_with_mode(ExecutionMode::Parallel, 1).unwrap();
        assert!(!server.word_to_document_freqs.contains_key("collar"));
        assert_eq!(server.word_to_document_freqs["cat"].read().len(), 1);
    }

    #[test]
    fn failed_add_leaves_index_untouched() {
        let mut server = server_with_docs();
        let before = server.word_to_document_freqs.len();
        assert_eq!(
            server.add_document(4, "new words bro\u{7}ken", DocumentStatus::Actual, &[1]),
            Err(SearchError::InvalidWord("bro\u{7}ken".into()))
        );
        assert_eq!(server.word_to_document_freqs.len(), before);
        assert_eq!(server.document_count(), 3);
    }
}
