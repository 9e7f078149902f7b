//! Query text to plus/minus word sets.

use crate::error::{Result, SearchError};
use crate::tokenizer::{is_valid_word, split_into_words};
use std::collections::BTreeSet;

const MINUS_MARKER: char = '-';

/// Words a document must contain (`plus_words`) or must not (`minus_words`).
/// Both borrow from the raw query text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

#[derive(Debug)]
struct QueryWord<'a> {
    data: &'a str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'a>(text: &'a str, stop_words: &BTreeSet<String>) -> Result<QueryWord<'a>> {
    let (word, is_minus) = match text.strip_prefix(MINUS_MARKER) {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if word.is_empty() || word.starts_with(MINUS_MARKER) {
        return Err(SearchError::InvalidQuerySyntax(text.to_string()));
    }
    if !is_valid_word(word) {
        return Err(SearchError::InvalidWord(text.to_string()));
    }
    Ok(QueryWord {
        data: word,
        is_minus,
        is_stop: stop_words.contains(word),
    })
}

impl<'a> Query<'a> {
    /// Parse `text` with set semantics: both word lists come back sorted and
    /// free of duplicates.
    pub fn parse(text: &'a str, stop_words: &BTreeSet<String>) -> Result<Self> {
        let mut query = Self::parse_unordered(text, stop_words)?;
        for words in [&mut query.plus_words, &mut query.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
        Ok(query)
    }

    /// Parse `text`, keeping words in query order, duplicates included.
    pub fn parse_unordered(text: &'a str, stop_words: &BTreeSet<String>) -> Result<Self> {
        let mut query = Query::default();
        for token in split_into_words(text) {
            let word = parse_query_word(token, stop_words)?;
            if word.is_stop {
                continue;
            }
            if word.is_minus {
                query.minus_words.push(word.data);
            } else {
                query.plus_words.push(word.data);
            }
        }
        tracing::trace!(
            plus = query.plus_words.len(),
            minus = query.minus_words.len(),
            "parsed query"
        );
        Ok(query)
    }
}
