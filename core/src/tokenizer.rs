/// Split text into the non-empty, space-delimited words it contains.
///
/// Words borrow from `text`; no validation happens here. The returned
/// iterator is `Clone`, so callers can walk the same text twice.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> + Clone {
    text.split(' ').filter(|word| !word.is_empty())
}

/// A word is valid when it holds no control characters (bytes below `' '`).
pub fn is_valid_word(word: &str) -> bool {
    !word.bytes().any(|b| b < b' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_spaces() {
        let words: Vec<&str> = split_into_words("  white cat  and fashionable collar ").collect();
        assert_eq!(words, ["white", "cat", "and", "fashionable", "collar"]);
    }

    #[test]
    fn empty_text_has_no_words() {
        assert_eq!(split_into_words("").count(), 0);
        assert_eq!(split_into_words("   ").count(), 0);
    }

    #[test]
    fn iterator_is_restartable() {
        let words = split_into_words("a b c");
        assert_eq!(words.clone().count(), 3);
        assert_eq!(words.last(), Some("c"));
    }

    #[test]
    fn control_characters_are_invalid() {
        assert!(is_valid_word("скворец"));
        assert!(is_valid_word("cat"));
        assert!(!is_valid_word("ca\u{12}t"));
        assert!(!is_valid_word("tab\there"));
    }
}
