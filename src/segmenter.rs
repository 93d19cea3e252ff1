use tracing::debug;

use crate::error::{StoryError, StoryResult};

/// Splits plain prose into `target_count` contiguous word chunks.
///
/// Every chunk holds `ceil(words / target_count)` words except the trailing
/// ones, which may be shorter or empty when the text is short. The split is
/// positional only, so chunks can cut through the middle of a sentence.
pub fn segment(text: &str, target_count: usize) -> StoryResult<Vec<String>> {
    if target_count == 0 {
        return Err(StoryError::input("segment count must be at least 1"));
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Err(StoryError::input("no words to segment"));
    }

    let per_chunk = words.len().div_ceil(target_count);
    let chunks: Vec<String> = (0..target_count)
        .map(|i| {
            let start = (i * per_chunk).min(words.len());
            let end = (start + per_chunk).min(words.len());
            words[start..end].join(" ")
        })
        .collect();

    debug!(
        "Segmented {} words into {} chunks of up to {} words",
        words.len(),
        target_count,
        per_chunk
    );
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_equal_chunks() {
        let chunks = segment("one two three four five six", 3).unwrap();
        assert_eq!(chunks, vec!["one two", "three four", "five six"]);
    }

    #[test]
    fn last_chunk_may_be_shorter() {
        let chunks = segment("a b c d e f g", 3).unwrap();
        assert_eq!(chunks, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn short_input_yields_empty_chunks() {
        let chunks = segment("only three words", 5).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.iter().filter(|c| c.is_empty()).count(), 2);
        assert_eq!(chunks[0], "only");
        assert_eq!(chunks[2], "words");
    }

    #[test]
    fn chunks_reproduce_the_word_sequence() {
        let text = "It   was never\tfound and historians\nstill wonder about the city today";
        for count in 1..=12 {
            let chunks = segment(text, count).unwrap();
            assert_eq!(chunks.len(), count);
            let joined = chunks
                .iter()
                .filter(|c| !c.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            let expected = text.split_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(joined, expected, "count {}", count);
        }
    }

    #[test]
    fn is_deterministic() {
        let text = "the quick brown fox jumps over the lazy dog";
        assert_eq!(segment(text, 4).unwrap(), segment(text, 4).unwrap());
    }

    #[test]
    fn rejects_zero_count_and_empty_text() {
        assert!(matches!(segment("words here", 0), Err(StoryError::Input(_))));
        assert!(matches!(segment("   \n ", 3), Err(StoryError::Input(_))));
    }
}
