//! Keyword enrichment: most frequent non-stop-words.

use anyhow::Result;
use async_trait::async_trait;

use newswire_common::EnrichedEvent;

use super::{analysis_text, tokenize, Enricher};

const MAX_KEYWORDS: usize = 10;
const MIN_WORD_LEN: usize = 4;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "because", "been", "before", "being", "between", "both",
    "could", "does", "down", "during", "each", "from", "have", "here", "into", "just", "more",
    "most", "only", "other", "over", "said", "says", "should", "some", "such", "than", "that",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "under",
    "very", "were", "what", "when", "where", "which", "while", "will", "with", "would", "your",
];

#[derive(Debug, Default)]
pub struct KeywordEnricher;

impl KeywordEnricher {
    fn extract(text: &str) -> Vec<String> {
        let mut counts: Vec<(String, usize)> = Vec::new();

        for word in tokenize(text) {
            if word.chars().count() < MIN_WORD_LEN || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            match counts.iter_mut().find(|(w, _)| *w == word) {
                Some((_, n)) => *n += 1,
                None => counts.push((word, 1)),
            }
        }

        // Stable sort: frequency descending, first-seen order on ties.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().take(MAX_KEYWORDS).map(|(w, _)| w).collect()
    }
}

#[async_trait]
impl Enricher for KeywordEnricher {
    async fn enrich(&self, event: &mut EnrichedEvent) -> Result<()> {
        event.keywords = Some(Self::extract(&analysis_text(event)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_wins_then_first_seen() {
        let keywords =
            KeywordEnricher::extract("rust pipeline rust events pipeline rust stream events");
        assert_eq!(keywords[0], "rust");
        assert_eq!(keywords[1], "pipeline");
        assert_eq!(keywords[2], "events");
        assert_eq!(keywords[3], "stream");
    }

    #[test]
    fn short_and_stop_words_are_dropped() {
        let keywords = KeywordEnricher::extract("the cat sat with them over there while raining");
        assert_eq!(keywords, vec!["raining".to_string()]);
    }

    #[test]
    fn capped_at_ten() {
        let text = (0..15).map(|i| format!("word{i:02}")).collect::<Vec<_>>().join(" ");
        assert_eq!(KeywordEnricher::extract(&text).len(), 10);
    }
}
