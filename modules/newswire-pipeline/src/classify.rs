//! Keyword-weighted event classification.
//!
//! Pure and synchronous: no I/O, no state mutation. Consumed by the
//! prioritizer and router; never mutates the event.

use std::collections::HashMap;

use newswire_common::{EventCategory, NormalizedEvent};

/// Score added per matched keyword, capped at 1.0 per category before
/// normalization.
const KEYWORD_WEIGHT: f64 = 0.2;

const CATEGORY_KEYWORDS: &[(EventCategory, &[&str])] = &[
    (
        EventCategory::Politics,
        &["election", "government", "policy", "president", "congress"],
    ),
    (
        EventCategory::Economics,
        &["market", "stock", "economy", "trade", "gdp", "inflation"],
    ),
    (
        EventCategory::Technology,
        &["ai", "software", "hardware", "tech", "digital", "cyber"],
    ),
    (
        EventCategory::Science,
        &["research", "discovery", "study", "scientific", "space"],
    ),
    (
        EventCategory::Entertainment,
        &["movie", "music", "celebrity", "film", "show"],
    ),
    (
        EventCategory::Sports,
        &["game", "team", "player", "championship", "league"],
    ),
    (
        EventCategory::Health,
        &["medical", "disease", "health", "hospital", "treatment"],
    ),
    (
        EventCategory::Environment,
        &["climate", "environment", "pollution", "green", "ecology"],
    ),
    (
        EventCategory::International,
        &["global", "international", "foreign", "world"],
    ),
];

const BREAKING_KEYWORDS: &[&str] = &["breaking", "urgent", "alert", "just in", "developing"];

#[derive(Debug, Default)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an event into categories with confidence scores. Non-zero
    /// scores are normalized to sum to 1.0; an empty map means no keyword
    /// matched any category.
    pub fn classify(&self, event: &NormalizedEvent) -> HashMap<EventCategory, f64> {
        let text = search_text(event);
        let mut scores: HashMap<EventCategory, f64> = HashMap::new();

        for (category, keywords) in CATEGORY_KEYWORDS {
            let matched = keywords.iter().filter(|k| text.contains(*k)).count();
            if matched > 0 {
                let score = (matched as f64 * KEYWORD_WEIGHT).min(1.0);
                scores.insert(*category, score);
            }
        }

        let total: f64 = scores.values().sum();
        if total > 0.0 {
            for score in scores.values_mut() {
                *score /= total;
            }
        }
        scores
    }

    /// Arg-max category. Ties break in keyword-table order so the result is
    /// deterministic; `Other` when nothing matched.
    pub fn primary_category(&self, event: &NormalizedEvent) -> EventCategory {
        let scores = self.classify(event);
        let mut best: Option<(EventCategory, f64)> = None;
        for (category, _) in CATEGORY_KEYWORDS {
            if let Some(&score) = scores.get(category) {
                if best.map_or(true, |(_, b)| score > b) {
                    best = Some((*category, score));
                }
            }
        }
        best.map(|(c, _)| c).unwrap_or(EventCategory::Other)
    }

    /// True iff the title or description matches the fixed urgency keyword
    /// set.
    pub fn is_breaking_news(&self, event: &NormalizedEvent) -> bool {
        let text = search_text(event);
        BREAKING_KEYWORDS.iter().any(|k| text.contains(k))
    }

    /// Existing tags plus the primary category name, deduplicated.
    pub fn extract_topics(&self, event: &NormalizedEvent) -> Vec<String> {
        let mut topics = event.tags.clone();
        let category = self.primary_category(event).to_string();
        if !topics.contains(&category) {
            topics.push(category);
        }
        topics
    }
}

fn search_text(event: &NormalizedEvent) -> String {
    format!("{} {}", event.title, event.description).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newswire_common::EventSource;
    use serde_json::json;
    use uuid::Uuid;

    fn event(title: &str, description: &str) -> NormalizedEvent {
        NormalizedEvent {
            id: Uuid::new_v4(),
            source: EventSource::NewsApi,
            title: title.into(),
            description: description.into(),
            category: None,
            tags: vec![],
            url: None,
            content: None,
            timestamp: Utc::now(),
            metadata: json!({}),
        }
    }

    #[test]
    fn election_and_government_classify_as_politics() {
        let e = event(
            "Election results contested",
            "The government faces questions over the vote count.",
        );
        assert_eq!(Classifier.primary_category(&e), EventCategory::Politics);
    }

    #[test]
    fn scores_sum_to_one_when_any_keyword_matched() {
        let e = event(
            "Stock market reacts to election",
            "Global trade policy shifts as the economy wobbles.",
        );
        let scores = Classifier.classify(&e);
        assert!(!scores.is_empty());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "scores sum to {total}");
    }

    #[test]
    fn no_keywords_yields_empty_map_and_other() {
        let e = event("Cat Video Viral", "Funny cat jumps.");
        assert!(Classifier.classify(&e).is_empty());
        assert_eq!(Classifier.primary_category(&e), EventCategory::Other);
    }

    #[test]
    fn breaking_news_keywords() {
        let breaking = event("BREAKING: dam failure", "Developing situation downstream.");
        let calm = event("Weekly gardening tips", "Prune your roses in spring.");
        assert!(Classifier.is_breaking_news(&breaking));
        assert!(!Classifier.is_breaking_news(&calm));
    }

    #[test]
    fn topics_include_tags_and_primary_category() {
        let mut e = event("Election night", "Government coverage.");
        e.tags = vec!["live".into(), "politics".into()];
        let topics = Classifier.extract_topics(&e);
        assert_eq!(topics, vec!["live".to_string(), "politics".to_string()]);
    }
}
