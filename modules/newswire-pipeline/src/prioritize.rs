//! Event prioritization.
//!
//! Converts classifier output plus recency and content signals into a single
//! score. Deterministic given the classifier verdict and a fixed `now`; the
//! clocked entry point exists so tests pin wall-clock time.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use newswire_common::{EventCategory, NormalizedEvent};

use crate::classify::Classifier;

const BREAKING_BOOST: f64 = 2.0;
const RECENT_1H_BOOST: f64 = 1.5;
const RECENT_6H_BOOST: f64 = 1.2;
const LONG_DESCRIPTION_BOOST: f64 = 1.1;
const LONG_DESCRIPTION_CHARS: usize = 200;

fn default_weights() -> HashMap<EventCategory, f64> {
    HashMap::from([
        (EventCategory::BreakingNews, 2.0),
        (EventCategory::Politics, 1.5),
        (EventCategory::International, 1.4),
        (EventCategory::Economics, 1.3),
        (EventCategory::Technology, 1.2),
        (EventCategory::Science, 1.1),
        (EventCategory::Health, 1.1),
        (EventCategory::Environment, 1.0),
        (EventCategory::Sports, 0.8),
        (EventCategory::Entertainment, 0.7),
        (EventCategory::Other, 0.5),
    ])
}

pub struct Prioritizer {
    classifier: Arc<Classifier>,
    weights: HashMap<EventCategory, f64>,
}

impl Prioritizer {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        Self {
            classifier,
            weights: default_weights(),
        }
    }

    /// Priority score for an event, higher = more important. Never negative.
    pub fn score(&self, event: &NormalizedEvent) -> f64 {
        self.score_at(event, Utc::now())
    }

    /// Score against an explicit `now`.
    pub fn score_at(&self, event: &NormalizedEvent, now: DateTime<Utc>) -> f64 {
        let mut score = 1.0;

        let category = self.classifier.primary_category(event);
        score *= self.weights.get(&category).copied().unwrap_or(1.0);

        if self.classifier.is_breaking_news(event) {
            score *= BREAKING_BOOST;
        }

        // Future-dated events count as brand new.
        let age = now - event.timestamp;
        if age < Duration::hours(1) {
            score *= RECENT_1H_BOOST;
        } else if age < Duration::hours(6) {
            score *= RECENT_6H_BOOST;
        }

        if event.description.chars().count() > LONG_DESCRIPTION_CHARS {
            score *= LONG_DESCRIPTION_BOOST;
        }

        score
    }

    /// Rank events descending by score. The sort is stable: ties keep input
    /// order, and callers must not assume any other tie-break.
    pub fn rank<'a>(&self, events: &'a [NormalizedEvent]) -> Vec<(&'a NormalizedEvent, f64)> {
        let now = Utc::now();
        let mut scored: Vec<(&NormalizedEvent, f64)> = events
            .iter()
            .map(|e| (e, self.score_at(e, now)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored
    }

    /// Tune the multiplier for a category at runtime.
    pub fn set_category_weight(&mut self, category: EventCategory, weight: f64) {
        self.weights.insert(category, weight);
    }
}
